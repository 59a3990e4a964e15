use anyhow::{Context, Result, anyhow, bail};
use std::process::Command as GitCommand;

/// ASCII record separator; `git log` emits it after every commit as `%x1e`.
const ENTRY_END: char = '\u{1e}';

/// A commit between the start ref and HEAD.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitEntry {
    pub subject: String,
    pub body: String,
}

impl CommitEntry {
    /// `* subject` followed by the body lines verbatim.
    pub fn render(&self) -> String {
        if self.body.trim().is_empty() {
            format!("* {}", self.subject)
        } else {
            format!("* {}\n{}", self.subject, self.body)
        }
    }
}

/// Render the whole log, one entry after another, oldest first.
pub fn render_log(commits: &[CommitEntry]) -> String {
    commits
        .iter()
        .map(CommitEntry::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run a git command and capture stdout as String.
pub fn git_output(args: &[&str]) -> Result<String> {
    let output = GitCommand::new("git")
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {:?}", args))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "git {:?} exited with status {:?}: {}",
            args,
            output.status.code(),
            stderr.trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Fail early when the git executable is not on PATH.
pub fn ensure_available() -> Result<()> {
    GitCommand::new("git")
        .arg("--version")
        .output()
        .map_err(|err| anyhow!("git is required but could not be run: {err}"))
        .and_then(|output| {
            if output.status.success() {
                Ok(())
            } else {
                Err(anyhow!("git is required but `git --version` failed"))
            }
        })
}

/// Get the current branch name.
pub fn current_branch() -> Result<String> {
    let name = git_output(&["rev-parse", "--abbrev-ref", "HEAD"])?
        .trim()
        .to_string();
    Ok(name)
}

/// Check that we are inside a work tree and that `start` names a commit.
pub fn verify_start_ref(start: &str) -> Result<()> {
    let inside = git_output(&["rev-parse", "--is-inside-work-tree"])
        .map(|out| out.trim() == "true")
        .unwrap_or(false);
    if !inside {
        bail!("not a git repository (or any parent up to the filesystem root)");
    }

    let spec = format!("{start}^{{commit}}");
    git_output(&["rev-parse", "--verify", "--quiet", &spec])
        .map_err(|_| anyhow!("cannot resolve {start:?} to a commit in this repository"))?;
    Ok(())
}

/// Collect commits in `start..HEAD`, oldest first.
pub fn collect_commits(start: &str) -> Result<Vec<CommitEntry>> {
    verify_start_ref(start)?;

    let range = format!("{start}..HEAD");
    let format = "--pretty=format:%s%n%b%x1e";
    let log_output = git_output(&["log", "--reverse", format, &range])?;

    let commits = parse_log(&log_output);
    log::debug!("Found {} commit(s) in {range}", commits.len());
    Ok(commits)
}

fn parse_log(log_output: &str) -> Vec<CommitEntry> {
    if log_output.trim().is_empty() {
        return vec![];
    }

    let mut commits = Vec::new();

    for block in log_output.split(ENTRY_END) {
        let block = block.trim_matches('\n');
        if block.trim().is_empty() {
            continue;
        }

        let mut lines = block.lines();
        let subject = lines.next().unwrap_or("").trim().to_string();
        let body = lines.collect::<Vec<_>>().join("\n").trim_end().to_string();

        commits.push(CommitEntry { subject, body });
    }

    commits
}
