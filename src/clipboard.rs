use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow, bail};

/// Pasteboard commands tried in order; the first one that runs wins.
const CANDIDATES: [(&str, &[&str]); 5] = [
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip", &[]),
];

fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;

    child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("{program} has no stdin"))?
        .write_all(text.as_bytes())
        .with_context(|| format!("failed to write to {program}"))?;

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for {program}"))?;
    if !status.success() {
        bail!("{program} exited with status {:?}", status.code());
    }
    Ok(())
}

/// Put `text` on the system clipboard; returns the command that did it.
pub fn copy(text: &str) -> Result<&'static str> {
    let mut failures = Vec::new();
    for (program, args) in CANDIDATES {
        match pipe_to(program, args, text) {
            Ok(()) => return Ok(program),
            Err(err) => {
                log::debug!("Clipboard via {program} failed: {err:#}");
                failures.push(program);
            }
        }
    }
    Err(anyhow!("no clipboard command worked (tried {})", failures.join(", ")))
}
