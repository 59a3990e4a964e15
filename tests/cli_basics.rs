use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::cargo; // handy crate for testing CLIs
use mockito::Matcher;
use predicates::prelude::*;
use serde_json::json;

fn mrbot(config_dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!();
    cmd.env_remove("ANTHROPIC_API_KEY")
        .env_remove("MRBOT_MODEL")
        .env("NO_COLOR", "1")
        .arg("--config-dir")
        .arg(config_dir);
    cmd
}

/// Talks to a local mock of the Messages API at `api_url`.
fn mrbot_online(config_dir: &Path, api_url: &str) -> assert_cmd::Command {
    write_config(
        config_dir,
        &format!("JIRA_TICKET_URL_BASE=https://j/browse/\nAPI_URL={api_url}\n"),
    );

    let mut cmd = mrbot(config_dir);
    cmd.env("ANTHROPIC_API_KEY", "sk-test")
        .env("NO_PROXY", "127.0.0.1,localhost")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy");
    cmd
}

fn git(repo: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args([
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(repo)
        .status()
        .expect("git should run");
    assert!(status.success(), "git {args:?} failed");
}

/// A repo on `feature/mrp-5-login` with two commits after `base`.
fn scratch_repo() -> tempfile::TempDir {
    let repo = tempfile::tempdir().unwrap();
    git(repo.path(), &["init", "-q"]);
    git(repo.path(), &["commit", "-q", "--allow-empty", "-m", "base"]);
    git(repo.path(), &["tag", "base"]);
    git(repo.path(), &["checkout", "-q", "-b", "feature/mrp-5-login"]);
    git(repo.path(), &["commit", "-q", "--allow-empty", "-m", "Fix login bug"]);
    git(
        repo.path(),
        &["commit", "-q", "--allow-empty", "-m", "Add null check", "-m", "Guard the session lookup."],
    );
    repo
}

fn write_config(config_dir: &Path, contents: &str) {
    fs::create_dir_all(config_dir).unwrap();
    fs::write(config_dir.join("config"), contents).unwrap();
}

#[test]
fn prints_help() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn prints_version() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn no_arguments_prints_usage() {
    let config = tempfile::tempdir().unwrap();

    mrbot(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage").and(predicate::str::contains("generate")));
}

#[test]
fn init_templates_writes_defaults_once() {
    let config = tempfile::tempdir().unwrap();

    mrbot(config.path())
        .arg("init-templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 default template(s)"));

    for name in ["story", "bugfix", "refactor"] {
        let body = fs::read_to_string(config.path().join("templates").join(format!("{name}.md"))).unwrap();
        assert!(body.contains("[<ticket_number>](<link_to_ticket>)"), "{name} lacks the placeholder");
    }

    mrbot(config.path())
        .arg("init-templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 0 default template(s)"));
}

#[test]
fn setup_writes_config_and_credentials() {
    let config = tempfile::tempdir().unwrap();

    mrbot(config.path())
        .arg("setup")
        .write_stdin("https://j/browse/\nsk-test-key\n")
        .assert()
        .success();

    let cfg = fs::read_to_string(config.path().join("config")).unwrap();
    assert!(cfg.contains("JIRA_TICKET_URL_BASE=https://j/browse/"));
    let key = fs::read_to_string(config.path().join("credentials")).unwrap();
    assert_eq!(key.trim(), "sk-test-key");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for file in ["config", "credentials"] {
            let mode = fs::metadata(config.path().join(file)).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{file} is not private");
        }
    }
}

#[test]
fn setup_rejects_malformed_url() {
    let config = tempfile::tempdir().unwrap();

    mrbot(config.path())
        .arg("setup")
        .write_stdin("ftp://j/browse\nsk-test-key\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("must start with http:// or https://"));

    assert!(!config.path().join("config").exists());
}

#[test]
fn generate_requires_setup() {
    let config = tempfile::tempdir().unwrap();
    let repo = scratch_repo();

    mrbot(config.path())
        .current_dir(repo.path())
        .args(["--no-model", "generate", "base"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("run `mrbot setup` first"));
}

#[test]
fn generate_rejects_unknown_start_ref() {
    let config = tempfile::tempdir().unwrap();
    write_config(config.path(), "JIRA_TICKET_URL_BASE=https://j/browse/\n");
    let repo = scratch_repo();

    mrbot(config.path())
        .current_dir(repo.path())
        .args(["--no-model", "generate", "no-such-ref"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot resolve \"no-such-ref\""));
}

#[test]
fn generate_without_api_key_fails() {
    let config = tempfile::tempdir().unwrap();
    write_config(config.path(), "JIRA_TICKET_URL_BASE=https://j/browse/\n");
    let repo = scratch_repo();

    mrbot(config.path())
        .current_dir(repo.path())
        .args(["generate", "base"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no API key found"));
}

#[test]
fn generate_with_empty_range_exits_cleanly() {
    let config = tempfile::tempdir().unwrap();
    write_config(config.path(), "JIRA_TICKET_URL_BASE=https://j/browse/\n");
    let repo = scratch_repo();

    mrbot(config.path())
        .current_dir(repo.path())
        .args(["--no-model", "generate", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No commits found between HEAD and HEAD."));
}

#[test]
fn generate_runs_pipeline_offline() {
    let config = tempfile::tempdir().unwrap();
    write_config(config.path(), "JIRA_TICKET_URL_BASE=https://j/browse/\n");
    let repo = scratch_repo();

    mrbot(config.path())
        .current_dir(repo.path())
        .args(["--no-model", "-vv", "generate", "base"])
        .write_stdin("1\nq\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("1) bugfix")
                .and(predicate::str::contains("Ticket: MRP-5"))
                .and(predicate::str::contains("MR Description Preview"))
                .and(predicate::str::contains("\n- No request was sent.")),
        )
        .stderr(
            predicate::str::contains("[MRP-5](https://j/browse/mrp-5)")
                .and(predicate::str::contains("* Fix login bug"))
                .and(predicate::str::contains("* Add null check Guard the session lookup.")),
        );
}

#[test]
fn generate_with_named_template_regenerates_then_accepts() {
    let config = tempfile::tempdir().unwrap();
    write_config(config.path(), "JIRA_TICKET_URL_BASE=https://j/browse/\n");
    let repo = scratch_repo();

    mrbot(config.path())
        .current_dir(repo.path())
        .args(["--no-model", "generate", "base", "--template", "refactor"])
        .write_stdin("2\n\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("MR Description Preview")
                .count(2)
                .and(predicate::str::contains("Available templates").not()),
        );
}

#[test]
fn invalid_template_choice_fails() {
    let config = tempfile::tempdir().unwrap();
    write_config(config.path(), "JIRA_TICKET_URL_BASE=https://j/browse/\n");
    let repo = scratch_repo();

    mrbot(config.path())
        .current_dir(repo.path())
        .args(["--no-model", "generate", "base"])
        .write_stdin("0\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn changing_template_shows_the_menu_again() {
    let config = tempfile::tempdir().unwrap();
    write_config(config.path(), "JIRA_TICKET_URL_BASE=https://j/browse/\n");
    let repo = scratch_repo();

    mrbot(config.path())
        .current_dir(repo.path())
        .args(["--no-model", "generate", "base"])
        .write_stdin("1\n3\n2\n\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Available templates")
                .count(2)
                .and(predicate::str::contains("Template: bugfix"))
                .and(predicate::str::contains("Template: refactor"))
                .and(predicate::str::contains("MR Description Preview").count(2)),
        );
}

#[test]
fn malformed_response_still_offers_choices() {
    let mut server = mockito::Server::new();
    let api = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "sk-test")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({ "max_tokens": 1024 })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "type": "message", "role": "assistant" }).to_string())
        .expect(2)
        .create();

    let config = tempfile::tempdir().unwrap();
    let repo = scratch_repo();

    mrbot_online(config.path(), &server.url())
        .current_dir(repo.path())
        .args(["generate", "base"])
        .write_stdin("1\n2\n\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[mrbot: could not read the generated description")
                .count(2)
                .and(predicate::str::contains("What next?").count(2)),
        )
        .stderr(predicate::str::contains("no `content` field"));

    api.assert();
}

#[test]
fn model_text_is_formatted_for_preview() {
    let mut server = mockito::Server::new();
    let api = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "type": "message",
                "content": [{ "type": "text", "text": "## Summary Fixes login. ## Changes - Retry - Guard" }],
            })
            .to_string(),
        )
        .create();

    let config = tempfile::tempdir().unwrap();
    let repo = scratch_repo();

    mrbot_online(config.path(), &server.url())
        .current_dir(repo.path())
        .args(["generate", "base", "--template", "story"])
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "## Summary Fixes login.\n## Changes\n- Retry\n- Guard",
        ));

    api.assert();
}
