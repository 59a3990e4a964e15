//! Markdown templates for merge request descriptions.
//!
//! Templates are plain `.md` files in the templates directory; the file stem
//! is the name shown in the menu. A template receives the ticket link where
//! it contains [`LINK_PLACEHOLDER`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use colored::Colorize;

use crate::prompt_input;

/// Replaced with `[TICKET](url)` when the ticket URL base is configured.
pub const LINK_PLACEHOLDER: &str = "[<ticket_number>](<link_to_ticket>)";

/// Fallback spot for the bare ticket when no URL base is configured.
pub const TICKET_PLACEHOLDER: &str = "<ticket_number>";

const STORY: &str = r#"## Ticket

[<ticket_number>](<link_to_ticket>)

## Summary

<!-- What does this merge request deliver, from the user's point of view? -->

## Changes

<!-- Bullet list of the notable changes. -->

## How to test

<!-- Steps a reviewer can follow to verify the behaviour. -->

## Notes

<!-- Follow-ups, risks, or anything reviewers should know. -->
"#;

const BUGFIX: &str = r#"## Ticket

[<ticket_number>](<link_to_ticket>)

## Problem

<!-- What was broken and how did it show up? -->

## Root cause

<!-- Why did it happen? -->

## Fix

<!-- What changed to resolve it? -->

## How to verify

<!-- Steps to confirm the bug is gone and nothing regressed. -->
"#;

const REFACTOR: &str = r#"## Ticket

[<ticket_number>](<link_to_ticket>)

## Motivation

<!-- Why restructure this code now? -->

## Changes

<!-- What moved, was renamed, or was simplified? -->

## Behaviour

<!-- Confirm behaviour is unchanged, or call out intended differences. -->

## Risks

<!-- Areas that deserve a closer look during review. -->
"#;

/// The templates written on first use, keyed by file stem.
pub const DEFAULT_TEMPLATES: [(&str, &str); 3] =
    [("story", STORY), ("bugfix", BUGFIX), ("refactor", REFACTOR)];

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub body: String,
}

/// The directory of template files.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TemplateStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every default template that does not exist yet; returns how many were written.
    pub fn init_defaults(&self) -> Result<usize> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create template directory {}", self.dir.display()))?;

        let mut written = 0;
        for (name, body) in DEFAULT_TEMPLATES {
            let path = self.dir.join(format!("{name}.md"));
            if path.exists() {
                log::debug!("Keeping existing template {}", path.display());
                continue;
            }
            fs::write(&path, body)
                .with_context(|| format!("failed to write template {}", path.display()))?;
            written += 1;
        }
        Ok(written)
    }

    /// All templates sorted by file name. Materializes the defaults when the
    /// directory is missing or holds no templates.
    pub fn load_all(&self) -> Result<Vec<Template>> {
        let mut templates = self.read_dir()?;
        if templates.is_empty() {
            let written = self.init_defaults()?;
            log::info!(
                "No templates found; wrote {written} default template(s) to {}",
                self.dir.display()
            );
            templates = self.read_dir()?;
        }
        Ok(templates)
    }

    pub fn find(&self, name: &str) -> Result<Template> {
        let templates = self.load_all()?;
        let names = templates
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        templates
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| anyhow!("no template named {name:?} (available: {names})"))
    }

    fn read_dir(&self) -> Result<Vec<Template>> {
        if !self.dir.is_dir() {
            return Ok(vec![]);
        }

        let mut paths = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to list templates in {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
            .collect::<Vec<_>>();
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let body = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read template {}", path.display()))?;
                Ok(Template { name, body })
            })
            .collect()
    }
}

/// Resolve a 1-based menu answer against `count` entries, returning the 0-based index.
pub fn parse_selection(answer: &str, count: usize) -> Result<usize> {
    let answer = answer.trim();
    if answer.is_empty() || !answer.chars().all(|c| c.is_ascii_digit()) {
        bail!("invalid template selection {answer:?}: expected a number between 1 and {count}");
    }
    let choice: usize = answer
        .parse()
        .with_context(|| format!("invalid template selection {answer:?}"))?;
    if choice == 0 || choice > count {
        bail!("template selection {choice} is out of range (1-{count})");
    }
    Ok(choice - 1)
}

pub fn render_menu(templates: &[Template]) -> String {
    let mut out = String::from("Available templates:\n");
    for (idx, template) in templates.iter().enumerate() {
        out.push_str(&format!("  {}) {}\n", idx + 1, template.name));
    }
    out
}

/// Show the numbered menu and read one answer. An invalid answer is an
/// error; the caller decides whether to abort.
pub fn select(store: &TemplateStore) -> Result<Template> {
    let mut templates = store.load_all()?;
    if templates.is_empty() {
        bail!("no templates available in {}", store.dir().display());
    }

    println!();
    print!("{}", render_menu(&templates));
    let answer = prompt_input(&format!("Select a template [1-{}]: ", templates.len()))?;
    let idx = parse_selection(&answer, templates.len())?;

    let template = templates.swap_remove(idx);
    println!("{} Template: {}", ">".bright_green(), template.name.bright_cyan());
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn empty_directory_gets_three_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path());

        let templates = store.load_all().unwrap();

        let names: Vec<_> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["bugfix", "refactor", "story"]);
        assert!(templates.iter().all(|t| t.body.contains(LINK_PLACEHOLDER)));
    }

    #[test]
    fn missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path().join("templates"));

        assert_eq!(store.load_all().unwrap().len(), 3);
        assert!(dir.path().join("templates").join("story.md").is_file());
    }

    #[test]
    fn existing_templates_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("story.md"), "custom story").unwrap();
        let store = TemplateStore::new(dir.path());

        assert_eq!(store.init_defaults().unwrap(), 2);
        assert_eq!(fs::read_to_string(dir.path().join("story.md")).unwrap(), "custom story");
        assert_eq!(store.init_defaults().unwrap(), 0);
    }

    #[test]
    fn user_templates_suppress_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hotfix.md"), "# hotfix").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a template").unwrap();
        let store = TemplateStore::new(dir.path());

        let templates = store.load_all().unwrap();

        assert_eq!(
            templates,
            vec![Template { name: "hotfix".into(), body: "# hotfix".into() }]
        );
        assert_eq!(file_names(dir.path()), ["hotfix.md", "notes.txt"]);
    }

    #[test]
    fn find_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path());

        assert_eq!(store.find("bugfix").unwrap().name, "bugfix");
        assert!(store.find("epic").is_err());
    }

    #[test]
    fn selection_accepts_numbers_in_range() {
        assert_eq!(parse_selection("1", 3).unwrap(), 0);
        assert_eq!(parse_selection(" 3\n", 3).unwrap(), 2);
    }

    #[test]
    fn selection_rejects_zero_non_digits_and_overflow() {
        for answer in ["0", "", "two", "-1", "1.5", "4", "99999999999999999999999"] {
            assert!(parse_selection(answer, 3).is_err(), "accepted {answer:?}");
        }
    }

    #[test]
    fn rejected_selection_leaves_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path());
        let templates = store.load_all().unwrap();
        let before = file_names(dir.path());

        assert!(parse_selection("7", templates.len()).is_err());
        assert_eq!(file_names(dir.path()), before);
    }

    #[test]
    fn menu_is_one_based() {
        let templates = vec![
            Template { name: "bugfix".into(), body: String::new() },
            Template { name: "story".into(), body: String::new() },
        ];
        assert_eq!(
            render_menu(&templates),
            "Available templates:\n  1) bugfix\n  2) story\n"
        );
    }
}
