use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static DEFAULT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[a-z]{2,10}-[0-9]+\b").expect("valid ticket regex"));

/// A ticket identifier taken from the branch name, e.g. `mrp-174`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRef(String);

impl TicketRef {
    pub fn new(raw: impl Into<String>) -> Self {
        TicketRef(raw.into())
    }

    /// As found in the branch name; used for the URL path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cased form used wherever the ticket is displayed.
    pub fn display_name(&self) -> String {
        self.0.to_uppercase()
    }

    /// `[MRP-174](https://x/mrp-174)`
    pub fn markdown_link(&self, url_base: &str) -> String {
        format!("[{}]({}{})", self.display_name(), url_base, self.as_str())
    }
}

/// Find the first ticket in `branch`, using `custom` instead of the default
/// project-prefix pattern when configured.
pub fn from_branch(branch: &str, custom: Option<&str>) -> Result<Option<TicketRef>> {
    let found = match custom {
        Some(pattern) => {
            let re = Regex::new(pattern)
                .with_context(|| format!("invalid TICKET_PATTERN {pattern:?}"))?;
            re.find(branch).map(|m| m.as_str().to_string())
        }
        None => DEFAULT_PATTERN.find(branch).map(|m| m.as_str().to_string()),
    };
    Ok(found.map(TicketRef::new))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_uppercases_label_and_keeps_path() {
        let ticket = TicketRef::new("mrp-174");
        assert_eq!(ticket.markdown_link("https://x/"), "[MRP-174](https://x/mrp-174)");
    }

    #[test]
    fn extracts_ticket_from_branch_names() {
        let cases = [
            ("feature/mrp-174-login-page", Some("mrp-174")),
            ("MRP-5", Some("MRP-5")),
            ("bugfix/ABC-12", Some("ABC-12")),
            ("main", None),
            ("release/2024-10", None),
        ];

        for (branch, expected) in cases {
            let found = from_branch(branch, None).unwrap();
            assert_eq!(found.as_ref().map(TicketRef::as_str), expected, "branch {branch}");
        }
    }

    #[test]
    fn custom_pattern_overrides_default() {
        let found = from_branch("feature/proj_42", Some(r"proj_\d+")).unwrap();
        assert_eq!(found, Some(TicketRef::new("proj_42")));
    }

    #[test]
    fn invalid_custom_pattern_is_an_error() {
        assert!(from_branch("main", Some("(unclosed")).is_err());
    }
}
