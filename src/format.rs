//! Layout clean-up for generated descriptions.
//!
//! Models often return markdown with headings, links and list items run
//! together on one line. The rules below put each on its own line and then
//! tidy blank lines and stray `#` markers.
//!
//! ORDER MATTERS: the spacing rules run before the clean-up rules, and the
//! whole sequence is a fixed point: formatting already formatted text
//! returns it unchanged.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub struct RewriteRule {
    pub name: &'static str,
    pattern: Regex,
    rewrite: fn(&Captures) -> String,
}

impl RewriteRule {
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| (self.rewrite)(caps))
            .into_owned()
    }
}

pub static RULES: Lazy<Vec<RewriteRule>> = Lazy::new(|| {
    vec![
        // `text ## Heading` -> newline before a 1-3 `#` heading marker
        RewriteRule {
            name: "heading_spacing",
            pattern: Regex::new(r"(?P<pre>[^\s#])[ \t]*(?P<marker>#{1,3}) ")
                .expect("valid heading regex"),
            rewrite: |caps| format!("{}\n{} ", &caps["pre"], &caps["marker"]),
        },
        // `text [label](url)` -> newline before the link; a link that already
        // opens its line (after an optional list or heading marker) stays put
        RewriteRule {
            name: "link_spacing",
            pattern: Regex::new(
                r"(?m)(?P<lead>^[ \t]*(?:(?:[-*+]|#{1,6}|\d+\.)[ \t]+)?\[[^\]\n]*?\]\()|(?P<pre>[^\n!])[ \t]*(?P<link>\[[^\]\n]*?\]\()",
            )
            .expect("valid link regex"),
            rewrite: |caps| match caps.name("lead") {
                Some(lead) => lead.as_str().to_owned(),
                None => format!("{}\n{}", &caps["pre"], &caps["link"]),
            },
        },
        // `text - item` -> newline before the dash, exactly one space after it
        RewriteRule {
            name: "list_spacing",
            pattern: Regex::new(r"(?m)^(?P<indent>[ \t]*)-[ \t]+|(?P<pre>[^\s-])[ \t]*-[ \t]+")
                .expect("valid list regex"),
            rewrite: |caps| match caps.name("indent") {
                Some(indent) => format!("{}- ", indent.as_str()),
                None => format!("{}\n- ", &caps["pre"]),
            },
        },
        RewriteRule {
            name: "collapse_blank_lines",
            pattern: Regex::new(r"\n{3,}").expect("valid blank line regex"),
            rewrite: |_| "\n\n".to_owned(),
        },
        // `Summary #\n` -> `Summary\n`; `C#` keeps its hash
        RewriteRule {
            name: "trailing_hash",
            pattern: Regex::new(r"(?P<pre>[^#\s])[ \t]+#\n").expect("valid trailing hash regex"),
            rewrite: |caps| format!("{}\n", &caps["pre"]),
        },
        // Lines holding only `#`, indented or not; keeps at most one blank
        // line where they were
        RewriteRule {
            name: "lone_hash_line",
            pattern: Regex::new(r"\n*(?:(?m:^)[ \t]*#[ \t]*(?m:$)\n*)+").expect("valid lone hash regex"),
            rewrite: |caps| {
                let newlines = caps[0]
                    .split(|c: char| c != '\n')
                    .map(str::len)
                    .max()
                    .unwrap_or(0)
                    .min(2);
                "\n".repeat(newlines)
            },
        },
    ]
});

/// Run every rule in order over the whole text, then trim it.
pub fn format_description(raw: &str) -> String {
    let formatted = RULES.iter().fold(raw.to_owned(), |text, rule| {
        let next = rule.apply(&text);
        if next != text {
            log::trace!("Rule {} rewrote the description", rule.name);
        }
        next
    });
    formatted.trim().to_owned()
}
