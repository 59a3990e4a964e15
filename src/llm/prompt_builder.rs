use crate::git::{self, CommitEntry};
use crate::llm::prompts;
use crate::templates::{LINK_PLACEHOLDER, TICKET_PLACEHOLDER};
use crate::ticket::TicketRef;

/// Put the ticket into the template: a full link when `url_base` is known,
/// otherwise the bare upper-cased ticket in the narrower placeholder.
/// Templates without the placeholder pass through unchanged.
pub fn substitute_ticket(template: &str, ticket: Option<&TicketRef>, url_base: Option<&str>) -> String {
    let Some(ticket) = ticket else {
        return template.to_owned();
    };

    match url_base {
        Some(base) => template.replace(LINK_PLACEHOLDER, &ticket.markdown_link(base)),
        None => {
            log::warn!(
                "No ticket URL base configured; inserting {} without a link. Run `mrbot setup` to add one.",
                ticket.display_name()
            );
            template.replace(TICKET_PLACEHOLDER, &ticket.display_name())
        }
    }
}

/// Replace every control character (newlines and tabs included) with a space
/// so the directive embeds cleanly in a JSON request body.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Compose the single directive sent to the model. `template` is expected
/// to have had the ticket substituted already.
pub fn build_directive(template: &str, commits: &[CommitEntry]) -> String {
    let mut directive = String::from(prompts::PREAMBLE);
    directive.push_str(&git::render_log(commits));
    directive.push_str("\n\n");
    directive.push_str(prompts::OUTPUT_RULES);
    directive.push_str(template);

    strip_control_chars(&directive)
}
