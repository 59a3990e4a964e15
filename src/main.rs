mod cli_args;
mod clipboard;
mod config;
mod format;
mod git;
mod llm;
mod logging;
mod setup;
mod templates;
mod ticket;

use std::io::{self, Write};
use std::process;

use anyhow::{Result, bail};
use clap::{CommandFactory, Parser};
use colored::Colorize;

use cli_args::{Cli, Command};
use config::{ConfigPaths, Settings};
use git::CommitEntry;
use llm::LlmClient;
use llm::prompt_builder;
use llm::response::{self, Generation};
use templates::{Template, TemplateStore};
use ticket::TicketRef;

/// What the user wants to do with a generated description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextStep {
    AcceptAndCopy,  // 1
    Regenerate,     // 2
    ChangeTemplate, // 3
    Accept,         // anything else
}

impl NextStep {
    fn from_choice(choice: &str) -> Self {
        match choice.trim() {
            "1" => NextStep::AcceptAndCopy,
            "2" => NextStep::Regenerate,
            "3" => NextStep::ChangeTemplate,
            _ => NextStep::Accept,
        }
    }
}

/// Inputs fixed for the whole `generate` run.
struct Session {
    ticket: Option<TicketRef>,
    ticket_url_base: Option<String>,
    commits: Vec<CommitEntry>,
}

/// A chosen template and the directive built from it. Regenerating reuses
/// the draft as is; only a template change builds a new one.
struct Draft {
    template: Template,
    directive: String,
}

impl Session {
    fn draft(&self, template: Template) -> Draft {
        let body = prompt_builder::substitute_ticket(
            &template.body,
            self.ticket.as_ref(),
            self.ticket_url_base.as_deref(),
        );
        let directive = prompt_builder::build_directive(&body, &self.commits);
        Draft { template, directive }
    }
}

/// Ask the user a question and return a trimmed input line.
fn prompt_input(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_string())
}

/// Truncate long strings for debug logging.
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((idx, _)) => format!(
            "{}...\n[truncated {} chars]",
            &s[..idx],
            s[idx..].chars().count()
        ),
    }
}

/// Turn a raw response body into the description shown to the user.
///
/// A body that is not a message at all aborts the run. A message that
/// cannot be read is reported and replaced by a placeholder so the user
/// can still regenerate or pick another template.
fn render_response(raw: &str) -> Result<String> {
    match response::parse(raw) {
        Generation::Text(text) => Ok(format::format_description(&text)),
        Generation::Malformed(reason) => {
            log::error!("Could not read the generated description: {reason}");
            Ok(format!("[mrbot: could not read the generated description: {reason}]"))
        }
        Generation::Rejected => {
            log::error!("Unrecognized response from the model API:\n{raw}");
            bail!("the model API did not return a message")
        }
    }
}

fn describe(client: &dyn LlmClient, directive: &str) -> Result<String> {
    let raw = client.create_message(directive)?;
    log::trace!("Raw response:\n{}", truncate(&raw, 4000));
    render_response(&raw)
}

fn print_preview(description: &str) {
    println!();
    println!("----- MR Description Preview -----");
    println!("{description}");
    println!("----------------------------------");
}

fn prompt_next_step() -> Result<NextStep> {
    println!();
    println!("What next?");
    println!("  1) Accept and copy to clipboard");
    println!("  2) Regenerate with the same template");
    println!("  3) Try a different template");
    let choice = prompt_input("Enter choice [1-3] (anything else accepts without copying): ")?;
    Ok(NextStep::from_choice(&choice))
}

fn copy_to_clipboard(description: &str) {
    match clipboard::copy(description) {
        Ok(program) => println!("{} Copied to clipboard via {}", ">".bright_green(), program),
        Err(err) => log::warn!("Could not copy to the clipboard: {err:#}"),
    }
}

/// Generate mode: commits since `start_ref` + a template -> MR description.
fn run_generate(cli: &Cli, start_ref: &str, template_name: Option<&str>) -> Result<()> {
    git::ensure_available()?;

    let settings = Settings::from_sources(cli, ConfigPaths::resolve(cli)?)?;
    let client = llm::build_client(&settings, cli.no_model)?;
    let store = TemplateStore::new(&settings.paths.templates_dir);

    let commits = git::collect_commits(start_ref)?;
    if commits.is_empty() {
        println!("No commits found between {start_ref} and HEAD.");
        return Ok(());
    }

    let branch = git::current_branch()?;
    let ticket = ticket::from_branch(&branch, settings.ticket_pattern.as_deref())?;
    match &ticket {
        Some(t) => println!("{} Ticket: {}", ">".bright_green(), t.display_name().bright_cyan()),
        None => log::info!("No ticket reference found in branch {branch:?}"),
    }
    println!(
        "{} Commits: {} since {}",
        ">".bright_green(),
        commits.len(),
        start_ref.bright_cyan()
    );

    let session = Session {
        ticket,
        ticket_url_base: settings.ticket_url_base.clone(),
        commits,
    };

    let mut preselected = template_name.map(|name| store.find(name)).transpose()?;

    loop {
        let template = match preselected.take() {
            Some(template) => template,
            None => templates::select(&store)?,
        };
        let draft = session.draft(template);
        log::debug!(
            "Directive for template {}:\n{}",
            draft.template.name,
            truncate(&draft.directive, 4000)
        );

        loop {
            let description = describe(client.as_ref(), &draft.directive)?;
            print_preview(&description);

            match prompt_next_step()? {
                NextStep::AcceptAndCopy => {
                    copy_to_clipboard(&description);
                    return Ok(());
                }
                NextStep::Regenerate => continue,
                NextStep::ChangeTemplate => break,
                NextStep::Accept => return Ok(()),
            }
        }
    }
}

fn run_init_templates(cli: &Cli) -> Result<()> {
    let paths = ConfigPaths::resolve(cli)?;
    let store = TemplateStore::new(&paths.templates_dir);
    let written = store.init_defaults()?;
    println!(
        "{} Wrote {} default template(s) to {}",
        ">".bright_green(),
        written,
        store.dir().display().to_string().bright_cyan()
    );
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Command::Setup) => setup::run_setup(&ConfigPaths::resolve(cli)?),
        Some(Command::InitTemplates) => run_init_templates(cli),
        Some(Command::Generate { start_ref, template }) => {
            run_generate(cli, start_ref, template.as_deref())
        }
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    if let Err(err) = run(&cli) {
        log::error!("{err:#}");
        process::exit(1);
    }
}
