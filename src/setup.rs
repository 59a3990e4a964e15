use anyhow::{Result, bail};
use colored::Colorize;

use crate::config::{self, ConfigPaths, FileConfig, TICKET_URL_BASE_KEY};
use crate::prompt_input;

/// Pick the new value from an answer: blank keeps the current value.
fn answer_or_current(answer: String, current: Option<&str>) -> Option<String> {
    if answer.is_empty() {
        current.map(str::to_owned)
    } else {
        Some(answer)
    }
}

fn question(label: &str, current: Option<&str>) -> String {
    match current {
        Some(value) => format!("{label} [{value}]: "),
        None => format!("{label}: "),
    }
}

/// Interactive provisioning of the config and credentials files.
pub fn run_setup(paths: &ConfigPaths) -> Result<()> {
    let mut file_cfg = FileConfig::load_or_default(&paths.config_file)?;
    let current_key = config::load_credential(&paths.credentials_file)?;

    println!("Configuring mrbot in {}", paths.dir.display());

    let answer = prompt_input(&question(
        "Ticket URL base (e.g. https://company.atlassian.net/browse/)",
        file_cfg.get(TICKET_URL_BASE_KEY),
    ))?;
    let Some(url_base) = answer_or_current(answer, file_cfg.get(TICKET_URL_BASE_KEY)) else {
        bail!("{TICKET_URL_BASE_KEY} is required");
    };
    config::validate_ticket_url_base(&url_base)?;

    let masked = current_key.as_deref().map(|_| "keep existing");
    let answer = prompt_input(&question("Anthropic API key", masked))?;
    let Some(api_key) = answer_or_current(answer, current_key.as_deref()) else {
        bail!("an API key is required");
    };

    file_cfg.set(TICKET_URL_BASE_KEY, url_base);
    file_cfg.save(&paths.config_file)?;
    config::save_credential(&paths.credentials_file, &api_key)?;

    println!(
        "{} Saved {} and {}",
        ">".bright_green(),
        paths.config_file.display().to_string().bright_cyan(),
        paths.credentials_file.display().to_string().bright_cyan()
    );
    Ok(())
}
