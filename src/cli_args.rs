use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "mrbot",
    version,
    about = "LLM-assisted merge request description generator"
)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding config, credentials and templates (defaults to ~/.config/mrbot)
    #[arg(long, env = "MRBOT_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Model name to use (e.g. claude-3-5-sonnet-latest)
    #[arg(long, env = "MRBOT_MODEL", global = true)]
    pub model: Option<String>,

    /// API key (otherwise read from the credentials file)
    #[arg(long, env = "ANTHROPIC_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Disable model calls; return a dummy description instead
    #[arg(long, global = true)]
    pub no_model: bool,

    /// Subcommand (e.g. 'generate')
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands, e.g. `mrbot generate develop`
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactively store the ticket URL base and API key
    Setup,

    /// Write the default markdown templates (existing files are kept)
    InitTemplates,

    /// Generate a merge request description from the commits since START_REF
    Generate {
        /// Commit, tag or branch the merge request starts from (exclusive)
        start_ref: String,

        /// Use the named template instead of picking one from the menu
        #[arg(long, short)]
        template: Option<String>,
    },
}
