use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};

use crate::cli_args::Cli;

pub const TICKET_URL_BASE_KEY: &str = "JIRA_TICKET_URL_BASE";
pub const MODEL_KEY: &str = "MODEL";
pub const API_URL_KEY: &str = "API_URL";
pub const TICKET_PATTERN_KEY: &str = "TICKET_PATTERN";

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_API_URL: &str = "https://api.anthropic.com";

/// Where mrbot keeps its files on disk.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub dir: PathBuf,
    pub config_file: PathBuf,
    pub credentials_file: PathBuf,
    pub templates_dir: PathBuf,
}

impl ConfigPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        ConfigPaths {
            config_file: dir.join("config"),
            credentials_file: dir.join("credentials"),
            templates_dir: dir.join("templates"),
            dir,
        }
    }

    /// `--config-dir` / `MRBOT_CONFIG_DIR` if given, otherwise `~/.config/mrbot`.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        if let Some(dir) = &cli.config_dir {
            return Ok(Self::new(dir));
        }
        let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
        Ok(Self::new(home.join(".config").join("mrbot")))
    }
}

/// Flat `KEY=value` store backing the `config` file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FileConfig {
    entries: BTreeMap<String, String>,
}

impl FileConfig {
    pub fn parse(data: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::debug!("Ignoring config line without '=': {line}");
                continue;
            };
            let key = key.trim().trim_start_matches("export ").trim();
            entries.insert(key.to_string(), unquote(value.trim()).to_string());
        }
        FileConfig { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Ok(Self::parse(&data))
    }

    /// Like `load`, but a missing file yields an empty config.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_private(path, &self.render())
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Ticket links are built by appending the ticket to this base, so it must
/// be an http(s) URL ending in `/`.
pub fn validate_ticket_url_base(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("{TICKET_URL_BASE_KEY} must start with http:// or https:// (got {url:?})");
    }
    if !url.ends_with('/') {
        bail!("{TICKET_URL_BASE_KEY} must end with '/' (got {url:?})");
    }
    Ok(())
}

pub fn load_credential(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read credentials file {}", path.display()))?;
    let key = data.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

pub fn save_credential(path: &Path, key: &str) -> Result<()> {
    write_private(path, &format!("{}\n", key.trim()))
}

/// Write a file readable only by the current user.
pub fn write_private(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    restrict_permissions(path)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Final resolved settings for a `generate` run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub paths: ConfigPaths,
    pub model: String,
    pub api_url: String,
    pub api_key: Option<String>,
    pub ticket_url_base: Option<String>,
    pub ticket_pattern: Option<String>,
}

impl Settings {
    /// Build the settings from CLI flags, environment, config files, and defaults.
    ///
    /// Precedence:
    ///   1. CLI flags (`--model`, `--api-key`)
    ///   2. Env vars `MRBOT_MODEL`, `ANTHROPIC_API_KEY` (read by clap)
    ///   3. `config` / `credentials` in the config directory
    ///   4. Hardcoded defaults
    ///
    /// A missing config file is an error: `mrbot setup` has to run first.
    pub fn from_sources(cli: &Cli, paths: ConfigPaths) -> Result<Self> {
        if !paths.config_file.exists() {
            bail!(
                "config file {} not found; run `mrbot setup` first",
                paths.config_file.display()
            );
        }
        let file_cfg = FileConfig::load(&paths.config_file)?;

        let model = cli
            .model
            .clone()
            .or_else(|| file_cfg.get(MODEL_KEY).map(str::to_owned))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_url = file_cfg
            .get(API_URL_KEY)
            .unwrap_or(DEFAULT_API_URL)
            .to_string();

        let api_key = match &cli.api_key {
            Some(key) => Some(key.clone()),
            None => load_credential(&paths.credentials_file)?,
        };

        Ok(Settings {
            model,
            api_url,
            api_key,
            ticket_url_base: file_cfg.get(TICKET_URL_BASE_KEY).map(str::to_owned),
            ticket_pattern: file_cfg.get(TICKET_PATTERN_KEY).map(str::to_owned),
            paths,
        })
    }
}
