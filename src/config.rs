use crate::error::{AppError, AppResult};
use clap::Parser;
use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Parser, Debug, Clone)]
#[command(name = "wppub")]
#[command(author = "Dabe Vlohn")]
#[command(version = "0.2.0")]
#[command(about = "Publish a Markdown note to WordPress as a draft post")]
pub struct Config {
    /// Markdown document to publish
    #[arg(env = "WPPUB_FILE")]
    pub file: PathBuf,

    /// Profile name from the settings file; the default profile otherwise
    #[arg(long, short, env = "WPPUB_PROFILE")]
    pub profile: Option<String>,

    /// Settings file holding the profiles
    /// Defaults to settings.json in the platform config directory
    #[arg(long, env = "WPPUB_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, env = "WPPUB_TIMEOUT", default_value = "30")]
    pub timeout_secs: u64,

    /// Print the result as JSON
    #[arg(long, env = "WPPUB_JSON")]
    pub json: bool,
}

impl Config {
    pub fn validate(&self) -> AppResult<()> {
        if !self.file.is_file() {
            return Err(AppError::Config(format!(
                "document not found: {}",
                self.file.display()
            )));
        }

        if self.timeout_secs == 0 {
            return Err("--timeout-secs must be greater than zero".into());
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settings_path(&self) -> AppResult<PathBuf> {
        if let Some(path) = &self.settings {
            return Ok(path.clone());
        }
        ProjectDirs::from("", "", "wppub")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
            .ok_or_else(|| AppError::Config("cannot locate a config directory; pass --settings".to_string()))
    }
}
