use super::{DocumentSource, ProfileStore};
use crate::error::{AppError, AppResult};
use crate::models::{Document, WpProfile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// A Markdown file on disk standing in for the editor's active view.
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileDocument { path: path.into() }
    }
}

#[async_trait]
impl DocumentSource for FileDocument {
    async fn read_active_document(&self) -> AppResult<Document> {
        debug!("Reading document: {}", self.path.display());

        let body = tokio::fs::read_to_string(&self.path).await?;
        let title = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty());

        Ok(Document { title, body })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub profiles: Vec<WpProfile>,
}

/// Profiles kept in a JSON settings file.
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileProfileStore { path: path.into() }
    }

    fn load(&self) -> AppResult<Settings> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::Config(format!(
                "cannot read settings {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn store(&self, settings: &Settings) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(settings)?)?;
        Ok(())
    }
}

impl ProfileStore for FileProfileStore {
    fn get_profile(&self, name: Option<&str>) -> AppResult<WpProfile> {
        let settings = self.load()?;

        let found = match name {
            Some(name) => settings.profiles.into_iter().find(|p| p.name == name),
            None => {
                let mut profiles = settings.profiles;
                match profiles.iter().position(|p| p.is_default) {
                    Some(idx) => Some(profiles.swap_remove(idx)),
                    None => profiles.into_iter().next(),
                }
            }
        };

        found.ok_or_else(|| match name {
            Some(name) => AppError::Config(format!("profile '{}' not found", name)),
            None => AppError::Config("no profiles configured".to_string()),
        })
    }

    fn remember_user_name(&self, profile_name: &str, user_name: &str) -> AppResult<()> {
        let mut settings = self.load()?;
        let profile = settings
            .profiles
            .iter_mut()
            .find(|p| p.name == profile_name)
            .ok_or_else(|| AppError::Config(format!("profile '{}' not found", profile_name)))?;

        if profile.user_name.as_deref() == Some(user_name) {
            return Ok(());
        }
        profile.user_name = Some(user_name.to_string());
        self.store(&settings)?;

        info!("Saved user name for profile {}", profile_name);
        Ok(())
    }
}
