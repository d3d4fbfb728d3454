//! Collaborators supplied by whatever hosts the publisher.
//!
//! The client layer only talks to these traits; `terminal` and `files`
//! provide the implementations used by the command-line binary.

pub mod files;
pub mod terminal;

use crate::error::AppResult;
use crate::models::{Credentials, Document, WpProfile};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

pub const ERROR_NOTICE_TIMEOUT: Duration = Duration::from_millis(15_000);
pub const INFO_NOTICE_TIMEOUT: Duration = Duration::from_millis(5_000);

/// User-facing notice texts.
pub mod messages {
    pub const NO_ENDPOINT: &str = "No endpoint configured. Set one in the profile before publishing.";
    pub const INVALID_ENDPOINT: &str = "The configured endpoint is not a valid URL.";
    pub const INVALID_OAUTH2_TOKEN: &str = "Invalid OAuth2 token. Authorize this profile again.";
    pub const PUBLISH_SUCCESS: &str = "Post published successfully!";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Sink for user-visible notices.
pub trait Notifier: Send + Sync {
    /// Shows `message` for roughly `timeout`; hosts without timed notices ignore it.
    fn notify(&self, message: &str, kind: NoticeKind, timeout: Duration);

    /// Success and progress messages.
    fn info(&self, message: &str) {
        self.notify(message, NoticeKind::Info, INFO_NOTICE_TIMEOUT);
    }

    /// Failures; these stay up longer.
    fn error(&self, message: &str) {
        self.notify(message, NoticeKind::Error, ERROR_NOTICE_TIMEOUT);
    }
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Returns the document the user is looking at, title and raw Markdown.
    async fn read_active_document(&self) -> AppResult<Document>;
}

#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Submitted(Credentials),
    Cancelled,
}

/// Blocking credential capture; callers move it off the async runtime.
pub trait LoginPrompt: Send + Sync {
    fn prompt_login(&self, endpoint: &str, prefill_user_name: Option<&str>) -> AppResult<LoginOutcome>;
}

pub trait ProfileStore: Send + Sync {
    /// Looks a profile up by name. Without a name, returns the profile
    /// flagged as default, falling back to the first one. Unknown names and
    /// empty stores are configuration errors.
    fn get_profile(&self, name: Option<&str>) -> AppResult<WpProfile>;

    /// Persists the user name typed at the prompt.
    fn remember_user_name(&self, profile_name: &str, user_name: &str) -> AppResult<()>;
}

/// Redirect-based single sign-on; resolves to a session token.
#[async_trait]
pub trait SsoHandshake: Send + Sync {
    async fn login(&self, endpoint: &Url) -> AppResult<String>;
}
