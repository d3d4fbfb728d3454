use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title used when the document has nothing to derive one from.
pub const DEFAULT_POST_TITLE: &str = "A post from Obsidian!";

pub const POST_STATUS_DRAFT: &str = "draft";
pub const POST_TYPE_POST: &str = "post";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiType {
    #[serde(rename = "xml-rpc")]
    XmlRpc,
    #[serde(rename = "rest-sso")]
    RestSso,
    #[serde(rename = "rest-app-password")]
    RestAppPassword,
    #[serde(rename = "rest-oauth2")]
    RestOAuth2,
    /// Anything written by a newer or older settings layout.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Token {
    pub blog_id: String,
    pub access_token: String,
}

/// One configured WordPress site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WpProfile {
    pub name: String,
    pub endpoint: String,
    pub api_type: Option<ApiType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth2_token: Option<OAuth2Token>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub save_user_name: bool,
    pub is_default: bool,
}

impl WpProfile {
    /// User name to pre-fill in the login prompt.
    pub fn prefill_user_name(&self) -> Option<&str> {
        if self.save_user_name {
            self.user_name.as_deref()
        } else {
            None
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            user_name: user_name.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"***")
            .finish()
    }
}

/// Active document as handed over by the host.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub title: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishRequest {
    pub title: String,
    pub body_markup: String,
    pub status: &'static str,
    pub post_type: &'static str,
}

impl PublishRequest {
    /// Builds a draft post request, applying the title fallback.
    pub fn draft(title: Option<&str>, body_markup: impl Into<String>) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_POST_TITLE)
            .to_string();

        PublishRequest {
            title,
            body_markup: body_markup.into(),
            status: POST_STATUS_DRAFT,
            post_type: POST_TYPE_POST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnCode {
    Ok,
    Error,
}

/// Outcome of one publish attempt, whatever protocol carried it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordPressClientResult {
    pub code: ReturnCode,
    pub data: Value,
}

impl WordPressClientResult {
    pub fn ok(data: Value) -> Self {
        WordPressClientResult {
            code: ReturnCode::Ok,
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        WordPressClientResult {
            code: ReturnCode::Error,
            data: Value::String(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == ReturnCode::Ok
    }
}
