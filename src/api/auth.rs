//! Ways of authenticating a REST API call.

use crate::error::{AppError, AppResult};
use crate::host::SsoHandshake;
use crate::models::Credentials;
use reqwest::RequestBuilder;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

const WP_V2_POSTS_SEGMENTS: [&str; 4] = ["wp-json", "wp", "v2", "posts"];

pub enum AuthContext {
    AppPassword(AppPasswordContext),
    SsoRedirect(SsoRedirectContext),
    OAuth2(OAuth2Context),
}

impl AuthContext {
    pub fn name(&self) -> &'static str {
        match self {
            AuthContext::AppPassword(_) => "application-password",
            AuthContext::SsoRedirect(_) => "sso-redirect",
            AuthContext::OAuth2(_) => "oauth2",
        }
    }

    /// Whether a user name and password must be collected before publishing.
    pub fn needs_login(&self) -> bool {
        matches!(self, AuthContext::AppPassword(_))
    }

    /// Post-creation resource below `base`. The blog id is pushed as a single
    /// percent-encoded segment, so it can never leave `sites/{id}`.
    pub fn new_post_url(&self, base: &Url) -> AppResult<Url> {
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::Config(format!("endpoint is not a base URL: {}", base)))?;
            segments.pop_if_empty();
            match self {
                AuthContext::AppPassword(_) | AuthContext::SsoRedirect(_) => {
                    segments.extend(WP_V2_POSTS_SEGMENTS);
                }
                AuthContext::OAuth2(ctx) => {
                    segments
                        .extend(["rest", "v1.1", "sites"])
                        .push(&ctx.blog_id)
                        .extend(["posts", "new"]);
                }
            }
        }
        Ok(url)
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        if let AuthContext::AppPassword(ctx) = self {
            ctx.credentials = Some(credentials);
        }
    }

    /// Attaches credentials to an outgoing request.
    pub async fn authorize(&self, request: RequestBuilder, endpoint: &Url) -> AppResult<RequestBuilder> {
        match self {
            AuthContext::AppPassword(ctx) => {
                let cred = ctx
                    .credentials
                    .as_ref()
                    .ok_or(AppError::InvalidCredentials)?;
                Ok(request.basic_auth(&cred.user_name, Some(&cred.password)))
            }
            AuthContext::SsoRedirect(ctx) => {
                let token = ctx.session_token(endpoint).await?;
                Ok(request.bearer_auth(token))
            }
            AuthContext::OAuth2(ctx) => Ok(request.bearer_auth(&ctx.access_token)),
        }
    }
}

/// HTTP Basic auth with a WordPress application password.
#[derive(Debug, Default)]
pub struct AppPasswordContext {
    credentials: Option<Credentials>,
}

impl AppPasswordContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        AppPasswordContext {
            credentials: Some(credentials),
        }
    }

    pub fn user_name(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.user_name.as_str())
    }
}

/// Session obtained through a redirect login, reused for the context's lifetime.
pub struct SsoRedirectContext {
    handshake: Arc<dyn SsoHandshake>,
    session: OnceCell<String>,
}

impl SsoRedirectContext {
    pub fn new(handshake: Arc<dyn SsoHandshake>) -> Self {
        SsoRedirectContext {
            handshake,
            session: OnceCell::new(),
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.initialized()
    }

    async fn session_token(&self, endpoint: &Url) -> AppResult<&str> {
        if let Some(token) = self.session.get() {
            debug!("Reusing SSO session");
            return Ok(token);
        }

        let token = self
            .session
            .get_or_try_init(|| async {
                info!("Starting SSO login for {}", endpoint);
                self.handshake.login(endpoint).await
            })
            .await?;
        Ok(token)
    }
}

/// WordPress.com bearer token bound to one hosted blog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Context {
    blog_id: String,
    access_token: String,
}

impl OAuth2Context {
    pub fn new(blog_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        OAuth2Context {
            blog_id: blog_id.into(),
            access_token: access_token.into(),
        }
    }

    /// Blog ids are numeric or a site host; blank or dot-only ids are rejected.
    pub fn is_valid_blog_id(blog_id: &str) -> bool {
        let blog_id = blog_id.trim();
        !blog_id.is_empty() && !blog_id.chars().all(|c| c == '.')
    }

    pub fn blog_id(&self) -> &str {
        &self.blog_id
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}
