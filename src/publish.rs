//! Publishing the active document as a two-step exchange: `begin_publish`
//! resolves the client, then the caller either completes the publish with
//! whatever credentials it collected or cancels it.

use crate::api::{get_wordpress_client, ClientContext, WordPressClient};
use crate::error::AppError;
use crate::host::DocumentSource;
use crate::models::{Credentials, PublishRequest, WordPressClientResult, WpProfile};
use crate::render;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A publish whose client is ready but which still waits on the user.
pub struct PendingPublish {
    client: WordPressClient,
    endpoint: String,
    prefill_user_name: Option<String>,
    cancel: CancellationToken,
}

/// The user backed out before anything was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

pub fn begin_publish(profile: &WpProfile, ctx: &ClientContext) -> Option<PendingPublish> {
    let client = get_wordpress_client(profile, ctx)?;
    debug!("Publish started for profile '{}'", profile.name);

    Some(PendingPublish {
        client,
        endpoint: profile.endpoint.clone(),
        prefill_user_name: profile.prefill_user_name().map(str::to_string),
        cancel: CancellationToken::new(),
    })
}

impl PendingPublish {
    /// Whether a login prompt must be shown before `complete`.
    pub fn needs_credentials(&self) -> bool {
        self.client.needs_login()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn prefill_user_name(&self) -> Option<&str> {
        self.prefill_user_name.as_deref()
    }

    /// Token that aborts the SSO handshake or the network call when fired.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(self) -> Cancelled {
        self.cancel.cancel();
        info!("Publish to {} cancelled", self.endpoint);
        Cancelled
    }

    /// Reads the document, renders it and sends it. Always yields exactly
    /// one result.
    pub async fn complete(
        mut self,
        credentials: Option<Credentials>,
        document: &dyn DocumentSource,
    ) -> WordPressClientResult {
        if self.client.needs_login() {
            match credentials {
                Some(credentials) => self.client.set_credentials(credentials),
                None => return self.client.fail(AppError::InvalidCredentials),
            }
        }

        if self.cancel.is_cancelled() {
            return self.client.fail(AppError::Cancelled);
        }

        let document = match document.read_active_document().await {
            Ok(document) => document,
            Err(e) => {
                warn!("Reading document for publish failed: {}", e);
                return self.client.fail(AppError::DocumentUnreadable(e.to_string()));
            }
        };

        let body = render::markdown_to_html(&document.body);
        let request = PublishRequest::draft(document.title.as_deref(), body);

        self.client.new_post_until(&request, &self.cancel).await
    }
}
