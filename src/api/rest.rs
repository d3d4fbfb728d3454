use super::auth::AuthContext;
use super::{build_http_client, endpoint_base, MAX_ERROR_BODY};
use crate::error::{AppError, AppResult};
use crate::models::{Credentials, PublishRequest};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

pub struct RestClient {
    http_client: Client,
    base_url: Url,
    auth: AuthContext,
}

impl RestClient {
    pub fn new(endpoint: &str, auth: AuthContext, timeout: Duration) -> AppResult<Self> {
        Ok(RestClient {
            http_client: build_http_client(timeout),
            base_url: endpoint_base(endpoint)?,
            auth,
        })
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub(crate) fn set_credentials(&mut self, credentials: Credentials) {
        self.auth.set_credentials(credentials);
    }

    pub async fn new_post(&self, request: &PublishRequest) -> AppResult<Value> {
        // Resource depends on the auth scheme (WordPress.com routes per blog)
        let url = self.auth.new_post_url(&self.base_url)?;
        debug!("Creating post via REST ({}) at {}", self.auth.name(), url);

        // WordPress takes the same draft fields on both REST flavours
        let body = json!({
            "title": request.title,
            "content": request.body_markup,
            "status": request.status,
        });

        // May suspend on the SSO handshake the first time round
        let builder = self.http_client.post(url).json(&body);
        let builder = self.auth.authorize(builder, &self.base_url).await?;

        let response = builder.send().await.map_err(|e| {
            error!("Failed to create post: {}", e);
            AppError::from_transport(e)
        })?;

        // Anything but 2xx is reported with WordPress's own message
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("REST API returned status: {}", status);
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                body: error_detail(&text),
            });
        }

        let created: Value = response.json().await.map_err(|e| {
            error!("Failed to parse post response: {}", e);
            AppError::ApiError(format!("malformed response body: {}", e))
        })?;

        info!("Successfully created post: {}", created["id"]);
        Ok(created)
    }
}

/// WordPress error bodies carry a `message`; anything else is cut short.
fn error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value["message"].as_str() {
            return message.to_string();
        }
    }
    body.chars().take(MAX_ERROR_BODY).collect()
}
