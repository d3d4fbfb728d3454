pub mod codec;

use super::{build_http_client, endpoint_base, MAX_ERROR_BODY};
use crate::error::{AppError, AppResult};
use crate::models::{Credentials, PublishRequest};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

pub const XMLRPC_ENTRY_POINT: &str = "xmlrpc.php";
const METHOD_NEW_POST: &str = "wp.newPost";
/// Leading `wp.newPost` argument; always 0, so each call creates a post.
const NEW_POST_ID: i64 = 0;

/// Where the XML-RPC endpoint lives. XML-RPC has no content negotiation,
/// so TLS is picked from the endpoint's scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlRpcTransport {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub secure: bool,
}

impl XmlRpcTransport {
    pub fn from_endpoint(endpoint: &str) -> AppResult<Self> {
        let url = endpoint_base(endpoint)?;
        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(AppError::Config(format!("unsupported endpoint scheme: {}", other)));
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| AppError::Config(format!("endpoint has no host: {}", endpoint)))?
            .to_string();
        let port = url.port().unwrap_or(if secure { 443 } else { 80 });

        Ok(XmlRpcTransport {
            host,
            port,
            path: format!("{}{}", url.path(), XMLRPC_ENTRY_POINT),
            secure,
        })
    }

    pub fn url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, self.path)
    }
}

pub struct XmlRpcClient {
    http_client: Client,
    transport: XmlRpcTransport,
    credentials: Option<Credentials>,
}

impl XmlRpcClient {
    pub fn new(endpoint: &str, timeout: Duration) -> AppResult<Self> {
        let transport = XmlRpcTransport::from_endpoint(endpoint)?;
        debug!("XML-RPC transport: {}", transport.url());

        Ok(XmlRpcClient {
            http_client: build_http_client(timeout),
            transport,
            credentials: None,
        })
    }

    pub fn transport(&self) -> &XmlRpcTransport {
        &self.transport
    }

    pub(crate) fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    pub async fn new_post(&self, request: &PublishRequest) -> AppResult<Value> {
        // Credentials travel inside the call itself
        let cred = self.credentials.as_ref().ok_or(AppError::InvalidCredentials)?;

        // Post id 0 asks for a new post
        let content = json!({
            "post_type": request.post_type,
            "post_status": request.status,
            "post_title": request.title,
            "post_content": request.body_markup,
        });
        let call = codec::encode_method_call(
            METHOD_NEW_POST,
            &[
                json!(NEW_POST_ID),
                json!(cred.user_name),
                json!(cred.password),
                content,
            ],
        );

        debug!("Calling {} on {}", METHOD_NEW_POST, self.transport.url());

        let response = self
            .http_client
            .post(self.transport.url())
            .header(CONTENT_TYPE, "text/xml")
            .body(call)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to call {}: {}", METHOD_NEW_POST, e);
                AppError::from_transport(e)
            })?;

        // Faults come back as 200, so the body is decoded even on success
        let status = response.status();
        let text = response.text().await.map_err(AppError::from_transport)?;
        if !status.is_success() {
            error!("XML-RPC endpoint returned status: {}", status);
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let value = codec::decode_method_response(&text).map_err(|e| {
            error!("Method response for {} failed: {}", METHOD_NEW_POST, e);
            e
        })?;

        info!("Successfully created post via XML-RPC: {}", value);
        Ok(value)
    }
}
