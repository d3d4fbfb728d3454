pub mod auth;
pub mod rest;
pub mod xmlrpc;

use crate::error::{AppError, AppResult};
use crate::host::{messages, Notifier, SsoHandshake};
use crate::models::{ApiType, Credentials, PublishRequest, WordPressClientResult, WpProfile};
use auth::{AppPasswordContext, AuthContext, OAuth2Context, SsoRedirectContext};
use reqwest::Client;
use rest::RestClient;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;
use xmlrpc::XmlRpcClient;

const USER_AGENT: &str = "wppub/0.2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest slice of an error body carried into the result message.
pub(crate) const MAX_ERROR_BODY: usize = 300;

pub(crate) fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Parses a profile endpoint and makes sure its path ends in `/`, so that
/// relative API paths land below it.
pub(crate) fn endpoint_base(endpoint: &str) -> AppResult<Url> {
    let mut url = Url::parse(endpoint.trim())?;
    if url.cannot_be_a_base() {
        return Err(AppError::Config(format!("endpoint is not a base URL: {}", endpoint)));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// What the factory needs besides the profile itself.
#[derive(Clone)]
pub struct ClientContext {
    pub notifier: Arc<dyn Notifier>,
    pub sso: Arc<dyn SsoHandshake>,
    pub timeout: Duration,
}

impl ClientContext {
    pub fn new(notifier: Arc<dyn Notifier>, sso: Arc<dyn SsoHandshake>) -> Self {
        ClientContext {
            notifier,
            sso,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub enum ProtocolClient {
    XmlRpc(XmlRpcClient),
    Rest(RestClient),
}

impl ProtocolClient {
    async fn new_post(&self, request: &PublishRequest) -> AppResult<Value> {
        match self {
            ProtocolClient::XmlRpc(client) => client.new_post(request).await,
            ProtocolClient::Rest(client) => client.new_post(request).await,
        }
    }
}

/// A protocol client plus the notice sink its outcomes are reported to.
pub struct WordPressClient {
    protocol: ProtocolClient,
    notifier: Arc<dyn Notifier>,
}

impl WordPressClient {
    pub fn protocol(&self) -> &ProtocolClient {
        &self.protocol
    }

    pub fn needs_login(&self) -> bool {
        match &self.protocol {
            ProtocolClient::XmlRpc(_) => true,
            ProtocolClient::Rest(client) => client.auth().needs_login(),
        }
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        match &mut self.protocol {
            ProtocolClient::XmlRpc(client) => client.set_credentials(credentials),
            ProtocolClient::Rest(client) => client.set_credentials(credentials),
        }
    }

    /// Creates a new draft post. Every call creates a new post.
    pub async fn new_post(&self, request: &PublishRequest) -> WordPressClientResult {
        self.new_post_until(request, &CancellationToken::new()).await
    }

    /// Like `new_post`, but gives up as soon as `cancel` fires.
    pub async fn new_post_until(
        &self,
        request: &PublishRequest,
        cancel: &CancellationToken,
    ) -> WordPressClientResult {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            outcome = self.protocol.new_post(request) => outcome,
        };

        match outcome {
            Ok(data) => {
                self.notifier.info(messages::PUBLISH_SUCCESS);
                WordPressClientResult::ok(data)
            }
            Err(e) => self.fail(e),
        }
    }

    pub(crate) fn fail(&self, err: AppError) -> WordPressClientResult {
        match err {
            AppError::Cancelled => debug!("Publish cancelled"),
            ref e => self.notifier.error(&e.to_string()),
        }
        WordPressClientResult::error(err.to_string())
    }
}

/// Picks and builds the client a profile asks for. Returns `None` when the
/// profile cannot be used yet; configuration problems are reported through
/// the notifier.
pub fn get_wordpress_client(profile: &WpProfile, ctx: &ClientContext) -> Option<WordPressClient> {
    if profile.endpoint.trim().is_empty() {
        ctx.notifier.error(messages::NO_ENDPOINT);
        return None;
    }

    let rest = |auth: AuthContext| RestClient::new(&profile.endpoint, auth, ctx.timeout).map(ProtocolClient::Rest);

    let protocol = match profile.api_type {
        Some(ApiType::XmlRpc) => XmlRpcClient::new(&profile.endpoint, ctx.timeout).map(ProtocolClient::XmlRpc),
        Some(ApiType::RestSso) => rest(AuthContext::SsoRedirect(SsoRedirectContext::new(ctx.sso.clone()))),
        Some(ApiType::RestAppPassword) => rest(AuthContext::AppPassword(AppPasswordContext::new())),
        Some(ApiType::RestOAuth2) => match &profile.oauth2_token {
            Some(token)
                if !token.access_token.trim().is_empty()
                    && OAuth2Context::is_valid_blog_id(&token.blog_id) =>
            {
                rest(AuthContext::OAuth2(OAuth2Context::new(
                    token.blog_id.trim(),
                    token.access_token.clone(),
                )))
            }
            _ => {
                ctx.notifier.error(messages::INVALID_OAUTH2_TOKEN);
                return None;
            }
        },
        Some(ApiType::Unknown) | None => {
            warn!("Profile '{}' has no recognised API type", profile.name);
            return None;
        }
    };

    match protocol {
        Ok(protocol) => Some(WordPressClient {
            protocol,
            notifier: ctx.notifier.clone(),
        }),
        Err(e) => {
            warn!("Cannot build client for profile '{}': {}", profile.name, e);
            ctx.notifier.error(&format!("{} ({})", messages::INVALID_ENDPOINT, e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{CountingSso, RecordingNotifier};
    use crate::host::NoticeKind;
    use crate::models::{OAuth2Token, ReturnCode};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context() -> (Arc<RecordingNotifier>, ClientContext) {
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = ClientContext::new(notifier.clone(), Arc::new(CountingSso::default()))
            .with_timeout(Duration::from_secs(5));
        (notifier, ctx)
    }

    fn profile(endpoint: &str, api_type: Option<ApiType>) -> WpProfile {
        WpProfile {
            name: "test".into(),
            endpoint: endpoint.into(),
            api_type,
            ..Default::default()
        }
    }

    #[test]
    fn empty_endpoint_yields_no_client_and_one_notice() {
        for api_type in [
            Some(ApiType::XmlRpc),
            Some(ApiType::RestSso),
            Some(ApiType::RestAppPassword),
            Some(ApiType::RestOAuth2),
            None,
        ] {
            let (notifier, ctx) = context();
            assert!(get_wordpress_client(&profile("", api_type), &ctx).is_none());
            assert_eq!(
                notifier.taken(),
                vec![(messages::NO_ENDPOINT.to_string(), NoticeKind::Error)]
            );
        }
    }

    #[test]
    fn oauth2_requires_token() {
        let (notifier, ctx) = context();
        let p = profile("https://public-api.wordpress.com/", Some(ApiType::RestOAuth2));
        assert!(get_wordpress_client(&p, &ctx).is_none());
        assert_eq!(notifier.errors(), vec![messages::INVALID_OAUTH2_TOKEN.to_string()]);
    }

    #[test]
    fn oauth2_rejects_blank_blog_id() {
        for blog_id in ["", "  ", ".."] {
            let (notifier, ctx) = context();
            let mut p = profile("https://public-api.wordpress.com/", Some(ApiType::RestOAuth2));
            p.oauth2_token = Some(OAuth2Token {
                blog_id: blog_id.into(),
                access_token: "secret-token".into(),
            });
            assert!(get_wordpress_client(&p, &ctx).is_none());
            assert_eq!(notifier.errors(), vec![messages::INVALID_OAUTH2_TOKEN.to_string()]);
        }
    }

    #[tokio::test]
    async fn oauth2_blog_id_is_escaped_on_the_wire() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1.1/sites/12%3Fx=1/posts/new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ID": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let (_, ctx) = context();
        let mut p = profile(&server.uri(), Some(ApiType::RestOAuth2));
        p.oauth2_token = Some(OAuth2Token {
            blog_id: "12?x=1".into(),
            access_token: "secret-token".into(),
        });
        let client = get_wordpress_client(&p, &ctx).unwrap();
        assert!(client.new_post(&PublishRequest::draft(None, "")).await.is_ok());
    }

    #[test]
    fn oauth2_context_holds_profile_token() {
        let (notifier, ctx) = context();
        let mut p = profile("https://public-api.wordpress.com/", Some(ApiType::RestOAuth2));
        p.oauth2_token = Some(OAuth2Token {
            blog_id: "4242".into(),
            access_token: "secret-token".into(),
        });

        let client = get_wordpress_client(&p, &ctx).unwrap();
        match client.protocol() {
            ProtocolClient::Rest(rest) => match rest.auth() {
                AuthContext::OAuth2(oauth) => {
                    assert_eq!(oauth.blog_id(), "4242");
                    assert_eq!(oauth.access_token(), "secret-token");
                }
                _ => panic!("expected OAuth2 context"),
            },
            _ => panic!("expected REST client"),
        }
        assert!(!client.needs_login());
        assert!(notifier.taken().is_empty());
    }

    #[test]
    fn dispatches_on_api_type() {
        let (_, ctx) = context();

        let xml = get_wordpress_client(&profile("https://example.com/blog/", Some(ApiType::XmlRpc)), &ctx).unwrap();
        match xml.protocol() {
            ProtocolClient::XmlRpc(client) => {
                assert_eq!(client.transport().port, 443);
                assert!(client.transport().secure);
                assert_eq!(client.transport().path, "/blog/xmlrpc.php");
            }
            _ => panic!("expected XML-RPC client"),
        }
        assert!(xml.needs_login());

        let app = get_wordpress_client(&profile("https://example.com/", Some(ApiType::RestAppPassword)), &ctx).unwrap();
        assert!(matches!(app.protocol(), ProtocolClient::Rest(r) if matches!(r.auth(), AuthContext::AppPassword(_))));
        assert!(app.needs_login());

        let sso = get_wordpress_client(&profile("https://example.com/", Some(ApiType::RestSso)), &ctx).unwrap();
        assert!(matches!(sso.protocol(), ProtocolClient::Rest(r) if matches!(r.auth(), AuthContext::SsoRedirect(_))));
        assert!(!sso.needs_login());
    }

    #[test]
    fn unknown_api_type_is_silent() {
        for api_type in [None, Some(ApiType::Unknown)] {
            let (notifier, ctx) = context();
            assert!(get_wordpress_client(&profile("https://example.com/", api_type), &ctx).is_none());
            assert!(notifier.taken().is_empty());
        }
    }

    #[test]
    fn unparsable_endpoint_is_reported() {
        let (notifier, ctx) = context();
        assert!(get_wordpress_client(&profile("not a url", Some(ApiType::RestAppPassword)), &ctx).is_none());
        assert_eq!(notifier.errors().len(), 1);
    }

    const POST_ID_RESPONSE: &str = "<methodResponse><params><param><value><string>7</string></value></param></params></methodResponse>";

    #[tokio::test]
    async fn result_code_follows_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("<string>good</string>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(POST_ID_RESPONSE))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("<string>bad</string>"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (notifier, ctx) = context();
        let mut client = get_wordpress_client(&profile(&server.uri(), Some(ApiType::XmlRpc)), &ctx).unwrap();

        client.set_credentials(Credentials::new("admin", "good"));
        let ok = client.new_post(&PublishRequest::draft(None, "")).await;
        assert_eq!(ok.code, ReturnCode::Ok);
        assert_eq!(ok.data, json!("7"));

        client.set_credentials(Credentials::new("admin", "bad"));
        let failed = client.new_post(&PublishRequest::draft(None, "")).await;
        assert_eq!(failed.code, ReturnCode::Error);
        assert!(failed.data.as_str().unwrap().contains("500"));

        assert_eq!(
            notifier.taken(),
            vec![
                (messages::PUBLISH_SUCCESS.to_string(), NoticeKind::Info),
                (failed.data.as_str().unwrap().to_string(), NoticeKind::Error),
            ]
        );
    }

    #[tokio::test]
    async fn connection_failure_is_an_error_result() {
        let server = MockServer::start().await;
        let endpoint = server.uri();
        drop(server);

        let (notifier, ctx) = context();
        let mut client = get_wordpress_client(&profile(&endpoint, Some(ApiType::RestAppPassword)), &ctx).unwrap();
        client.set_credentials(Credentials::new("a", "b"));

        let result = client.new_post(&PublishRequest::draft(None, "")).await;
        assert!(!result.is_ok());
        assert_eq!(notifier.errors().len(), 1);
    }

    /// Posts are never deduplicated: the post id argument is always 0, so
    /// publishing twice is expected to create two drafts.
    #[tokio::test]
    async fn publishing_twice_creates_two_posts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("<param><value><int>0</int></value></param>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(POST_ID_RESPONSE))
            .expect(2)
            .mount(&server)
            .await;

        let (_, ctx) = context();
        let mut client = get_wordpress_client(&profile(&server.uri(), Some(ApiType::XmlRpc)), &ctx).unwrap();
        client.set_credentials(Credentials::new("admin", "pw"));

        let request = PublishRequest::draft(Some("Same"), "<p>same</p>");
        assert!(client.new_post(&request).await.is_ok());
        assert!(client.new_post(&request).await.is_ok());
    }

    #[tokio::test]
    async fn cancelled_publish_skips_notice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(POST_ID_RESPONSE)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let (notifier, ctx) = context();
        let mut client = get_wordpress_client(&profile(&server.uri(), Some(ApiType::XmlRpc)), &ctx).unwrap();
        client.set_credentials(Credentials::new("admin", "pw"));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = client.new_post_until(&PublishRequest::draft(None, ""), &cancel).await;
        assert_eq!(result, WordPressClientResult::error(AppError::Cancelled.to_string()));
        assert!(notifier.taken().is_empty());
    }
}
