use super::{LoginOutcome, LoginPrompt, NoticeKind, Notifier, SsoHandshake};
use crate::error::{AppError, AppResult};
use crate::models::Credentials;
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Prints notices to stderr; the timeout has no meaning on a terminal.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str, kind: NoticeKind, _timeout: Duration) {
        match kind {
            NoticeKind::Info => {
                info!("{}", message);
                eprintln!("{}", message);
            }
            NoticeKind::Error => {
                warn!("{}", message);
                eprintln!("[Error] {}", message);
            }
        }
    }
}

pub struct TerminalLoginPrompt;

impl LoginPrompt for TerminalLoginPrompt {
    fn prompt_login(&self, endpoint: &str, prefill_user_name: Option<&str>) -> AppResult<LoginOutcome> {
        let mut stderr = io::stderr();
        match prefill_user_name {
            Some(name) => write!(stderr, "User name for {} [{}]: ", endpoint, name)?,
            None => write!(stderr, "User name for {}: ", endpoint)?,
        }
        stderr.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            debug!("Login prompt closed on EOF");
            return Ok(LoginOutcome::Cancelled);
        }

        let user_name = match (line.trim(), prefill_user_name) {
            ("", Some(name)) => name.to_string(),
            ("", None) => return Ok(LoginOutcome::Cancelled),
            (typed, _) => typed.to_string(),
        };

        let password = match rpassword::prompt_password("Password: ") {
            Ok(password) => password,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(LoginOutcome::Cancelled),
            Err(e) => return Err(e.into()),
        };
        if password.is_empty() {
            return Ok(LoginOutcome::Cancelled);
        }

        Ok(LoginOutcome::Submitted(Credentials::new(user_name, password)))
    }
}

/// Sends the user to the site's login page and waits for the session
/// token the SSO plugin shows after the redirect back.
pub struct TerminalSsoHandshake;

#[async_trait]
impl SsoHandshake for TerminalSsoHandshake {
    async fn login(&self, endpoint: &Url) -> AppResult<String> {
        let login_url = endpoint.join("wp-login.php")?;
        eprintln!("Sign in at {} and paste the session token below.", login_url);

        let token = tokio::task::spawn_blocking(|| rpassword::prompt_password("Session token: "))
            .await
            .map_err(|e| AppError::Custom(format!("SSO prompt failed: {}", e)))??;

        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(AppError::InvalidCredentials);
        }
        Ok(token)
    }
}
