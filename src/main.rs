use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use wppub::api::ClientContext;
use wppub::config::Config;
use wppub::error::{AppError, AppResult};
use wppub::host::files::{FileDocument, FileProfileStore};
use wppub::host::terminal::{TerminalLoginPrompt, TerminalNotifier, TerminalSsoHandshake};
use wppub::host::{LoginOutcome, LoginPrompt, ProfileStore};
use wppub::publish::begin_publish;

#[tokio::main]
async fn main() -> AppResult<()> {
    init_tracing()?;

    let config = Config::parse();
    config.validate()?;

    let store = FileProfileStore::new(config.settings_path()?);
    let profile = store.get_profile(config.profile.as_deref())?;

    info!(
        "Publishing {} with profile '{}' ({:?})",
        config.file.display(),
        profile.name,
        profile.api_type
    );

    let ctx = ClientContext::new(Arc::new(TerminalNotifier), Arc::new(TerminalSsoHandshake))
        .with_timeout(config.timeout());

    let Some(pending) = begin_publish(&profile, &ctx) else {
        return Err(AppError::Config(format!(
            "profile '{}' is not ready for publishing",
            profile.name
        )));
    };

    let credentials = if pending.needs_credentials() {
        let endpoint = pending.endpoint().to_string();
        let prefill = pending.prefill_user_name().map(str::to_string);
        let outcome = tokio::task::spawn_blocking(move || {
            TerminalLoginPrompt.prompt_login(&endpoint, prefill.as_deref())
        })
        .await
        .map_err(|e| AppError::Custom(format!("login prompt failed: {}", e)))??;

        match outcome {
            LoginOutcome::Submitted(credentials) => {
                if profile.save_user_name {
                    if let Err(e) = store.remember_user_name(&profile.name, &credentials.user_name) {
                        warn!("Could not save user name: {}", e);
                    }
                }
                Some(credentials)
            }
            LoginOutcome::Cancelled => {
                pending.cancel();
                return Ok(());
            }
        }
    } else {
        None
    };

    let cancel = pending.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling publish");
            cancel.cancel();
        }
    });

    let document = FileDocument::new(&config.file);
    let result = pending.complete(credentials, &document).await;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.is_ok() {
        println!("{}", result.data);
    }

    if !result.is_ok() {
        error!("Publish failed: {}", result.data);
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing() -> AppResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .init();

    Ok(())
}
