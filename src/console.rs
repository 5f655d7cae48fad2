//! Command-line console for the AssetShare API.
//!
//! One subcommand per gateway operation. Results print as `OK <action>` followed
//! by the pretty-printed payload, failures as "`<action>` failed: message
//! (HTTP status)" on stderr with a non-zero exit code.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use assetshare_client::api::{ApiClient, RequestResult};
use assetshare_client::config::{Config, normalize_base_url};
use assetshare_client::session::SessionStore;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "assetshare", version, about = "Console for the AssetShare rental marketplace API")]
pub struct Cli {
    /// Backend base URL (overrides ASSETSHARE_API_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Session file (overrides ASSETSHARE_SESSION_FILE)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// GET /<resource>
    List { resource: String },
    /// GET /<resource>/<id>
    Get { resource: String, id: String },
    /// POST /<resource> with a JSON body
    Create {
        resource: String,
        #[arg(default_value = "{}")]
        body: String,
    },
    /// PUT /<resource>/<id> with a JSON body
    Update {
        resource: String,
        id: String,
        #[arg(default_value = "{}")]
        body: String,
    },
    /// DELETE /<resource>/<id>
    Delete { resource: String, id: String },
    /// Register and store the returned session
    Register { body: String },
    /// Log in and store the returned session
    Login { body: String },
    /// Log out and clear the stored session
    Logout,
    /// Show the authenticated user
    Me,
    /// Check the stored session against the backend
    Validate,
    /// Reviews for a listing
    Reviews { listing_id: String },
    /// Average rating for a listing
    Rating { listing_id: String },
    /// GET /assets
    Assets,
    /// GET /assets/<id>
    Asset { id: String },
    /// POST /assets with a JSON body
    CreateAsset {
        #[arg(default_value = "{}")]
        body: String,
    },
    /// Print session changes made by other processes until interrupted
    Watch {
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

/// Parse a JSON body typed on the command line. Blank input means `{}`.
pub fn parse_body(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(text).context("invalid JSON body")
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.api_base_url = normalize_base_url(base_url)?;
    }
    if let Some(session_file) = &cli.session_file {
        config.session_file = session_file.clone();
    }
    Ok(config)
}

fn report(action: &str, result: RequestResult) -> Result<ExitCode> {
    match result {
        Ok(data) => {
            println!("OK {action}");
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprintln!("{}", error.describe(action));
            if let Some(details) = &error.details {
                eprintln!("{}", serde_json::to_string_pretty(details)?);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Cancel `cancel` on Ctrl+C
fn cancel_on_interrupt(cancel: &CancellationToken) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Error waiting for ctrl_c: {}", e);
            return;
        }
        tracing::info!("Interrupt received, cancelling");
        cancel.cancel();
    });
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(&cli)?;
    tracing::debug!(base_url = %config.api_base_url, session_file = %config.session_file.display(), "configuration loaded");

    let client = ApiClient::from_config(&config);
    let cancel = CancellationToken::new();
    cancel_on_interrupt(&cancel);

    match cli.command {
        Command::List { resource } => {
            report(&format!("GET /{resource}"), client.list(&resource, &cancel).await)
        }
        Command::Get { resource, id } => report(
            &format!("GET /{resource}/{id}"),
            client.get(&resource, &id, &cancel).await,
        ),
        Command::Create { resource, body } => {
            let body = parse_body(&body)?;
            report(
                &format!("POST /{resource}"),
                client.create(&resource, body, &cancel).await,
            )
        }
        Command::Update { resource, id, body } => {
            let body = parse_body(&body)?;
            report(
                &format!("PUT /{resource}/{id}"),
                client.update(&resource, &id, body, &cancel).await,
            )
        }
        Command::Delete { resource, id } => report(
            &format!("DELETE /{resource}/{id}"),
            client.delete(&resource, &id, &cancel).await,
        ),
        Command::Register { body } => {
            let body = parse_body(&body)?;
            report("Register", client.register(body, &cancel).await)
        }
        Command::Login { body } => {
            let body = parse_body(&body)?;
            report("Login", client.login(body, &cancel).await)
        }
        Command::Logout => report("Logout", client.logout(&cancel).await),
        Command::Me => report("GET /Auth/me", client.current_user(&cancel).await),
        Command::Validate => {
            let validation = client.validate_session(&cancel).await;
            println!("{}", serde_json::to_string_pretty(&validation)?);
            Ok(if validation.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Reviews { listing_id } => report(
            &format!("GET /Review/Listing/{listing_id}"),
            client.reviews_for_listing(&listing_id, &cancel).await,
        ),
        Command::Rating { listing_id } => report(
            &format!("GET /Review/Rating/{listing_id}"),
            client.average_rating(&listing_id, &cancel).await,
        ),
        Command::Assets => report("GET /assets", client.list_assets(&cancel).await),
        Command::Asset { id } => report(
            &format!("GET /assets/{id}"),
            client.get_asset(&id, &cancel).await,
        ),
        Command::CreateAsset { body } => {
            let body = parse_body(&body)?;
            report("POST /assets", client.create_asset(body, &cancel).await)
        }
        Command::Watch { interval_ms } => watch(client.session(), interval_ms, cancel).await,
    }
}

async fn watch(session: &SessionStore, interval_ms: u64, cancel: CancellationToken) -> Result<ExitCode> {
    if interval_ms == 0 {
        bail!("--interval-ms must be greater than zero");
    }

    let mut events = session.subscribe();
    let watcher = session.watch(Duration::from_millis(interval_ms), cancel.clone());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} session events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    watcher.await.context("session watcher panicked")?;
    Ok(ExitCode::SUCCESS)
}
