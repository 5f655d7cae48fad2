//! # AssetShare Console
//!
//! Command-line front-end for the AssetShare rental marketplace API: browse
//! and edit resources, log in and out, and inspect the stored session.
//!
//! ## Environment Setup
//! Settings are read from the environment or a `.env` file:
//! ```bash
//! ASSETSHARE_API_BASE_URL=https://api.example/api
//! ASSETSHARE_SESSION_FILE=~/.assetshare/session.json
//! RUST_LOG=info
//! ```
//!
//! ## Examples
//! ```bash
//! assetshare login '{"email":"ana@example.com","password":"..."}'
//! assetshare get Listing 5
//! assetshare validate
//! ```

mod console;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point.
///
/// Loads `.env`, initializes logging to stderr and runs one console command.
/// Logging defaults to `info` unless `RUST_LOG` says otherwise.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false) // Don't show module targets for cleaner output
                .compact(),
        )
        .init();

    tracing::debug!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let cli = console::Cli::parse();
    match console::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
