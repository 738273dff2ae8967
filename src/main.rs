/**
 * Fingermatch Server
 * Local fingerprint verification service for the attendance front end
 */

use std::process::ExitCode;

use fingermatch::{config::Config, start_server};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration rejected: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = start_server(config).await {
        error!("Server failed: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
