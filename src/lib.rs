/**
 * Fingermatch
 * Fingerprint verification service and the client-side matching protocol
 * built on top of it
 *
 * Handles:
 * - Decoding PNG fingerprint captures (bare base64 or data URLs)
 * - Template extraction and scoring behind the `FingerprintEngine` trait
 * - `POST /verify` with a configured accept/reject threshold
 * - Enrollment duplicate checks and 1:N attendance identification
 */

use std::sync::Arc;

use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tracing::info;

pub mod biometric;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod routes;

use biometric::BiometricService;
use config::Config;
use engine::RidgeFieldEngine;
use routes::{router, AppState};

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn start_server(config: Config) -> std::io::Result<()> {
    info!(
        "Starting fingerprint verification service (threshold {})",
        config.threshold
    );

    let state = AppState {
        biometric: Arc::new(BiometricService::new(
            RidgeFieldEngine::new(),
            config.threshold,
        )),
    };
    let app = router(state, config.body_limit);

    let listener = TcpListener::bind(config.bind).await?;
    info!("Listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
