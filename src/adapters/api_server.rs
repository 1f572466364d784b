use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::api::{create_router, AppState};
use crate::artifacts::{ArtifactBundle, ArtifactPaths};
use crate::config::ServerConfig;
use crate::error::{PostCovidError, Result};
use crate::predictor::Predictor;

/// Load the artifacts once and build the shared handler state.
pub fn load_app_state(paths: &ArtifactPaths) -> Result<AppState> {
    let bundle = ArtifactBundle::load(paths)?;
    let predictor = Predictor::from_bundle(bundle)?;
    Ok(AppState::new(predictor))
}

/// Start the prediction server and run until Ctrl+C / SIGTERM
pub async fn start_api_server(server: &ServerConfig, state: AppState) -> Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| PostCovidError::InvalidConfig(format!("bind address: {e}")))?;
    info!("🚀 Prediction service listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Prediction service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
