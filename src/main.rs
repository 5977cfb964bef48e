use etanalyst::config::{self, DEFAULT_LOG_LEVEL};
use etanalyst::estimation::load_model_or_fallback;
use etanalyst::logging::init_tracing;
use etanalyst::services::HttpMapServices;
use etanalyst::{api, state};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match config::load_default() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(DEFAULT_LOG_LEVEL);
            tracing::error!(
                config_path = config::DEFAULT_CONFIG_PATH,
                error = %e,
                "Failed to load config"
            );
            return Err(e.into());
        }
    };
    init_tracing(config.log_level());
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "etanalyst starting"
    );

    let model = load_model_or_fallback(config.model_path());

    let services = HttpMapServices::new(config.service_settings())?;
    if !services.has_distance_provider() {
        tracing::warn!("No distance provider key configured, using haversine distances");
    }

    let state = Arc::new(state::AppState::new(
        model,
        services,
        config.model_accuracy(),
    ));
    let app = api::router(state);
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
