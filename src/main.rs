use imagesim::{create_router, init, AppState, Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the application
    init()?;

    let config = Config::from_env()?;
    let addr = config.socket_addr();
    log::info!(
        "Loading model from {} (device {})",
        config.model_weights.display(),
        config.device
    );

    // Model loading reads a ~45MB file; keep it off the runtime threads
    let state = tokio::task::spawn_blocking(move || AppState::load(config)).await??;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
