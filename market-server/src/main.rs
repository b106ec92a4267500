use market_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    setup_environment();

    print_banner();

    tracing::info!("Market server starting...");

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize state (database, provider client, policies)
    let state = ServerState::initialize(&config).await;

    // 4. Run the HTTP server (background tasks start inside run())
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {e}");
        anyhow::bail!("server exited with error: {e}");
    }

    Ok(())
}
