use store_server::{print_banner, Config, Server, ServerState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv + logging)
    dotenv::dotenv().ok();
    store_server::init_logger();

    print_banner();
    tracing::info!("Store server starting...");

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize server state (pool, ledger, providers)
    let state = ServerState::initialize(&config).await?;

    // 4. Run HTTP server (spawns the index synchronizer)
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
