use fulfillment_server::{setup_environment, Server, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, working directory, logging)
    let config = setup_environment()?;

    tracing::info!("Fulfillment server starting...");

    // 2. Server state (storage, manager, collaborator stores)
    let state = ServerState::initialize(&config)?;

    // 3. HTTP server (spawns the event observer and resync loop)
    let server = Server::with_state(config, state);
    server.run().await
}
