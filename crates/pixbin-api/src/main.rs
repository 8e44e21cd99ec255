use anyhow::Result;
use pixbin_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    pixbin_api::telemetry::init_tracing();

    // Initialize the application (storage, limiter, verifier, routes)
    let state = pixbin_api::state::AppState::initialize(config.clone()).await?;
    let app = pixbin_api::setup::setup_routes(state);

    // Start the server
    pixbin_api::setup::start_server(&config, app).await?;

    Ok(())
}
