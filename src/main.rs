use std::process::ExitCode;

use tracing::{error, info};

use mediabox::{storage, Config, Database, WebServer};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = mediabox::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        mediabox::logging::init_console_only(&config.logging.level);
    }

    info!("mediabox - media library backend");

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> mediabox::Result<()> {
    config.validate()?;

    let db = Database::connect(&config.database.url, config.database.max_connections).await?;
    let store = storage::from_config(&config.storage)?;
    info!("Using {} blob store", store.backend_name());

    let server = WebServer::new(&config, db.clone(), store)?;
    info!("Server configured on {}", server.addr());

    let served = server.run().await;
    db.close().await;
    served?;
    Ok(())
}
