use clap::Parser;
use data_sweeper::app;
use data_sweeper::config::ServerConfig;

/// Main entry point for the web application
///
/// Reads the server configuration from flags and `SWEEPER_*` environment
/// variables, then serves the converter until shut down.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    log::info!(
        "Starting data sweeper (max upload {} MB, preview {} rows)",
        config.max_upload_mb,
        config.preview_rows
    );
    app::run(config).await
}
