use clap::Parser;

use bankhaus_api::cli::{self, Cli};
use bankhaus_api::config::AppConfig;
use bankhaus_api::logging::{init_logging, LogFormat};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_PUBLIC_KEY, etc.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let format = cli
        .log_format
        .as_deref()
        .map(LogFormat::from_str_lossy)
        .unwrap_or(config.logging.format);
    init_logging(&config.logging.level, format);

    if let Err(e) = cli::run(cli, config).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
