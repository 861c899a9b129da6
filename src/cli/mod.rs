pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "bankhaus-api")]
#[command(about = "Bankhaus API - authenticated ledger service for family bank accounts")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Log output format: pretty or json")]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Verify a bearer token and print its claims")]
    Verify {
        #[arg(help = "Encoded JWT")]
        token: String,
    },
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(config, port).await,
        Commands::Verify { token } => commands::verify::handle(&config, &token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["bankhaus-api"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["bankhaus-api", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(9000) })));

        let cli = Cli::try_parse_from(["bankhaus-api", "--log-format", "json", "verify", "a.b.c"]).unwrap();
        assert_eq!(cli.log_format.as_deref(), Some("json"));
        assert!(matches!(cli.command, Some(Commands::Verify { ref token }) if token == "a.b.c"));
    }
}
