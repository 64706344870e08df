mod admin_cmd;
mod serve;
mod status_cmd;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};

use menuscan_config::ServiceConfig;

#[derive(Parser)]
#[command(name = "menuscan")]
#[command(about = "Menu photo extraction service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask a running server for its health
    Status {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Give an existing user the admin role
    PromoteAdmin {
        /// Email the user registered with
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(Path::new(".env"))?;

    match cli.command {
        Commands::Serve { port } => {
            let config = ServiceConfig {
                port: port.unwrap_or(config.port),
                ..config
            };
            serve::run(config).await?;
        }
        Commands::Status { port } => {
            status_cmd::run(port.unwrap_or(config.port)).await?;
        }
        Commands::PromoteAdmin { email } => {
            admin_cmd::run(&config, &email).await?;
        }
    }

    Ok(())
}

/// Read settings after loading `env_file` when it exists. Variables already
/// in the process environment win over the file.
fn load_config(env_file: &Path) -> Result<ServiceConfig> {
    if env_file.exists() {
        dotenv::from_path(env_file)?;
    }
    Ok(ServiceConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_file_feeds_config() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "MENUSCAN_DB=from-env-file.db\n").unwrap();

        let config = load_config(&env_file).unwrap();
        assert_eq!(config.db_path, Path::new("from-env-file.db"));
    }

    #[test]
    fn missing_env_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join(".env")).is_ok());
    }

    #[test]
    fn parses_serve_port_override() {
        let cli = Cli::try_parse_from(["menuscan", "serve", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080) }));
    }

    #[test]
    fn promote_admin_requires_an_email() {
        assert!(Cli::try_parse_from(["menuscan", "promote-admin"]).is_err());
        let cli = Cli::try_parse_from(["menuscan", "promote-admin", "a@b.co"]).unwrap();
        match cli.command {
            Commands::PromoteAdmin { email } => assert_eq!(email, "a@b.co"),
            _ => panic!("expected promote-admin"),
        }
    }
}
