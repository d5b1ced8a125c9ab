// src/main.rs
//! Mini-program auth server entry point
use anyhow::Result;
use clap::{Parser, Subcommand};
use miniapp_auth::api::server::AuthServer;
use miniapp_auth::auth::core::TokenService;
use miniapp_auth::auth::{AuthConfig, AuthService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "auth_server")]
#[command(about = "WeChat mini-program login and token gate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// TOML config file; environment variables override its values
    #[arg(long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the server to (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Verify a token with the configured key and print its principal
    VerifyToken {
        token: String,
    },
    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging()?;

    info!("Starting auth server v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_ref())?;

    match args.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            let service = Arc::new(AuthService::from_config(config).await?);
            let mut server = AuthServer::new(service);
            if let Some(port) = port {
                server.port = port;
            }
            server.start().await?;
        }
        Commands::VerifyToken { token } => {
            let tokens = TokenService::new(config.token.key.clone(), config.token.validity_secs)?;
            let principal = tokens.verify(token.trim())?;
            println!("{}", serde_json::to_string_pretty(&principal)?);
        }
        Commands::CheckConfig => {
            config.validate()?;
            println!("{:#?}", config);
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<AuthConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            AuthConfig::from_file(path)?
        }
        None => AuthConfig::from_env(),
    };
    Ok(config)
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=info,sqlx=warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
