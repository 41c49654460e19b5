#![deny(warnings)]

// Binary crate for gdrive-mcp - uses library crate

use anyhow::Context;
use clap::Parser;
use gdrive_mcp::config::{Credentials, GatewayConfig, SharingPolicy, DEFAULT_PORT};
use gdrive_mcp::server::McpServer;
use gdrive_mcp::transport;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gdrive-mcp")]
#[command(about = "Google Drive MCP gateway")]
#[command(
    long_about = "gdrive-mcp exposes Google Drive upload and listing as MCP tools over HTTP.\n\nUsage:\n  gdrive-mcp serve\n  gdrive-mcp serve --port 8080 --share-publicly false\n\nCredentials are read from CLIENT_ID, CLIENT_SECRET and REFRESH_TOKEN."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Host to bind to
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        /// OAuth client id
        #[arg(long, env = "CLIENT_ID", hide_env_values = true)]
        client_id: Option<String>,
        /// OAuth client secret
        #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
        /// OAuth refresh token
        #[arg(long, env = "REFRESH_TOKEN", hide_env_values = true)]
        refresh_token: Option<String>,
        /// Make every uploaded file readable by anyone with the link
        #[arg(long, env = "SHARE_PUBLICLY", default_value_t = true, action = clap::ArgAction::Set)]
        share_publicly: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gdrive_mcp=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            client_id,
            client_secret,
            refresh_token,
            share_publicly,
        } => {
            let config = GatewayConfig {
                host,
                port,
                credentials: Credentials::new(client_id, client_secret, refresh_token),
                sharing: SharingPolicy::from_flag(share_publicly),
            };

            let missing = config.credentials.missing();
            if !missing.is_empty() {
                tracing::warn!(?missing, "Drive credentials incomplete; tool calls will fail");
            }

            let server = Arc::new(
                McpServer::from_config(&config).context("building Drive client")?,
            );
            transport::serve(&config, server)
                .await
                .with_context(|| format!("serving on {}", config.bind_addr()))?;
        }
    }

    Ok(())
}
