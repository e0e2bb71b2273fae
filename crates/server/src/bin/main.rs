//! Binary entry point for the notion-mcp server.

use clap::Parser;
use notion_mcp::NotionMcpServer;
use notion_mcp::config::Config;
use rmcp::ServiceExt;

/// Notion MCP Server, providing page, database, and script-file tools.
#[derive(Parser)]
#[command(name = "notion-mcp", version, about)]
struct Cli {
    /// Directory where generated script files are stored.
    #[arg(long, value_name = "DIR", default_value = "scripts")]
    scripts_dir: std::path::PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    tracing::info!(scripts_dir = %cli.scripts_dir.display(), "starting notion-mcp server");
    let server = NotionMcpServer::new(&config, cli.scripts_dir);
    let transport = rmcp::transport::stdio();
    server
        .serve(transport)
        .await
        .expect("failed to start server")
        .waiting()
        .await
        .expect("server error");
}
