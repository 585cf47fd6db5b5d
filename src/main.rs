mod config;
mod errors;
mod logging;
mod mcp;
mod prompts;
mod resources;
mod security;
mod server;
mod sessions;
mod tools;

#[cfg(test)]
mod tests;

use crate::config::Config;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "hosted-mcp", version, about = "Demo MCP server with tools, a prompt and confined file reads")]
struct Cli {
    /// TOML or JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory file reads are confined to
    #[arg(long)]
    data_root: Option<PathBuf>,
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load(cli.config.as_deref()).context("loading config")?;
    cfg.apply_env(|k| std::env::var(k).ok()).context("reading environment")?;
    if let Some(dir) = cli.data_root { cfg.data.root_dir = dir; }
    if let Some(host) = cli.host { cfg.server.bind_addr = host; }
    if let Some(port) = cli.port { cfg.server.port = port; }
    cfg.validate().context("validating config")?;

    logging::init(cfg.logging.format);

    let root = security::DataRoot::prepare(&cfg.data.root_dir).context("preparing data root")?;
    let handler = mcp::handler::McpHandler::new(&cfg, root);

    info!(
        name = %cfg.server.name,
        version = %cfg.server.version,
        addr = %format!("{}:{}", cfg.server.bind_addr, cfg.server.port),
        base_path = %cfg.server.base_path,
        sse_path = %cfg.transport.sse_path,
        data_root = %handler.root().path().display(),
        tools = ?handler.tools().list_names(),
        "hosted-mcp ready"
    );

    server::serve(server::AppState::new(cfg, handler)).await
}
