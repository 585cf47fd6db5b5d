use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_INSTRUCTIONS: &str = "Provide safe utility tools for arithmetic, echoing text, simple status \
checks, and access to demo files. Never read outside the configured data directory.";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub data: Data,
    pub transport: Transport,
    pub limits: Limits,
    pub logging: Logging,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Server {
    pub name: String,
    pub version: String,
    pub bind_addr: String,
    pub port: u16,
    pub base_path: String,
    pub instructions: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            name: "Render Hosted MCP".to_string(),
            version: "1.0.0".to_string(),
            bind_addr: "0.0.0.0".to_string(),
            port: 8000,
            base_path: "/mcp".to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Data { pub root_dir: PathBuf }

impl Default for Data {
    fn default() -> Self { Self { root_dir: PathBuf::from("./data") } }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Transport {
    pub sse_path: String,
    pub message_path: String,
}

impl Default for Transport {
    fn default() -> Self { Self { sse_path: "/sse".to_string(), message_path: "/message".to_string() } }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Limits {
    pub max_request_kb: usize,
    pub max_echo_repeat: i64,
    pub max_echo_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self { Self { max_request_kb: 64, max_echo_repeat: 1000, max_echo_bytes: 1024 * 1024 } }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Logging { pub format: LogFormat }

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => anyhow::bail!("unknown log format: {other}"),
        }
    }
}

impl Config {
    /// Reads the config file when one is given; otherwise starts from defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else { return Ok(Self::default()) };
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    /// Applies the deployment environment on top of the file values. `lookup` is
    /// `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MCP_SERVER_NAME") { self.server.name = v; }
        if let Some(v) = lookup("MCP_SERVER_VERSION") { self.server.version = v; }
        if let Some(v) = lookup("MCP_DATA_ROOT") { self.data.root_dir = PathBuf::from(v); }
        if let Some(v) = lookup("HOST") { self.server.bind_addr = v; }
        if let Some(v) = lookup("PORT") {
            self.server.port = v.trim().parse().map_err(|_| anyhow::anyhow!("PORT is not a valid port: {v}"))?;
        }
        if let Some(v) = lookup("FASTMCP_MESSAGE_PATH") { self.transport.message_path = v; }
        if let Some(v) = lookup("FASTMCP_SSE_PATH") { self.transport.sse_path = v; }
        if let Some(v) = lookup("MCP_LOG_FORMAT") { self.logging.format = v.parse()?; }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.name.trim().is_empty() { anyhow::bail!("server name must not be empty"); }
        if self.server.version.trim().is_empty() { anyhow::bail!("server version must not be empty"); }
        if self.data.root_dir.as_os_str().is_empty() { anyhow::bail!("root_dir must not be empty"); }
        if self.limits.max_request_kb == 0 { anyhow::bail!("max_request_kb must be > 0"); }
        if self.limits.max_echo_repeat <= 0 { anyhow::bail!("max_echo_repeat must be > 0"); }
        if self.limits.max_echo_bytes == 0 { anyhow::bail!("max_echo_bytes must be > 0"); }
        for (label, path) in [
            ("base_path", &self.server.base_path),
            ("sse_path", &self.transport.sse_path),
            ("message_path", &self.transport.message_path),
        ] {
            if !path.starts_with('/') { anyhow::bail!("{label} must start with '/': {path}"); }
            if path == "/health" { anyhow::bail!("{label} collides with the health endpoint"); }
        }
        let routes = [&self.server.base_path, &self.transport.sse_path, &self.transport.message_path];
        if routes[0] == routes[1] || routes[0] == routes[2] || routes[1] == routes[2] {
            anyhow::bail!("base_path, sse_path and message_path must be distinct");
        }
        Ok(())
    }
}
