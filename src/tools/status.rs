use crate::{config::Config, errors::AppError, mcp::registry::Tool, security::DataRoot, tools::utc_timestamp};
use async_trait::async_trait;
use serde_json::json;

pub struct ServerStatusTool {
    name: String,
    version: String,
    data_root: String,
}

impl ServerStatusTool {
    pub fn new(cfg: &Config, root: &DataRoot) -> Self {
        Self {
            name: cfg.server.name.clone(),
            version: cfg.server.version.clone(),
            data_root: root.path().display().to_string(),
        }
    }
}

#[async_trait]
impl Tool for ServerStatusTool {
    fn name(&self) -> &'static str { "server_status" }
    fn description(&self) -> &'static str { "Return basic server metadata for quick diagnostics." }
    fn input_schema(&self) -> serde_json::Value { json!({"type": "object", "properties": {}}) }

    async fn call(&self, _params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        Ok(json!({
            "name": self.name,
            "version": self.version,
            "data_root": self.data_root,
            "time": utc_timestamp(),
        }))
    }
}
