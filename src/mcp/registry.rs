use crate::{config::Config, errors::AppError, mcp::types::ToolInfo, security::DataRoot};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynTool = Arc<dyn Tool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<DynTool>,
}

impl ToolRegistry {
    pub fn new(cfg: &Config, root: &DataRoot) -> Self {
        use crate::tools::{calculator::CalculatorTool, echo::EchoTool, status::ServerStatusTool};
        let mut tools: Vec<DynTool> = vec![
            Arc::new(CalculatorTool),
            Arc::new(EchoTool::new(cfg)),
            Arc::new(ServerStatusTool::new(cfg, root)),
        ];
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<DynTool> { self.tools.iter().find(|t| t.name() == name).cloned() }
    pub fn list_names(&self) -> Vec<&'static str> { self.tools.iter().map(|t| t.name()).collect() }

    pub fn describe(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo { name: t.name(), description: t.description(), input_schema: t.input_schema() })
            .collect()
    }
}

/// A stateless callable exposed through `tools/call`. Errors are reported to
/// the caller inside the tool result, never raised as protocol faults.
#[async_trait]
pub trait Tool {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> serde_json::Value;
    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError>;
}

/// Deserializes tool arguments, treating a missing argument object as `{}`.
pub fn parse_args<T: serde::de::DeserializeOwned>(params: serde_json::Value) -> Result<T, AppError> {
    let params = if params.is_null() { serde_json::json!({}) } else { params };
    serde_json::from_value(params).map_err(|e| AppError::InvalidParams(e.to_string()))
}
