//! JSON-RPC method dispatch shared by the streamable and SSE transports.

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    mcp::{
        registry::{parse_args, ToolRegistry},
        types::{
            CallToolParams, CallToolResult, Content, GetPromptParams, Implementation, Incoming, InitializeResult,
            Outgoing, ReadResourceParams, RequestId, LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
        },
    },
    prompts, resources,
    security::DataRoot,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

pub struct McpHandler {
    info: Implementation,
    instructions: String,
    tools: ToolRegistry,
    root: DataRoot,
}

impl McpHandler {
    pub fn new(cfg: &Config, root: DataRoot) -> Self {
        Self {
            info: Implementation { name: cfg.server.name.clone(), version: cfg.server.version.clone() },
            instructions: cfg.server.instructions.clone(),
            tools: ToolRegistry::new(cfg, &root),
            root,
        }
    }

    pub fn info(&self) -> &Implementation { &self.info }
    pub fn tools(&self) -> &ToolRegistry { &self.tools }
    pub fn root(&self) -> &DataRoot { &self.root }

    /// Handles one raw message body. `None` means nothing is sent back
    /// (notifications and client responses).
    pub async fn handle_bytes(&self, body: &[u8]) -> Option<Outgoing> {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => Some(Outgoing::error(None, &AppError::Parse(e.to_string()))),
        }
    }

    pub async fn handle_value(&self, value: Value) -> Option<Outgoing> {
        let Some(obj) = value.as_object() else {
            return Some(Outgoing::error(None, &AppError::InvalidRequest("expected a JSON object".into())));
        };
        if !obj.contains_key("method") && (obj.contains_key("result") || obj.contains_key("error")) {
            debug!("ignoring client response");
            return None;
        }
        let id = obj.get("id").and_then(|v| serde_json::from_value::<RequestId>(v.clone()).ok());
        let msg: Incoming = match serde_json::from_value(value) {
            Ok(msg) => msg,
            Err(e) => return Some(Outgoing::error(id, &AppError::InvalidRequest(e.to_string()))),
        };
        if msg.jsonrpc != "2.0" {
            return Some(Outgoing::error(msg.id, &AppError::InvalidRequest("jsonrpc must be \"2.0\"".into())));
        }
        let Some(id) = msg.id else {
            debug!(method = %msg.method, "notification");
            return None;
        };
        let request_id = Uuid::new_v4();
        let span = info_span!("request", %request_id, method = %msg.method);
        let outgoing = match self.dispatch(request_id, &msg.method, msg.params).instrument(span).await {
            Ok(result) => Outgoing::result(id, result),
            Err(err) => {
                debug!(method = %msg.method, code = err.code(), error = %err, "request failed");
                Outgoing::error(Some(id), &err)
            }
        };
        Some(outgoing)
    }

    async fn dispatch(&self, request_id: Uuid, method: &str, params: Option<Value>) -> AppResult<Value> {
        let params = params.unwrap_or(Value::Null);
        match method {
            "initialize" => self.initialize(params),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({"tools": self.tools.describe()})),
            "tools/call" => self.call_tool(Audit::start(request_id, "tools/call"), params).await,
            "resources/list" => Ok(json!({"resources": []})),
            "resources/templates/list" => Ok(json!({"resourceTemplates": resources::templates()})),
            "resources/read" => self.read_resource(Audit::start(request_id, "resources/read"), params),
            "prompts/list" => Ok(json!({"prompts": prompts::list()})),
            "prompts/get" => {
                let p: GetPromptParams = parse_args(params)?;
                to_json(&prompts::get(&p.name, p.arguments.unwrap_or(Value::Null))?)
            }
            other => Err(AppError::MethodNotFound(other.to_string())),
        }
    }

    fn initialize(&self, params: Value) -> AppResult<Value> {
        let requested = params.get("protocolVersion").and_then(|v| v.as_str());
        let protocol_version = match requested {
            Some(v) if SUPPORTED_PROTOCOL_VERSIONS.contains(&v) => v,
            _ => LATEST_PROTOCOL_VERSION,
        };
        info!(requested = ?requested, negotiated = protocol_version, "initialize");
        to_json(&InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: json!({
                "tools": {"listChanged": false},
                "resources": {"subscribe": false, "listChanged": false},
                "prompts": {"listChanged": false}
            }),
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        })
    }

    async fn call_tool(&self, audit: Audit, params: Value) -> AppResult<Value> {
        let p: CallToolParams = parse_args(params)?;
        let Some(tool) = self.tools.get(&p.name) else {
            audit.record(&p.name, "deny", "UnknownTool");
            return Err(AppError::UnknownTool(p.name));
        };
        let result = match tool.call(p.arguments.unwrap_or(Value::Null)).await {
            Ok(value) => {
                audit.record(&p.name, "allow", "OK");
                CallToolResult {
                    content: vec![Content::Text { text: value.to_string() }],
                    structured_content: value,
                    is_error: false,
                }
            }
            Err(err) => {
                audit.record(&p.name, "error", err.code());
                let message = err.to_string();
                CallToolResult {
                    content: vec![Content::Text { text: message.clone() }],
                    structured_content: json!({"error": message, "result": null}),
                    is_error: true,
                }
            }
        };
        to_json(&result)
    }

    fn read_resource(&self, audit: Audit, params: Value) -> AppResult<Value> {
        let p: ReadResourceParams = parse_args(params)?;
        let (contents, outcome) = resources::read(&self.root, &p.uri).inspect_err(|err| {
            audit.record(&p.uri, "deny", err.code());
        })?;
        match &outcome {
            Ok(()) => audit.record(&p.uri, "allow", "OK"),
            Err(AppError::PathOutsideRoot) => audit.record(&p.uri, "deny", "PathOutsideRoot"),
            Err(err) => audit.record(&p.uri, "error", err.code()),
        }
        Ok(json!({"contents": [contents]}))
    }
}

fn to_json<T: Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

/// One audited request: the id and start time shared by its audit line.
struct Audit {
    request_id: Uuid,
    method: &'static str,
    started: Instant,
}

impl Audit {
    fn start(request_id: Uuid, method: &'static str) -> Self {
        Self { request_id, method, started: Instant::now() }
    }

    fn record(&self, target: &str, decision: &str, code: &str) {
        info!(
            request_id = %self.request_id,
            method = self.method,
            target = target,
            decision = decision,
            code = code,
            duration_ms = self.started.elapsed().as_millis() as u64,
            "audit"
        );
    }
}
