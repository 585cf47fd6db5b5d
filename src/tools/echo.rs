use crate::{
    config::Config,
    errors::AppError,
    mcp::registry::{parse_args, Tool},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

fn one() -> i64 { 1 }

#[derive(Debug, Deserialize)]
struct EchoArgs {
    text: String,
    #[serde(default = "one")]
    repeat: i64,
    #[serde(default)]
    uppercase: bool,
}

pub struct EchoTool {
    max_repeat: i64,
    max_bytes: usize,
}

impl EchoTool {
    pub fn new(cfg: &Config) -> Self {
        Self { max_repeat: cfg.limits.max_echo_repeat, max_bytes: cfg.limits.max_echo_bytes }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &'static str { "echo" }
    fn description(&self) -> &'static str { "Echo text with optional repetition and casing." }
    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["text"],
            "properties": {
                "text": {"type": "string"},
                "repeat": {"type": "integer", "default": 1},
                "uppercase": {"type": "boolean", "default": false}
            }
        })
    }

    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        let args: EchoArgs = parse_args(params)?;
        if args.repeat > self.max_repeat {
            return Err(AppError::InvalidParams(format!("repeat must be at most {}", self.max_repeat)));
        }
        let times = usize::try_from(args.repeat).unwrap_or(0);
        // copies plus the single-space separators between them
        let out_len = args.text.len().saturating_mul(times).saturating_add(times.saturating_sub(1));
        if out_len > self.max_bytes {
            return Err(AppError::InvalidParams(format!("echo output must be at most {} bytes", self.max_bytes)));
        }
        let mut repeated = vec![args.text.as_str(); times].join(" ");
        if args.uppercase {
            repeated = repeated.to_uppercase();
        }
        Ok(json!({"text": args.text, "repeated": repeated, "count": args.repeat}))
    }
}
