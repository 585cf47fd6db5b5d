use crate::{
    errors::{AppError, AppResult},
    mcp::registry::{parse_args, Tool},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Operation::Add),
            "subtract" => Ok(Operation::Subtract),
            "multiply" => Ok(Operation::Multiply),
            "divide" => Ok(Operation::Divide),
            other => Err(AppError::UnsupportedOperation(other.to_string())),
        }
    }
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }

    pub fn apply(self, a: f64, b: f64) -> AppResult<f64> {
        match self {
            Operation::Add => Ok(a + b),
            Operation::Subtract => Ok(a - b),
            Operation::Multiply => Ok(a * b),
            Operation::Divide if b == 0.0 => Err(AppError::DivisionByZero),
            Operation::Divide => Ok(a / b),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CalculatorArgs {
    operation: String,
    a: f64,
    b: f64,
}

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &'static str { "calculator" }
    fn description(&self) -> &'static str { "Perform arithmetic on two numbers." }
    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["operation", "a", "b"],
            "properties": {
                "operation": {"type": "string", "enum": ["add", "subtract", "multiply", "divide"]},
                "a": {"type": "number"},
                "b": {"type": "number"}
            }
        })
    }

    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        let args: CalculatorArgs = parse_args(params)?;
        let op: Operation = args.operation.parse()?;
        let result = op.apply(args.a, args.b)?;
        Ok(json!({"result": result, "operation": op.as_str(), "a": args.a, "b": args.b}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn basic_operations() {
        let cases = [("add", 6.0), ("subtract", 2.0), ("multiply", 8.0), ("divide", 2.0)];
        for (op, expected) in cases {
            let out = CalculatorTool.call(json!({"operation": op, "a": 4, "b": 2})).await.unwrap();
            assert_eq!(out["result"], json!(expected), "{op}");
            assert_eq!(out["operation"], op);
        }
    }

    #[tokio::test]
    async fn divide_by_zero_is_reported() {
        let err = CalculatorTool.call(json!({"operation": "divide", "a": 10, "b": 0})).await.unwrap_err();
        assert!(matches!(err, AppError::DivisionByZero));
    }

    #[tokio::test]
    async fn unknown_operation() {
        let err = CalculatorTool.call(json!({"operation": "modulo", "a": 1, "b": 2})).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown operation: modulo");
    }

    #[tokio::test]
    async fn missing_operand() {
        let err = CalculatorTool.call(json!({"operation": "add", "a": 1})).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidParams(_)));
    }
}
