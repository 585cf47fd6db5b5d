use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::mcp::types::error_codes;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Access denied: path must be inside data root.")]
    PathOutsideRoot,
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Unable to read file: {0}")]
    FileUnreadable(String),
    #[error("Unknown operation: {0}")]
    UnsupportedOperation(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("unknown prompt: {0}")]
    UnknownPrompt(String),
    #[error("unknown resource: {0}")]
    UnknownResource(String),
    #[error("method not found: {0}")]
    MethodNotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("session not found")]
    SessionNotFound,
    #[error("session stream is full, retry later")]
    SessionBusy,
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::PathOutsideRoot => "PathOutsideRoot",
            AppError::FileNotFound(_) => "FileNotFound",
            AppError::FileUnreadable(_) => "FileUnreadable",
            AppError::UnsupportedOperation(_) => "UnsupportedOperation",
            AppError::DivisionByZero => "DivisionByZero",
            AppError::InvalidParams(_) => "InvalidParams",
            AppError::UnknownTool(_) => "UnknownTool",
            AppError::UnknownPrompt(_) => "UnknownPrompt",
            AppError::UnknownResource(_) => "UnknownResource",
            AppError::MethodNotFound(_) => "MethodNotFound",
            AppError::InvalidRequest(_) => "InvalidRequest",
            AppError::Parse(_) => "ParseError",
            AppError::SessionNotFound => "SessionNotFound",
            AppError::SessionBusy => "SessionBusy",
            AppError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::PathOutsideRoot => StatusCode::FORBIDDEN,
            AppError::FileNotFound(_)
            | AppError::UnknownTool(_)
            | AppError::UnknownPrompt(_)
            | AppError::UnknownResource(_)
            | AppError::MethodNotFound(_)
            | AppError::SessionNotFound => StatusCode::NOT_FOUND,
            AppError::UnsupportedOperation(_)
            | AppError::DivisionByZero
            | AppError::InvalidParams(_)
            | AppError::InvalidRequest(_)
            | AppError::Parse(_) => StatusCode::BAD_REQUEST,
            AppError::SessionBusy => StatusCode::SERVICE_UNAVAILABLE,
            AppError::FileUnreadable(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON-RPC error code used when this error terminates a request instead of
    /// being reported inside a tool or resource payload.
    pub fn rpc_code(&self) -> i32 {
        match self {
            AppError::Parse(_) => error_codes::PARSE_ERROR,
            AppError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            AppError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            AppError::UnknownResource(_) => error_codes::RESOURCE_NOT_FOUND,
            AppError::InvalidParams(_)
            | AppError::UnknownTool(_)
            | AppError::UnknownPrompt(_)
            | AppError::UnsupportedOperation(_)
            | AppError::DivisionByZero => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody { code: self.code(), message: self.to_string() };
        (self.status(), Json(body)).into_response()
    }
}
