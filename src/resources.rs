use crate::{
    errors::{AppError, AppResult},
    mcp::types::{ResourceContents, ResourceTemplate},
    security::DataRoot,
};
use serde_json::json;

pub const FILE_SCHEME: &str = "file://";

pub fn templates() -> Vec<ResourceTemplate> {
    vec![ResourceTemplate {
        uri_template: "file://{relative_path}",
        name: "read_local_file",
        description: "Read a file within the data directory.",
        mime_type: "application/json",
    }]
}

/// Extracts the untrusted relative path from a `file://` URI.
pub fn relative_path(uri: &str) -> AppResult<&str> {
    uri.strip_prefix(FILE_SCHEME).ok_or_else(|| AppError::UnknownResource(uri.to_string()))
}

/// Reads a `file://` resource. Guard decisions are part of the payload, so a
/// denied or missing file still produces contents for the caller.
pub fn read(root: &DataRoot, uri: &str) -> AppResult<(ResourceContents, AppResult<()>)> {
    let relative = relative_path(uri)?;
    let (payload, outcome) = match root.read(relative) {
        Ok(file) => (serde_json::to_value(&file).map_err(|e| AppError::Internal(e.to_string()))?, Ok(())),
        Err(err) => (json!({"error": err.to_string()}), Err(err)),
    };
    let contents = ResourceContents {
        uri: uri.to_string(),
        mime_type: "application/json",
        text: payload.to_string(),
    };
    Ok((contents, outcome))
}
