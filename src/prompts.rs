use crate::{
    errors::{AppError, AppResult},
    mcp::{
        registry::parse_args,
        types::{Content, GetPromptResult, PromptArgument, PromptInfo, PromptMessage},
    },
};
use serde::Deserialize;

pub const GREETING: &str = "greeting";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Es,
    Fr,
}

impl Language {
    /// Unknown codes fall back to English.
    pub fn from_code(code: &str) -> Self {
        match code {
            "es" => Language::Es,
            "fr" => Language::Fr,
            _ => Language::En,
        }
    }

    pub fn greet(self, name: &str) -> String {
        match self {
            Language::En => format!("Hello, {name}! How can I help you today?"),
            Language::Es => format!("¡Hola, {name}! ¿Cómo puedo ayudarte hoy?"),
            Language::Fr => format!("Bonjour, {name}! Comment puis-je vous aider aujourd'hui?"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GreetingArgs {
    name: String,
    #[serde(default)]
    language: Option<String>,
}

pub fn list() -> Vec<PromptInfo> {
    vec![PromptInfo {
        name: GREETING,
        description: "Return a simple greeting prompt.",
        arguments: vec![
            PromptArgument { name: "name", description: "Who to greet", required: true },
            PromptArgument { name: "language", description: "en, es or fr (default en)", required: false },
        ],
    }]
}

pub fn get(name: &str, arguments: serde_json::Value) -> AppResult<GetPromptResult> {
    if name != GREETING {
        return Err(AppError::UnknownPrompt(name.to_string()));
    }
    let args: GreetingArgs = parse_args(arguments)?;
    let language = Language::from_code(args.language.as_deref().unwrap_or("en"));
    Ok(GetPromptResult {
        description: "Return a simple greeting prompt.",
        messages: vec![PromptMessage { role: "user", content: Content::Text { text: language.greet(&args.name) } }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(result: &GetPromptResult) -> &str {
        match &result.messages[0].content {
            Content::Text { text } => text,
        }
    }

    #[test]
    fn greets_in_each_language() {
        let en = get(GREETING, json!({"name": "Ada"})).unwrap();
        assert_eq!(text(&en), "Hello, Ada! How can I help you today?");
        let es = get(GREETING, json!({"name": "Ada", "language": "es"})).unwrap();
        assert_eq!(text(&es), "¡Hola, Ada! ¿Cómo puedo ayudarte hoy?");
        let fr = get(GREETING, json!({"name": "Ada", "language": "fr"})).unwrap();
        assert!(text(&fr).starts_with("Bonjour, Ada!"));
    }

    #[test]
    fn unknown_language_falls_back() {
        let de = get(GREETING, json!({"name": "Ada", "language": "de"})).unwrap();
        assert_eq!(text(&de), "Hello, Ada! How can I help you today?");
        assert_eq!(de.messages[0].role, "user");
    }

    #[test]
    fn missing_name_is_invalid() {
        assert!(matches!(get(GREETING, json!({})), Err(AppError::InvalidParams(_))));
        assert!(matches!(get("farewell", json!({})), Err(AppError::UnknownPrompt(_))));
    }
}
