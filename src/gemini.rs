//! Wire types shared by the Gemini embedding and generation clients

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

impl GeminiContent {
    pub fn text(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![GeminiPart {
                text: Some(text.to_string()),
            }],
        }
    }

    pub fn user_text(text: &str) -> Self {
        Self {
            role: Some("user".to_string()),
            ..Self::text(text)
        }
    }

    /// Concatenated text of every text part
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
}

/// Full resource name for a model (`gemini-embedding-001` -> `models/gemini-embedding-001`)
pub fn model_resource(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
