use serde::Serialize;

use super::ChatMessage;

/// Request body for the `/chat/completions` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            response_format: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Ask the model to return a single JSON object as the message content.
    pub fn as_json(mut self) -> Self {
        self.response_format = Some(ResponseFormat {
            kind: ResponseFormatKind::JsonObject,
        });
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: ResponseFormatKind,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormatKind {
    Text,
    JsonObject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_mode_serializes_response_format() {
        let request = ChatRequest::new("gpt-4-turbo-preview", vec![ChatMessage::user("hi")])
            .as_json()
            .with_temperature(0.7);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["temperature"], 0.7);
        assert!(json.get("max_tokens").is_none());
    }
}
