use serde::Deserialize;

/// Response body of a non-streaming `/chat/completions` call.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl ChatCompletion {
    /// Content of the first choice, if the model produced any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: AssistantMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "gpt-4-turbo-preview",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": "{\"keywords\": [\"ai\"]}"},
                "finish_reason": "stop"
            }
        ],
        "usage": {"prompt_tokens": 50, "completion_tokens": 12, "total_tokens": 62}
    }"#;

    #[test]
    fn deserializes_completion() {
        let completion: ChatCompletion = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(completion.id, "chatcmpl-123");
        assert_eq!(completion.first_content(), Some("{\"keywords\": [\"ai\"]}"));
        assert_eq!(completion.usage.unwrap().total_tokens, 62);
    }

    #[test]
    fn first_content_empty_choices() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"id": "x", "model": "m", "choices": []}"#,
        )
        .unwrap();
        assert!(completion.first_content().is_none());
    }
}
