//! Query enhancer backed by an OpenAI-compatible chat completion endpoint.

use async_trait::async_trait;
use openai_client::{ChatClient, ChatMessage, ChatRequest};

use crate::domain::search::types::Enhancement;

use super::{EnhancerError, QueryEnhancer};

const ENHANCE_SYSTEM_PROMPT: &str = "You are a helpful assistant that enhances search queries \
for an AI-focused business directory in Minnesota. Extract key intents, services, and business \
types from the user's query. Output a JSON object with: keywords (array), businessTypes (array), \
services (array), and intent (string).";

#[derive(Clone)]
pub struct OpenAiEnhancer {
    client: ChatClient,
    model: String,
}

impl OpenAiEnhancer {
    pub fn new(client: ChatClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl QueryEnhancer for OpenAiEnhancer {
    async fn enhance(&self, query: &str) -> Result<Enhancement, EnhancerError> {
        let request = ChatRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(ENHANCE_SYSTEM_PROMPT),
                ChatMessage::user(query),
            ],
        )
        .as_json();

        let content = self
            .client
            .complete(&request)
            .await
            .map_err(|e| EnhancerError::Service(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| EnhancerError::Payload(e.to_string()))
    }
}
