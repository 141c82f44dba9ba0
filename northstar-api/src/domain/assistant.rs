//! Directory chat: prompt assembly and suggestion extraction.
//!
//! The completion call itself lives at the HTTP layer; everything here is
//! pure and unit-testable.

use serde::{Deserialize, Serialize};

pub const CHAT_SYSTEM_PROMPT: &str = "You are an AI assistant for the Minnesota Business \
Directory, a platform focused on AI-powered businesses and services in Minnesota. You help \
users find businesses, events, and information about the local AI ecosystem. Be helpful, \
concise, and friendly. When suggesting businesses or events, provide specific recommendations \
with relevant details.";

/// Returned verbatim whenever the completion call fails; chat never
/// surfaces a server error to the user.
pub const CHAT_FALLBACK_MESSAGE: &str = "I apologize, but I encountered an error processing \
your request. Please try again.";

/// Business-type vocabulary scanned for in replies when picking follow-up
/// suggestions.
const SUGGESTION_TERMS: &[&str] = &[
    "consultant",
    "agency",
    "software",
    "AI",
    "technology",
    "marketing",
    "data",
];

/// Chat roles accepted from the client; the system prompt is always ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatTurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatTurnRole,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatContext {
    pub business_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub context: ChatContext,
}

/// Business facts folded into the system prompt when the client is asking
/// about a specific listing.
#[derive(Debug, Clone)]
pub struct BusinessContext {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSuggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: SuggestedBusiness,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedBusiness {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub category: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    pub suggestions: Vec<ChatSuggestion>,
}

impl ChatReply {
    pub fn fallback() -> Self {
        Self {
            message: CHAT_FALLBACK_MESSAGE.to_string(),
            suggestions: vec![],
        }
    }
}

pub fn build_system_prompt(business: Option<&BusinessContext>) -> String {
    let mut prompt = CHAT_SYSTEM_PROMPT.to_string();

    if let Some(business) = business {
        prompt.push_str("\n\nYou are specifically helping with questions about ");
        prompt.push_str(&business.name);
        if let Some(category) = &business.category {
            prompt.push_str(&format!(", a {category} business"));
        }
        prompt.push('.');
        if let Some(description) = &business.description {
            prompt.push_str(&format!(" Here's what you know about them: {description}"));
        }
    }

    prompt
}

/// Does the reply sound like it is recommending something?
pub fn mentions_recommendation(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    lower.contains("recommend") || lower.contains("suggest") || lower.contains("check out")
}

/// Business-type terms present in the reply, deduplicated, in vocabulary
/// order.
pub fn extract_search_terms(reply: &str) -> Vec<String> {
    let lower = reply.to_lowercase();
    SUGGESTION_TERMS
        .iter()
        .filter(|term| lower.contains(&term.to_lowercase()))
        .map(|term| term.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_prompt_without_business_context() {
        let prompt = build_system_prompt(None);
        assert!(prompt.starts_with("You are an AI assistant"));
        assert!(!prompt.contains("specifically helping"));
    }

    #[test]
    fn business_context_enriches_the_prompt() {
        let prompt = build_system_prompt(Some(&BusinessContext {
            name: "Mill City Consulting".to_string(),
            category: Some("Consulting".to_string()),
            description: Some("AI adoption strategy".to_string()),
        }));

        assert!(prompt.contains("Mill City Consulting, a Consulting business."));
        assert!(prompt.contains("Here's what you know about them: AI adoption strategy"));
    }

    #[test]
    fn recommendation_phrasing_is_detected() {
        assert!(mentions_recommendation("I'd recommend visiting these"));
        assert!(mentions_recommendation("You should check out Mill City"));
        assert!(!mentions_recommendation("The weather is nice today"));
    }

    #[test]
    fn terms_are_extracted_case_insensitively_without_duplicates() {
        let terms =
            extract_search_terms("Try an AI consultant or a data consultant for your data needs");
        assert_eq!(terms, vec!["consultant", "AI", "data"]);
    }

    #[test]
    fn no_vocabulary_hits_yield_empty() {
        assert!(extract_search_terms("Lovely lakes up north").is_empty());
    }
}
