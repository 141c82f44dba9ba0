//! AI query enhancement implementations.

#[cfg(test)]
mod mock;
mod openai;

#[cfg(test)]
pub use mock::MockEnhancer;
pub use openai::OpenAiEnhancer;

use async_trait::async_trait;

use super::types::Enhancement;

/// The enhancement call failed; callers degrade to raw-text search.
#[derive(Debug, thiserror::Error)]
pub enum EnhancerError {
    #[error("Enhancement service error: {0}")]
    Service(String),
    #[error("Malformed enhancement payload: {0}")]
    Payload(String),
}

/// Turns free text into structured keyword/category hints.
///
/// Best-effort contract: a single attempt, no retries. The search pipeline
/// must never treat an implementation as a hard dependency.
#[async_trait]
pub trait QueryEnhancer: Send + Sync {
    async fn enhance(&self, query: &str) -> Result<Enhancement, EnhancerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn QueryEnhancer) {}
}
