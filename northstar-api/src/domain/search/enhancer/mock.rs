//! Mock enhancer implementation for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::search::types::Enhancement;

use super::{EnhancerError, QueryEnhancer};

/// Mock enhancer returning a fixed enhancement, or failing every call to
/// exercise the degradation path.
#[derive(Clone, Default)]
pub struct MockEnhancer {
    enhancement: Enhancement,
    fail: bool,
    call_count: Arc<AtomicUsize>,
}

impl MockEnhancer {
    pub fn returning(enhancement: Enhancement) -> Self {
        Self {
            enhancement,
            ..Default::default()
        }
    }

    /// A mock whose every call fails, as an unreachable service would.
    pub fn unavailable() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryEnhancer for MockEnhancer {
    async fn enhance(&self, _query: &str) -> Result<Enhancement, EnhancerError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EnhancerError::Service("connection refused".to_string()));
        }
        Ok(self.enhancement.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_configured_enhancement() {
        let enhancer = MockEnhancer::returning(Enhancement {
            keywords: vec!["ai".to_string()],
            ..Default::default()
        });

        let enhancement = enhancer.enhance("anything").await.unwrap();
        assert_eq!(enhancement.keywords, vec!["ai"]);
        assert_eq!(enhancer.call_count(), 1);
    }

    #[tokio::test]
    async fn unavailable_mock_always_fails() {
        let enhancer = MockEnhancer::unavailable();
        assert!(enhancer.enhance("anything").await.is_err());
    }
}
