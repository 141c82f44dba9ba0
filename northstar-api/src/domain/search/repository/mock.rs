//! Mock candidate repository for testing.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::event::EventWithCount;
use crate::repositories::RepositoryError;

use super::super::types::{BusinessCandidate, CandidateFilter, EventFilter};
use super::CandidateRepository;

/// In-memory candidate repository applying the same coarse predicates the
/// Postgres implementation pushes into SQL.
#[derive(Clone, Default)]
pub struct MockCandidateRepository {
    businesses: Arc<RwLock<Vec<BusinessCandidate>>>,
    events: Arc<RwLock<Vec<EventWithCount>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockCandidateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_businesses(self, candidates: Vec<BusinessCandidate>) -> Self {
        *self.businesses.write().unwrap() = candidates;
        self
    }

    pub fn with_events(self, events: Vec<EventWithCount>) -> Self {
        *self.events.write().unwrap() = events;
        self
    }

    /// Make every fetch fail, as a lost database connection would.
    pub fn failing(self) -> Self {
        *self.fail.write().unwrap() = true;
        self
    }

    fn check_failure(&self) -> Result<(), RepositoryError> {
        if *self.fail.read().unwrap() {
            return Err(RepositoryError::DatabaseError(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl CandidateRepository for MockCandidateRepository {
    async fn fetch_businesses(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<BusinessCandidate>, RepositoryError> {
        self.check_failure()?;
        let businesses = self.businesses.read().unwrap();
        let mut matching: Vec<BusinessCandidate> = businesses
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        if let Some(limit) = filter.fetch_limit {
            matching.truncate(limit as usize);
        }
        Ok(matching)
    }

    async fn fetch_business(
        &self,
        id: i32,
    ) -> Result<Option<BusinessCandidate>, RepositoryError> {
        self.check_failure()?;
        let businesses = self.businesses.read().unwrap();
        Ok(businesses.iter().find(|c| c.id == id).cloned())
    }

    async fn fetch_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<EventWithCount>, RepositoryError> {
        self.check_failure()?;
        let events = self.events.read().unwrap();
        Ok(events.iter().filter(|e| filter.matches(e)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::business::BusinessStatus;
    use crate::domain::search::testing::candidate;

    #[tokio::test]
    async fn applies_filter_and_limit() {
        let mut inactive = candidate(2, "Closed Shop");
        inactive.status = BusinessStatus::Inactive;

        let repo = MockCandidateRepository::new().with_businesses(vec![
            candidate(1, "Open Shop"),
            inactive,
            candidate(3, "Another Shop"),
        ]);

        let filter = CandidateFilter {
            status: Some(BusinessStatus::Active),
            fetch_limit: Some(1),
            ..Default::default()
        };
        let result = repo.fetch_businesses(&filter).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 1);
    }

    #[tokio::test]
    async fn failing_repo_surfaces_database_error() {
        let repo = MockCandidateRepository::new().failing();
        let err = repo
            .fetch_businesses(&CandidateFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseError(_)));
    }
}
