//! Candidate repository implementations.

#[cfg(test)]
mod mock;
mod postgres;

#[cfg(test)]
pub use mock::MockCandidateRepository;
pub use postgres::PgCandidateRepository;

use async_trait::async_trait;

use crate::domain::event::EventWithCount;
use crate::repositories::RepositoryError;

use super::types::{BusinessCandidate, CandidateFilter, EventFilter};

/// Storage contract the search pipeline consumes: a coarse pre-filter
/// bounding the candidate superset, with location, category, and
/// review-aggregate data attached. Never scores.
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn fetch_businesses(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<BusinessCandidate>, RepositoryError>;

    /// Single candidate by id, with the same denormalized fields.
    async fn fetch_business(
        &self,
        id: i32,
    ) -> Result<Option<BusinessCandidate>, RepositoryError>;

    async fn fetch_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<EventWithCount>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn CandidateRepository) {}
}
