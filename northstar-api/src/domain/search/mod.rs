//! Geo-aware business and event search.
//!
//! One pipeline serves every search endpoint:
//! validate → fetch candidate superset → (optional) AI enhancement →
//! geo filter → relevance scoring → sort → paginate.
//!
//! The pieces are trait-abstracted for testability:
//!
//! - [`repository::CandidateRepository`] - coarse candidate pre-filtering
//!   (PostgreSQL, mocks)
//! - [`enhancer::QueryEnhancer`] - free text → structured hints (OpenAI,
//!   mocks); always best-effort, never a hard dependency
//!
//! # Example
//!
//! ```ignore
//! use northstar_api::domain::search::SearchService;
//! use northstar_api::domain::search::enhancer::OpenAiEnhancer;
//! use northstar_api::domain::search::repository::PgCandidateRepository;
//!
//! let repository = PgCandidateRepository::new(pool);
//! let enhancer = OpenAiEnhancer::new(chat_client, "gpt-4-turbo-preview");
//! let service = SearchService::new(repository, Some(enhancer));
//!
//! let page = service.search_businesses(&query).await?;
//! ```

pub mod geo;
pub mod pagination;
pub mod query;
pub mod types;

mod scoring;
mod service;
#[cfg(test)]
mod testing;

pub mod enhancer;
pub mod repository;

pub use scoring::relevance_score;
pub use service::SearchService;
