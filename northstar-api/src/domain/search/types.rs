//! Core types for the search pipeline.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::business::BusinessStatus;
use crate::domain::category::CategoryRef;
use crate::domain::event::{EventStatus, EventWithCount};

use super::query::{EventSearchQuery, SearchQuery};

/// A business pulled from storage with the denormalized fields scoring
/// needs. Owned by the storage layer; read-only here.
#[derive(Debug, Clone)]
pub struct BusinessCandidate {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub status: BusinessStatus,
    pub verified: bool,
    pub featured: bool,
    pub categories: Vec<CategoryRef>,
    pub locations: Vec<CandidateLocation>,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateLocation {
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_primary: bool,
}

impl BusinessCandidate {
    /// The flagged primary location, falling back to the first on record.
    pub fn primary_location(&self) -> Option<&CandidateLocation> {
        self.locations
            .iter()
            .find(|l| l.is_primary)
            .or_else(|| self.locations.first())
    }
}

/// Coarse storage predicate bounding the candidate set. Never scores.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub status: Option<BusinessStatus>,
    /// Case-insensitive substring over name and description.
    pub text: Option<String>,
    /// Any-of substring terms over name, description, short description.
    pub terms: Vec<String>,
    pub category_id: Option<i32>,
    /// Any-of category names, matched case-insensitively.
    pub category_names: Vec<String>,
    /// Case-insensitive substring over location cities.
    pub city: Option<String>,
    pub featured: Option<bool>,
    pub verified: Option<bool>,
    /// Leave a specific business out of the set (recommendation source).
    pub exclude_id: Option<i32>,
    pub fetch_limit: Option<i64>,
}

impl CandidateFilter {
    /// Base predicate every public-facing search starts from.
    pub fn active() -> Self {
        Self {
            status: Some(BusinessStatus::Active),
            ..Default::default()
        }
    }

    /// Predicate for the plain search endpoint. Unfiltered searches see
    /// active businesses only.
    pub fn from_query(query: &SearchQuery) -> Self {
        Self {
            status: Some(query.status.unwrap_or(BusinessStatus::Active)),
            text: query.text.clone(),
            category_id: query.category_id,
            city: query.city.clone(),
            featured: query.featured,
            verified: query.verified,
            ..Default::default()
        }
    }

    /// In-memory equivalent of the storage predicate, shared by the mock
    /// repository and tests.
    pub fn matches(&self, candidate: &BusinessCandidate) -> bool {
        if let Some(status) = self.status {
            if candidate.status != status {
                return false;
            }
        }
        if self.exclude_id == Some(candidate.id) {
            return false;
        }
        if let Some(featured) = self.featured {
            if candidate.featured != featured {
                return false;
            }
        }
        if let Some(verified) = self.verified {
            if candidate.verified != verified {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if !candidate.categories.iter().any(|c| c.id == category_id) {
                return false;
            }
        }
        if !self.category_names.is_empty() || !self.terms.is_empty() {
            let category_hit = self.category_names.iter().any(|name| {
                candidate
                    .categories
                    .iter()
                    .any(|c| c.name.eq_ignore_ascii_case(name))
            });
            let term_hit = {
                let haystack = candidate_haystack(candidate);
                self.terms
                    .iter()
                    .any(|term| haystack.contains(&term.to_lowercase()))
            };
            if !category_hit && !term_hit {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let name_hit = candidate.name.to_lowercase().contains(&needle);
            let description_hit = candidate
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !name_hit && !description_hit {
                return false;
            }
        }
        if let Some(city) = &self.city {
            let needle = city.to_lowercase();
            if !candidate
                .locations
                .iter()
                .any(|l| l.city.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }
}

pub(crate) fn candidate_haystack(candidate: &BusinessCandidate) -> String {
    format!(
        "{} {} {}",
        candidate.name,
        candidate.description.as_deref().unwrap_or_default(),
        candidate.short_description.as_deref().unwrap_or_default()
    )
    .to_lowercase()
}

/// Candidate plus computed ranking signals; internal to the pipeline.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: BusinessCandidate,
    pub score: f64,
    pub distance_miles: Option<f64>,
}

/// Structured hints derived from free text by the AI enhancer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Enhancement {
    pub keywords: Vec<String>,
    pub business_types: Vec<String>,
    pub services: Vec<String>,
    pub intent: String,
}

/// Public projection of a search hit. The raw relevance score is an
/// internal ranking signal and never serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSearchItem {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub status: BusinessStatus,
    pub verified: bool,
    pub featured: bool,
    pub categories: Vec<CategoryRef>,
    pub locations: Vec<CandidateLocation>,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<ScoredCandidate> for BusinessSearchItem {
    fn from(scored: ScoredCandidate) -> Self {
        let candidate = scored.candidate;
        Self {
            id: candidate.id,
            slug: candidate.slug,
            name: candidate.name,
            description: candidate.description,
            short_description: candidate.short_description,
            status: candidate.status,
            verified: candidate.verified,
            featured: candidate.featured,
            categories: candidate.categories,
            locations: candidate.locations,
            average_rating: candidate.average_rating,
            review_count: candidate.review_count,
            distance_miles: scored.distance_miles,
            created_at: candidate.created_at,
        }
    }
}

/// Coarse storage predicate for event search. Unfiltered searches see
/// published events only.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Case-insensitive substring over title and description.
    pub text: Option<String>,
    pub business_id: Option<i32>,
    pub is_virtual: Option<bool>,
    pub is_hybrid: Option<bool>,
    pub status: Option<EventStatus>,
    pub starts_after: Option<OffsetDateTime>,
    pub ends_before: Option<OffsetDateTime>,
    /// Case-insensitive substring over the event city.
    pub city: Option<String>,
}

impl EventFilter {
    pub fn from_query(query: &EventSearchQuery) -> Self {
        Self {
            text: query.text.clone(),
            business_id: query.business_id,
            is_virtual: query.is_virtual,
            is_hybrid: query.is_hybrid,
            status: Some(query.status.unwrap_or(EventStatus::Published)),
            starts_after: query.starts_after,
            ends_before: query.ends_before,
            city: query.city.clone(),
        }
    }

    /// In-memory equivalent of the storage predicate, shared by the mock
    /// repository and tests.
    pub fn matches(&self, entry: &EventWithCount) -> bool {
        let event = &entry.event;
        if let Some(status) = self.status {
            if event.status != status {
                return false;
            }
        }
        if let Some(business_id) = self.business_id {
            if event.business_id != business_id {
                return false;
            }
        }
        if let Some(is_virtual) = self.is_virtual {
            if event.is_virtual != is_virtual {
                return false;
            }
        }
        if let Some(is_hybrid) = self.is_hybrid {
            if event.is_hybrid != is_hybrid {
                return false;
            }
        }
        if let Some(starts_after) = self.starts_after {
            if event.start_date < starts_after {
                return false;
            }
        }
        if let Some(ends_before) = self.ends_before {
            if event.end_date > ends_before {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !event.title.to_lowercase().contains(&needle)
                && !event.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(city) = &self.city {
            let needle = city.to_lowercase();
            match &event.city {
                Some(event_city) if event_city.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Public projection of an event search hit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSearchItem {
    #[serde(flatten)]
    pub event: EventWithCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
}

/// Outcome of the AI search pipeline, before recommendations are attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSearchOutcome {
    pub results: Vec<BusinessSearchItem>,
    pub search_enhancements: Option<Enhancement>,
    pub total_results: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::testing::candidate;

    #[test]
    fn text_filter_matches_name_or_description() {
        let mut with_description = candidate(1, "Blue Lake Bakery");
        with_description.description = Some("Artisan sourdough and pastries".to_string());

        let filter = CandidateFilter {
            text: Some("sourdough".to_string()),
            status: None,
            ..Default::default()
        };
        assert!(filter.matches(&with_description));

        let filter = CandidateFilter {
            text: Some("BAKERY".to_string()),
            status: None,
            ..Default::default()
        };
        assert!(filter.matches(&with_description));

        let filter = CandidateFilter {
            text: Some("plumbing".to_string()),
            status: None,
            ..Default::default()
        };
        assert!(!filter.matches(&with_description));
    }

    #[test]
    fn status_filter_defaults_to_active_from_query() {
        let query = SearchQuery::parse(Default::default()).unwrap();
        let filter = CandidateFilter::from_query(&query);
        assert_eq!(filter.status, Some(BusinessStatus::Active));
    }

    #[test]
    fn terms_or_category_names_are_a_single_disjunction() {
        let mut consulting = candidate(1, "Northern Analytics");
        consulting.categories = vec![CategoryRef {
            id: 4,
            slug: "consulting".to_string(),
            name: "Consulting".to_string(),
            is_primary: true,
        }];

        let filter = CandidateFilter {
            status: None,
            terms: vec!["machine learning".to_string()],
            category_names: vec!["consulting".to_string()],
            ..Default::default()
        };
        // no term hit, but the category name matches case-insensitively
        assert!(filter.matches(&consulting));

        let filter = CandidateFilter {
            status: None,
            terms: vec!["analytics".to_string()],
            category_names: vec!["Bakeries".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&consulting));

        let filter = CandidateFilter {
            status: None,
            terms: vec!["plumbing".to_string()],
            category_names: vec!["Bakeries".to_string()],
            ..Default::default()
        };
        assert!(!filter.matches(&consulting));
    }

    #[test]
    fn primary_location_falls_back_to_first() {
        let mut c = candidate(1, "Test");
        c.locations = vec![
            CandidateLocation {
                city: "Duluth".to_string(),
                state: "MN".to_string(),
                latitude: 46.78,
                longitude: -92.1,
                is_primary: false,
            },
            CandidateLocation {
                city: "Minneapolis".to_string(),
                state: "MN".to_string(),
                latitude: 44.97,
                longitude: -93.26,
                is_primary: true,
            },
        ];
        assert_eq!(c.primary_location().unwrap().city, "Minneapolis");

        c.locations[1].is_primary = false;
        assert_eq!(c.primary_location().unwrap().city, "Duluth");
    }

    #[test]
    fn enhancement_tolerates_missing_fields() {
        let enhancement: Enhancement =
            serde_json::from_str(r#"{"keywords": ["ai"]}"#).unwrap();
        assert_eq!(enhancement.keywords, vec!["ai"]);
        assert!(enhancement.business_types.is_empty());
        assert!(enhancement.intent.is_empty());
    }
}
