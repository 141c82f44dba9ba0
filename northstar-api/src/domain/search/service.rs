//! The search pipeline: validate → fetch → enhance → geo → score → sort →
//! paginate. One instance serves every search endpoint.

use std::cmp::Ordering;

use crate::domain::event::EventWithCount;
use crate::domain::recommendation::{
    rank_recommendations, RecommendationRequest, RecommendationSet,
};
use crate::repositories::RepositoryError;

use super::enhancer::QueryEnhancer;
use super::geo::GeoPoint;
use super::pagination::{paginate, Paginated};
use super::query::{
    AiSearchQuery, EventSearchQuery, EventSortKey, SearchQuery, SortKey, SortOrder,
};
use super::repository::CandidateRepository;
use super::scoring::rank;
use super::types::{
    AiSearchOutcome, BusinessSearchItem, CandidateFilter, Enhancement, EventFilter,
    EventSearchItem, ScoredCandidate,
};

/// Stateless per-request pipeline over a candidate repository and an
/// optional AI query enhancer.
///
/// # Type Parameters
///
/// * `R` - candidate repository backing the coarse pre-filter
/// * `E` - query enhancer; `None` disables enhancement entirely
pub struct SearchService<R, E>
where
    R: CandidateRepository,
    E: QueryEnhancer,
{
    repository: R,
    enhancer: Option<E>,
}

impl<R, E> SearchService<R, E>
where
    R: CandidateRepository,
    E: QueryEnhancer,
{
    pub fn new(repository: R, enhancer: Option<E>) -> Self {
        Self {
            repository,
            enhancer,
        }
    }

    /// Best-effort enhancement: one attempt, failures degrade to `None`.
    async fn try_enhance(&self, text: &str) -> Option<Enhancement> {
        let enhancer = self.enhancer.as_ref()?;
        match enhancer.enhance(text).await {
            Ok(enhancement) => Some(enhancement),
            Err(err) => {
                tracing::warn!("Query enhancement failed, searching raw text only: {err}");
                None
            }
        }
    }

    /// The plain business search pipeline. Enhancement is opt-in per request
    /// and only affects scoring; the candidate superset is fetched first.
    pub async fn search_businesses(
        &self,
        query: &SearchQuery,
    ) -> Result<Paginated<BusinessSearchItem>, RepositoryError> {
        let filter = CandidateFilter::from_query(query);
        let candidates = self.repository.fetch_businesses(&filter).await?;

        let enhancement = match (&query.text, query.enhance) {
            (Some(text), true) => self.try_enhance(text).await,
            _ => None,
        };

        let admitted: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter_map(|candidate| match query.geo {
                Some(geo) => {
                    let location = candidate.primary_location()?;
                    let point = GeoPoint::new(location.latitude, location.longitude);
                    let distance = geo.admit(point)?;
                    Some(ScoredCandidate {
                        candidate,
                        score: 0.0,
                        distance_miles: Some(distance),
                    })
                }
                None => Some(ScoredCandidate {
                    candidate,
                    score: 0.0,
                    distance_miles: None,
                }),
            })
            .collect();

        let mut ranked = rank(admitted, query.text.as_deref(), enhancement.as_ref());
        sort_scored(&mut ranked, query.sort_by, query.sort_order);

        let page = paginate(ranked, query.page, query.limit);
        Ok(page.map(BusinessSearchItem::from))
    }

    /// AI search: the enhancement drives the coarse filter as well as the
    /// scoring, and the result is a flat top-N rather than a page.
    pub async fn ai_search(
        &self,
        query: &AiSearchQuery,
    ) -> Result<AiSearchOutcome, RepositoryError> {
        let enhancement = self.try_enhance(&query.query).await;

        let filter = match &enhancement {
            Some(enhancement) => CandidateFilter {
                terms: enhancement.keywords.clone(),
                category_names: enhancement.business_types.clone(),
                // fetch a wider set than requested; scoring trims it
                fetch_limit: Some(i64::from(query.limit) * 2),
                ..CandidateFilter::active()
            },
            None => CandidateFilter {
                text: Some(query.query.clone()),
                fetch_limit: Some(i64::from(query.limit) * 2),
                ..CandidateFilter::active()
            },
        };

        let candidates = self.repository.fetch_businesses(&filter).await?;
        let unscored = candidates
            .into_iter()
            .map(|candidate| ScoredCandidate {
                candidate,
                score: 0.0,
                distance_miles: None,
            })
            .collect();

        let ranked = rank(unscored, Some(&query.query), enhancement.as_ref());
        let results: Vec<BusinessSearchItem> = ranked
            .into_iter()
            .take(query.limit as usize)
            .map(BusinessSearchItem::from)
            .collect();

        Ok(AiSearchOutcome {
            total_results: results.len(),
            results,
            search_enhancements: enhancement,
        })
    }

    /// Event search shares the validate → fetch → geo → sort → paginate
    /// skeleton but never scores; events rank by their sort key alone.
    pub async fn search_events(
        &self,
        query: &EventSearchQuery,
    ) -> Result<Paginated<EventSearchItem>, RepositoryError> {
        let filter = EventFilter::from_query(query);
        let events = self.repository.fetch_events(&filter).await?;

        let mut admitted: Vec<EventSearchItem> = events
            .into_iter()
            .filter_map(|entry| match query.geo {
                Some(geo) => {
                    let (latitude, longitude) =
                        entry.event.latitude.zip(entry.event.longitude)?;
                    let distance = geo.admit(GeoPoint::new(latitude, longitude))?;
                    Some(EventSearchItem {
                        event: entry,
                        distance_miles: Some(distance),
                    })
                }
                None => Some(EventSearchItem {
                    event: entry,
                    distance_miles: None,
                }),
            })
            .collect();

        sort_events(&mut admitted, query.sort_by, query.sort_order);

        Ok(paginate(admitted, query.page, query.limit))
    }

    /// Active businesses loosely matching any of the given terms, for chat
    /// follow-up suggestions.
    pub async fn find_by_terms(
        &self,
        terms: &[String],
        limit: i64,
    ) -> Result<Vec<super::types::BusinessCandidate>, RepositoryError> {
        if terms.is_empty() {
            return Ok(vec![]);
        }
        self.repository
            .fetch_businesses(&CandidateFilter {
                terms: terms.to_vec(),
                fetch_limit: Some(limit),
                ..CandidateFilter::active()
            })
            .await
    }

    /// Similar businesses when a source id is given, featured businesses
    /// otherwise. An unknown source id is a hard not-found, matching the
    /// single-entity lookup rule.
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationSet, RepositoryError> {
        let filter = match request.business_id {
            Some(id) => {
                let source = self
                    .repository
                    .fetch_business(id)
                    .await?
                    .ok_or_else(|| RepositoryError::NotFound(format!("business {id}")))?;
                if source.categories.is_empty() {
                    // nothing to be similar to
                    return Ok(RecommendationSet {
                        recommendations: vec![],
                        context: request.user_context.clone(),
                    });
                }
                CandidateFilter {
                    exclude_id: Some(id),
                    category_names: source
                        .categories
                        .iter()
                        .map(|c| c.name.clone())
                        .collect(),
                    fetch_limit: Some(i64::from(request.limit) * 3),
                    ..CandidateFilter::active()
                }
            }
            None => CandidateFilter {
                featured: Some(true),
                fetch_limit: Some(i64::from(request.limit) * 2),
                ..CandidateFilter::active()
            },
        };

        let candidates = self.repository.fetch_businesses(&filter).await?;
        let recommendations =
            rank_recommendations(candidates, &request.user_context, request.limit);

        Ok(RecommendationSet {
            recommendations,
            context: request.user_context.clone(),
        })
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Order scored candidates by the requested key. Relevance always sorts
/// best-first; every key tie-breaks on candidate id ascending.
fn sort_scored(entries: &mut [ScoredCandidate], sort_by: SortKey, sort_order: SortOrder) {
    entries.sort_by(|a, b| {
        let primary = match sort_by {
            SortKey::Name => a
                .candidate
                .name
                .to_lowercase()
                .cmp(&b.candidate.name.to_lowercase()),
            SortKey::CreatedAt => a.candidate.created_at.cmp(&b.candidate.created_at),
            SortKey::Distance => cmp_f64(
                a.distance_miles.unwrap_or(f64::INFINITY),
                b.distance_miles.unwrap_or(f64::INFINITY),
            ),
            SortKey::Rating => cmp_f64(
                a.candidate.average_rating.unwrap_or(0.0),
                b.candidate.average_rating.unwrap_or(0.0),
            ),
            SortKey::Relevance => cmp_f64(b.score, a.score),
        };
        let primary = match (sort_by, sort_order) {
            (SortKey::Relevance, _) | (_, SortOrder::Asc) => primary,
            (_, SortOrder::Desc) => primary.reverse(),
        };
        primary.then(a.candidate.id.cmp(&b.candidate.id))
    });
}

fn sort_events(entries: &mut [EventSearchItem], sort_by: EventSortKey, sort_order: SortOrder) {
    entries.sort_by(|a, b| {
        let primary = match sort_by {
            EventSortKey::StartDate => a.event.event.start_date.cmp(&b.event.event.start_date),
            EventSortKey::CreatedAt => a.event.event.created_at.cmp(&b.event.event.created_at),
            EventSortKey::Title => a
                .event
                .event
                .title
                .to_lowercase()
                .cmp(&b.event.event.title.to_lowercase()),
        };
        let primary = match sort_order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then(a.event.event.id.cmp(&b.event.event.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::enhancer::MockEnhancer;
    use crate::domain::search::query::{RawSearchParams, UserContext};
    use crate::domain::search::repository::MockCandidateRepository;
    use crate::domain::search::testing::{candidate, event, location};

    fn service(
        repo: MockCandidateRepository,
        enhancer: Option<MockEnhancer>,
    ) -> SearchService<MockCandidateRepository, MockEnhancer> {
        SearchService::new(repo, enhancer)
    }

    fn metro_repo() -> MockCandidateRepository {
        let mut downtown = candidate(1, "Mill City Consulting");
        downtown.locations = vec![location("Minneapolis", 44.9778, -93.2650, true)];
        let mut st_paul = candidate(2, "Capitol Analytics");
        st_paul.locations = vec![location("Saint Paul", 44.9537, -93.0900, true)];
        let mut rochester = candidate(3, "Med City Software");
        rochester.locations = vec![location("Rochester", 44.0121, -92.4802, true)];
        let no_location = candidate(4, "Nowhere Ventures");

        MockCandidateRepository::new()
            .with_businesses(vec![downtown, st_paul, rochester, no_location])
    }

    #[tokio::test]
    async fn radius_filter_admits_only_nearby_candidates() {
        let service = service(metro_repo(), None);

        let query = SearchQuery::parse(RawSearchParams {
            lat: Some("44.9778".to_string()),
            lng: Some("-93.2650".to_string()),
            radius: Some("10".to_string()),
            ..Default::default()
        })
        .unwrap();

        let page = service.search_businesses(&query).await.unwrap();

        let ids: Vec<i32> = page.data.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 1]); // name sort: Capitol before Mill City
        for item in &page.data {
            assert!(item.distance_miles.unwrap() <= 10.0);
        }
    }

    #[tokio::test]
    async fn candidates_without_location_are_excluded_only_under_geo() {
        let service = service(metro_repo(), None);

        let plain = SearchQuery::parse(Default::default()).unwrap();
        let all = service.search_businesses(&plain).await.unwrap();
        assert_eq!(all.pagination.total, 4);

        let geo = SearchQuery::parse(RawSearchParams {
            lat: Some("44.9778".to_string()),
            lng: Some("-93.2650".to_string()),
            radius: Some("100".to_string()),
            ..Default::default()
        })
        .unwrap();
        let within = service.search_businesses(&geo).await.unwrap();
        assert!(within.data.iter().all(|b| b.id != 4));
    }

    #[tokio::test]
    async fn pagination_slices_the_post_filter_set() {
        let candidates: Vec<_> = (1..=45)
            .map(|id| candidate(id, &format!("Business {id:02}")))
            .collect();
        let service = service(
            MockCandidateRepository::new().with_businesses(candidates),
            None,
        );

        let query = SearchQuery::parse(RawSearchParams {
            page: Some("3".to_string()),
            limit: Some("20".to_string()),
            ..Default::default()
        })
        .unwrap();

        let page = service.search_businesses(&query).await.unwrap();
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.pagination.total, 45);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[tokio::test]
    async fn identical_queries_return_identical_pages() {
        let service = service(metro_repo(), None);
        let query = SearchQuery::parse(RawSearchParams {
            sort_by: Some("createdAt".to_string()),
            ..Default::default()
        })
        .unwrap();

        let first = service.search_businesses(&query).await.unwrap();
        let second = service.search_businesses(&query).await.unwrap();

        let first_ids: Vec<i32> = first.data.iter().map(|b| b.id).collect();
        let second_ids: Vec<i32> = second.data.iter().map(|b| b.id).collect();
        assert_eq!(first_ids, second_ids);
        assert_eq!(first.pagination, second.pagination);
    }

    #[tokio::test]
    async fn enhancement_boosts_scores_without_narrowing_the_set() {
        let mut bakery = candidate(1, "Blue Lake Bakery");
        bakery.description = Some("Fresh sourdough daily".to_string());
        let mut diner = candidate(2, "Lake Street Diner");
        diner.description = Some("Classic breakfast".to_string());

        let repo = MockCandidateRepository::new().with_businesses(vec![bakery, diner]);
        let enhancer = MockEnhancer::returning(Enhancement {
            keywords: vec!["sourdough".to_string()],
            ..Default::default()
        });
        let service = service(repo, Some(enhancer));

        let query = SearchQuery::parse(RawSearchParams {
            query: Some("Lake".to_string()),
            enhance: Some("true".to_string()),
            sort_by: Some("relevance".to_string()),
            ..Default::default()
        })
        .unwrap();

        let page = service.search_businesses(&query).await.unwrap();
        // both match the raw text; the keyword hit puts the bakery first
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.data[0].id, 1);
    }

    #[tokio::test]
    async fn unavailable_enhancer_degrades_to_raw_text() {
        let mut consulting = candidate(1, "AI Consulting Partners");
        consulting.description = Some("Strategy for AI adoption".to_string());
        let repo = MockCandidateRepository::new().with_businesses(vec![consulting]);
        let enhancer = MockEnhancer::unavailable();
        let service = SearchService::new(repo, Some(enhancer.clone()));

        let query = SearchQuery::parse(RawSearchParams {
            query: Some("AI Consulting".to_string()),
            enhance: Some("true".to_string()),
            sort_by: Some("relevance".to_string()),
            ..Default::default()
        })
        .unwrap();

        let page = service.search_businesses(&query).await.unwrap();
        assert_eq!(enhancer.call_count(), 1);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, 1);
    }

    #[tokio::test]
    async fn ai_search_filters_by_enhancement_and_caps_results() {
        let mut hits: Vec<_> = (1..=6)
            .map(|id| {
                let mut c = candidate(id, &format!("Data Shop {id}"));
                c.description = Some("data engineering".to_string());
                c
            })
            .collect();
        hits.push(candidate(7, "Unrelated Florist"));

        let repo = MockCandidateRepository::new().with_businesses(hits);
        let enhancer = MockEnhancer::returning(Enhancement {
            keywords: vec!["data".to_string()],
            business_types: vec![],
            services: vec![],
            intent: "find data help".to_string(),
        });
        let service = service(repo, Some(enhancer));

        let outcome = service
            .ai_search(&AiSearchQuery {
                query: "help with data".to_string(),
                include_recommendations: false,
                limit: 5,
                user_context: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 5);
        assert_eq!(outcome.total_results, 5);
        assert!(outcome.search_enhancements.is_some());
        assert!(outcome.results.iter().all(|b| b.name.starts_with("Data")));
    }

    #[tokio::test]
    async fn ai_search_without_enhancer_uses_raw_substring_filter() {
        let mut consulting = candidate(1, "AI Consulting Partners");
        consulting.description = Some("AI consulting for manufacturers".to_string());
        let florist = candidate(2, "Florist");

        let repo = MockCandidateRepository::new().with_businesses(vec![consulting, florist]);
        let service = service(repo, None);

        let outcome = service
            .ai_search(&AiSearchQuery {
                query: "AI consulting".to_string(),
                include_recommendations: true,
                limit: 10,
                user_context: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.search_enhancements.is_none());
    }

    #[tokio::test]
    async fn event_geo_filter_uses_event_coordinates() {
        let mut near = event(1, "Downtown Meetup");
        near.event.latitude = Some(44.9778);
        near.event.longitude = Some(-93.2650);
        let mut far = event(2, "Rochester Expo");
        far.event.latitude = Some(44.0121);
        far.event.longitude = Some(-92.4802);
        let no_coords = event(3, "Virtual Webinar");

        let repo = MockCandidateRepository::new().with_events(vec![near, far, no_coords]);
        let service = service(repo, None);

        let query = EventSearchQuery::parse(crate::domain::search::query::RawEventSearchParams {
            lat: Some("44.9778".to_string()),
            lng: Some("-93.2650".to_string()),
            radius: Some("25".to_string()),
            ..Default::default()
        })
        .unwrap();

        let page = service.search_events(&query).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].event.event.id, 1);
        assert!(page.data[0].distance_miles.unwrap() <= 25.0);
    }

    #[tokio::test]
    async fn event_search_sorts_by_title_descending() {
        let repo = MockCandidateRepository::new().with_events(vec![
            event(1, "Apple Days"),
            event(2, "Zine Fest"),
            event(3, "Maker Fair"),
        ]);
        let service = service(repo, None);

        let query = EventSearchQuery::parse(crate::domain::search::query::RawEventSearchParams {
            sort_by: Some("title".to_string()),
            sort_order: Some("desc".to_string()),
            ..Default::default()
        })
        .unwrap();

        let page = service.search_events(&query).await.unwrap();
        let titles: Vec<&str> = page
            .data
            .iter()
            .map(|e| e.event.event.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Zine Fest", "Maker Fair", "Apple Days"]);
    }

    #[tokio::test]
    async fn recommend_unknown_source_is_not_found() {
        let service = service(MockCandidateRepository::new(), None);
        let err = service
            .recommend(&RecommendationRequest {
                business_id: Some(42),
                user_context: UserContext::default(),
                limit: 5,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn recommend_without_source_ranks_featured_businesses() {
        let mut featured = candidate(1, "Featured Co");
        featured.featured = true;
        featured.average_rating = Some(5.0);
        let mut also_featured = candidate(2, "Also Featured");
        also_featured.featured = true;
        let plain = candidate(3, "Plain Co");

        let repo = MockCandidateRepository::new()
            .with_businesses(vec![featured, also_featured, plain]);
        let service = service(repo, None);

        let set = service
            .recommend(&RecommendationRequest {
                business_id: None,
                user_context: UserContext::default(),
                limit: 5,
            })
            .await
            .unwrap();

        let ids: Vec<i32> = set.recommendations.iter().map(|r| r.business.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(set.recommendations[0].reason.contains("Highly rated"));
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let service = service(MockCandidateRepository::new().failing(), None);
        let query = SearchQuery::parse(Default::default()).unwrap();
        assert!(service.search_businesses(&query).await.is_err());
    }
}
