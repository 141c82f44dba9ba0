//! Ranking for the "businesses you might want" endpoint.
//!
//! A separate heuristic from search relevance, with its own fixed weights.

use serde::{Deserialize, Serialize};

use super::search::query::{UserContext, ValidationError};
use super::search::types::{BusinessCandidate, BusinessSearchItem, ScoredCandidate};

pub const DEFAULT_RECOMMENDATION_LIMIT: u32 = 5;
pub const MAX_RECOMMENDATION_LIMIT: u32 = 20;

const RATING_WEIGHT: f64 = 10.0;
const VERIFIED_BONUS: f64 = 20.0;
const FEATURED_BONUS: f64 = 15.0;
const REVIEW_COUNT_WEIGHT: f64 = 2.0;
const REVIEW_COUNT_CAP: f64 = 20.0;
const CITY_MATCH_BONUS: f64 = 25.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationBody {
    pub business_id: Option<i32>,
    pub user_context: UserContext,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_RECOMMENDATION_LIMIT
}

impl RecommendationBody {
    pub fn validate(self) -> Result<RecommendationRequest, ValidationError> {
        if self.limit < 1 || self.limit > MAX_RECOMMENDATION_LIMIT {
            return Err(ValidationError::single("limit"));
        }
        Ok(RecommendationRequest {
            business_id: self.business_id,
            user_context: self.user_context,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    pub business_id: Option<i32>,
    pub user_context: UserContext,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedBusiness {
    #[serde(flatten)]
    pub business: BusinessSearchItem,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    pub recommendations: Vec<RecommendedBusiness>,
    pub context: UserContext,
}

/// Fixed-weight recommendation score. Review-count popularity is capped so a
/// flood of reviews cannot outrank quality signals.
pub fn recommendation_score(candidate: &BusinessCandidate, context: &UserContext) -> f64 {
    let mut score = RATING_WEIGHT * candidate.average_rating.unwrap_or(0.0);

    if candidate.verified {
        score += VERIFIED_BONUS;
    }
    if candidate.featured {
        score += FEATURED_BONUS;
    }

    score += (REVIEW_COUNT_WEIGHT * candidate.review_count as f64).min(REVIEW_COUNT_CAP);

    if city_match(candidate, context) {
        score += CITY_MATCH_BONUS;
    }

    score
}

/// Human-readable justification shown next to each recommendation.
pub fn recommendation_reason(candidate: &BusinessCandidate, context: &UserContext) -> String {
    let mut reasons = Vec::new();

    if let Some(rating) = candidate.average_rating {
        if rating >= 4.5 {
            reasons.push(format!("Highly rated ({rating:.1} stars)"));
        }
    }
    if candidate.verified {
        reasons.push("Verified business".to_string());
    }
    if candidate.featured {
        reasons.push("Featured partner".to_string());
    }
    if context.location.is_some() {
        if let Some(location) = candidate.locations.first() {
            if city_match(candidate, context) {
                reasons.push(format!("Located in {}", location.city));
            }
        }
    }
    if let Some(primary) = candidate
        .categories
        .iter()
        .find(|c| c.is_primary)
        .or_else(|| candidate.categories.first())
    {
        reasons.push(format!("Specializes in {}", primary.name));
    }

    if reasons.is_empty() {
        "Recommended for you".to_string()
    } else {
        reasons.join(" \u{2022} ")
    }
}

/// Score, rank best-first (id ascending on ties), and project the top of the
/// list with reasons attached.
pub fn rank_recommendations(
    candidates: Vec<BusinessCandidate>,
    context: &UserContext,
    limit: u32,
) -> Vec<RecommendedBusiness> {
    let mut scored: Vec<(f64, BusinessCandidate)> = candidates
        .into_iter()
        .map(|candidate| (recommendation_score(&candidate, context), candidate))
        .collect();

    scored.sort_by(|(a_score, a), (b_score, b)| {
        b_score
            .partial_cmp(a_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });

    scored
        .into_iter()
        .take(limit as usize)
        .map(|(_, candidate)| {
            let reason = recommendation_reason(&candidate, context);
            RecommendedBusiness {
                business: BusinessSearchItem::from(ScoredCandidate {
                    candidate,
                    score: 0.0,
                    distance_miles: None,
                }),
                reason,
            }
        })
        .collect()
}

fn city_match(candidate: &BusinessCandidate, context: &UserContext) -> bool {
    let Some(location) = context.location.as_deref() else {
        return false;
    };
    let needle = location.to_lowercase();
    candidate
        .locations
        .iter()
        .any(|l| l.city.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::CategoryRef;
    use crate::domain::search::testing::{candidate, location};

    fn context_in(city: &str) -> UserContext {
        UserContext {
            location: Some(city.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn weights_stack_as_documented() {
        let mut c = candidate(1, "Acme");
        c.average_rating = Some(4.0);
        c.verified = true;
        c.featured = true;
        c.review_count = 15;
        c.locations = vec![location("Minneapolis", 44.97, -93.26, true)];

        // 10*4 + 20 + 15 + min(2*15, 20) + 25
        let score = recommendation_score(&c, &context_in("Minneapolis"));
        assert_eq!(score, 120.0);
    }

    #[test]
    fn review_count_bonus_is_capped() {
        let mut few = candidate(1, "Acme");
        few.review_count = 10;
        let mut many = candidate(2, "Acme");
        many.review_count = 500;

        let context = UserContext::default();
        assert_eq!(recommendation_score(&few, &context), 20.0);
        assert_eq!(recommendation_score(&many, &context), 20.0);
    }

    #[test]
    fn city_match_is_substring_insensitive() {
        let mut c = candidate(1, "Acme");
        c.locations = vec![location("Saint Paul", 44.95, -93.09, true)];

        assert_eq!(recommendation_score(&c, &context_in("saint paul")), 25.0);
        assert_eq!(recommendation_score(&c, &context_in("Paul")), 25.0);
        assert_eq!(recommendation_score(&c, &context_in("Duluth")), 0.0);
    }

    #[test]
    fn reason_collects_strongest_signals() {
        let mut c = candidate(1, "Acme");
        c.average_rating = Some(4.7);
        c.verified = true;
        c.categories = vec![CategoryRef {
            id: 1,
            slug: "consulting".to_string(),
            name: "Consulting".to_string(),
            is_primary: true,
        }];

        let reason = recommendation_reason(&c, &UserContext::default());
        assert!(reason.contains("Highly rated (4.7 stars)"));
        assert!(reason.contains("Verified business"));
        assert!(reason.contains("Specializes in Consulting"));
    }

    #[test]
    fn reason_falls_back_when_nothing_stands_out() {
        let c = candidate(1, "Plain Shop");
        assert_eq!(
            recommendation_reason(&c, &UserContext::default()),
            "Recommended for you"
        );
    }

    #[test]
    fn ranking_orders_by_score_then_id() {
        let mut verified = candidate(5, "B");
        verified.verified = true;
        let plain_low_id = candidate(1, "A");
        let plain_high_id = candidate(9, "C");

        let ranked = rank_recommendations(
            vec![plain_high_id, verified, plain_low_id],
            &UserContext::default(),
            10,
        );

        let ids: Vec<i32> = ranked.iter().map(|r| r.business.id).collect();
        assert_eq!(ids, vec![5, 1, 9]);
    }

    #[test]
    fn limit_truncates() {
        let ranked = rank_recommendations(
            vec![candidate(1, "A"), candidate(2, "B"), candidate(3, "C")],
            &UserContext::default(),
            2,
        );
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn body_validates_limit_bounds() {
        let body = RecommendationBody {
            business_id: None,
            user_context: UserContext::default(),
            limit: 21,
        };
        assert!(body.validate().is_err());
    }
}
