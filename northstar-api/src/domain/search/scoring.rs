//! Additive relevance heuristic shared by the search endpoints.
//!
//! The weights are load-bearing for result ordering and are kept exactly as
//! documented; do not retune them without recalibrating every consumer.

use super::types::{candidate_haystack, BusinessCandidate, Enhancement, ScoredCandidate};

const NAME_MATCH: f64 = 10.0;
const KEYWORD_HIT: f64 = 5.0;
const BUSINESS_TYPE_HIT: f64 = 8.0;
const RATING_WEIGHT: f64 = 2.0;
const VERIFIED_BONUS: f64 = 5.0;
const FEATURED_BONUS: f64 = 3.0;

/// Score a candidate against the raw query text and (optional) enhancement.
///
/// Additive, unnormalized, no upper bound. Unreviewed businesses contribute
/// a rating term of zero.
pub fn relevance_score(
    candidate: &BusinessCandidate,
    raw_query: Option<&str>,
    enhancement: Option<&Enhancement>,
) -> f64 {
    let mut score = 0.0;

    if let Some(query) = raw_query {
        if candidate
            .name
            .to_lowercase()
            .contains(&query.to_lowercase())
        {
            score += NAME_MATCH;
        }
    }

    if let Some(enhancement) = enhancement {
        let haystack = candidate_haystack(candidate);
        for keyword in &enhancement.keywords {
            if haystack.contains(&keyword.to_lowercase()) {
                score += KEYWORD_HIT;
            }
        }

        for category in &candidate.categories {
            if enhancement
                .business_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&category.name))
            {
                score += BUSINESS_TYPE_HIT;
            }
        }
    }

    score += RATING_WEIGHT * candidate.average_rating.unwrap_or(0.0);

    if candidate.verified {
        score += VERIFIED_BONUS;
    }
    if candidate.featured {
        score += FEATURED_BONUS;
    }

    score
}

/// Attach scores and sort best-first. Ties break on candidate id ascending,
/// so identical inputs always produce identical orderings.
pub fn rank(
    candidates: Vec<ScoredCandidate>,
    raw_query: Option<&str>,
    enhancement: Option<&Enhancement>,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|mut entry| {
            entry.score = relevance_score(&entry.candidate, raw_query, enhancement);
            entry
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.candidate.id.cmp(&b.candidate.id))
    });

    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::CategoryRef;
    use crate::domain::search::testing::candidate;

    fn unscored(candidate: BusinessCandidate) -> ScoredCandidate {
        ScoredCandidate {
            candidate,
            score: 0.0,
            distance_miles: None,
        }
    }

    #[test]
    fn name_match_is_worth_ten() {
        let c = candidate(1, "AI Consulting Group");
        assert_eq!(relevance_score(&c, Some("ai consulting"), None), 10.0);
        assert_eq!(relevance_score(&c, Some("plumbing"), None), 0.0);
    }

    #[test]
    fn keywords_add_five_per_hit() {
        let mut c = candidate(1, "Northern Analytics");
        c.description = Some("Machine learning and data pipelines".to_string());

        let enhancement = Enhancement {
            keywords: vec![
                "machine learning".to_string(),
                "data".to_string(),
                "blockchain".to_string(),
            ],
            ..Default::default()
        };

        assert_eq!(relevance_score(&c, None, Some(&enhancement)), 10.0);
    }

    #[test]
    fn business_type_match_adds_eight_per_category() {
        let mut c = candidate(1, "Acme");
        c.categories = vec![
            CategoryRef {
                id: 1,
                slug: "consulting".to_string(),
                name: "Consulting".to_string(),
                is_primary: true,
            },
            CategoryRef {
                id: 2,
                slug: "software".to_string(),
                name: "Software".to_string(),
                is_primary: false,
            },
        ];

        let enhancement = Enhancement {
            business_types: vec!["consulting".to_string(), "Software".to_string()],
            ..Default::default()
        };

        assert_eq!(relevance_score(&c, None, Some(&enhancement)), 16.0);
    }

    #[test]
    fn rating_verified_and_featured_stack() {
        let mut c = candidate(1, "Acme");
        c.average_rating = Some(4.5);
        c.verified = true;
        c.featured = true;

        // 2 * 4.5 + 5 + 3
        assert_eq!(relevance_score(&c, None, None), 17.0);
    }

    #[test]
    fn score_is_monotonic_in_rating() {
        let mut low = candidate(1, "Acme");
        low.average_rating = Some(3.0);
        let mut high = low.clone();
        high.average_rating = Some(3.1);

        assert!(relevance_score(&high, None, None) > relevance_score(&low, None, None));
    }

    #[test]
    fn ties_break_on_id_ascending() {
        let ranked = rank(
            vec![
                unscored(candidate(9, "Twin Pines")),
                unscored(candidate(3, "Twin Oaks")),
            ],
            None,
            None,
        );

        assert_eq!(ranked[0].candidate.id, 3);
        assert_eq!(ranked[1].candidate.id, 9);
    }

    #[test]
    fn rank_orders_by_score_descending() {
        let mut strong = candidate(2, "AI Lab");
        strong.verified = true;
        let weak = candidate(1, "AI Lab");

        let ranked = rank(
            vec![unscored(weak), unscored(strong)],
            Some("ai lab"),
            None,
        );

        assert_eq!(ranked[0].candidate.id, 2);
        assert_eq!(ranked[0].score, 15.0);
        assert_eq!(ranked[1].score, 10.0);
    }
}
