use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::{Date, OffsetDateTime};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    Flagged,
}

impl From<String> for ReviewStatus {
    fn from(value: String) -> Self {
        Self::from_str(&value).unwrap_or(Self::Pending)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i32,
    pub business_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub visit_date: Option<Date>,
    pub recommends_business: Option<bool>,
    pub images: Vec<String>,
    pub status: ReviewStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub edited_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub id: i32,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub user: ReviewAuthor,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponseEntry {
    pub id: i32,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user: ReviewAuthor,
}

/// A review with everything the public listing shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithMeta {
    #[serde(flatten)]
    pub review: Review,
    pub user: ReviewAuthor,
    pub response: Option<ReviewResponseEntry>,
    pub helpful_votes: i64,
    pub total_votes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ReviewSort {
    #[strum(serialize = "recent")]
    Recent,
    #[strum(serialize = "rating-high")]
    RatingHigh,
    #[strum(serialize = "rating-low")]
    RatingLow,
    #[strum(serialize = "helpful")]
    Helpful,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub average_rating: f64,
    pub total_reviews: i64,
    pub rating_distribution: RatingDistribution,
    pub recommendation_rate: i64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RatingDistribution {
    #[serde(rename = "1")]
    pub one: i64,
    #[serde(rename = "2")]
    pub two: i64,
    #[serde(rename = "3")]
    pub three: i64,
    #[serde(rename = "4")]
    pub four: i64,
    #[serde(rename = "5")]
    pub five: i64,
}

/// Aggregate published review ratings the way the stats endpoint reports
/// them: average rounded to one decimal, per-star counts, and the share of
/// reviewers who recommend the business (whole percent).
pub fn compute_review_stats(reviews: &[(i32, Option<bool>)]) -> ReviewStats {
    if reviews.is_empty() {
        return ReviewStats {
            average_rating: 0.0,
            total_reviews: 0,
            rating_distribution: RatingDistribution::default(),
            recommendation_rate: 0,
        };
    }

    let total = reviews.len() as i64;
    let sum: i64 = reviews.iter().map(|(rating, _)| *rating as i64).sum();
    let average = sum as f64 / total as f64;

    let mut distribution = RatingDistribution::default();
    for (rating, _) in reviews {
        match rating {
            1 => distribution.one += 1,
            2 => distribution.two += 1,
            3 => distribution.three += 1,
            4 => distribution.four += 1,
            5 => distribution.five += 1,
            _ => {}
        }
    }

    let recommendations = reviews
        .iter()
        .filter(|(_, recommends)| *recommends == Some(true))
        .count() as f64;
    let recommendation_rate = (recommendations / total as f64 * 100.0).round() as i64;

    ReviewStats {
        average_rating: (average * 10.0).round() / 10.0,
        total_reviews: total,
        rating_distribution: distribution,
        recommendation_rate,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub business_id: i32,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub visit_date: Option<Date>,
    pub recommends_business: Option<bool>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub visit_date: Option<Date>,
    pub recommends_business: Option<bool>,
    pub images: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_for_no_reviews_are_zeroed() {
        let stats = compute_review_stats(&[]);
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.recommendation_rate, 0);
    }

    #[test]
    fn stats_round_average_to_one_decimal() {
        let stats = compute_review_stats(&[(5, Some(true)), (4, Some(true)), (4, None)]);
        assert_eq!(stats.average_rating, 4.3);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.rating_distribution.four, 2);
        assert_eq!(stats.rating_distribution.five, 1);
        // 2 of 3 recommend
        assert_eq!(stats.recommendation_rate, 67);
    }

    #[test]
    fn explicit_no_recommendation_counts_against_rate() {
        let stats = compute_review_stats(&[(5, Some(false)), (5, Some(true))]);
        assert_eq!(stats.recommendation_rate, 50);
    }

    #[test]
    fn review_sort_parses_wire_values() {
        assert_eq!(ReviewSort::from_str("rating-high").unwrap(), ReviewSort::RatingHigh);
        assert!(ReviewSort::from_str("random").is_err());
    }
}
