use std::collections::BTreeMap;

use serde::Serialize;
use strum::{Display, EnumString};
use time::Date;

/// Reporting window accepted by the analytics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TimeRange {
    #[strum(serialize = "7d")]
    Week,
    #[strum(serialize = "30d")]
    Month,
    #[strum(serialize = "90d")]
    Quarter,
    #[strum(serialize = "1y")]
    Year,
}

impl TimeRange {
    pub fn days(self) -> i64 {
        match self {
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::Quarter => 90,
            TimeRange::Year => 365,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub total_views: i64,
    /// Percentage change vs the previous equal-length period.
    pub views_change: f64,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub total_events: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewsPoint {
    pub date: Date,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsPoint {
    pub date: Date,
    pub count: i64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub overview: AnalyticsOverview,
    pub views_over_time: Vec<ViewsPoint>,
    pub reviews_over_time: Vec<ReviewsPoint>,
}

/// Percentage change between two view totals; 0 when there is no baseline.
pub fn views_change(current: i64, previous: i64) -> f64 {
    if previous <= 0 {
        return 0.0;
    }
    (current - previous) as f64 / previous as f64 * 100.0
}

/// Group review ratings by day, averaging ratings per day, ordered by date.
pub fn reviews_over_time(reviews: &[(Date, i32)]) -> Vec<ReviewsPoint> {
    let mut by_date: BTreeMap<Date, (i64, i64)> = BTreeMap::new();
    for (date, rating) in reviews {
        let entry = by_date.entry(*date).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += *rating as i64;
    }

    by_date
        .into_iter()
        .map(|(date, (count, total))| ReviewsPoint {
            date,
            count,
            average_rating: total as f64 / count as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use time::macros::date;

    #[test]
    fn time_range_parses_wire_values() {
        assert_eq!(TimeRange::from_str("30d").unwrap(), TimeRange::Month);
        assert_eq!(TimeRange::from_str("1y").unwrap(), TimeRange::Year);
        assert!(TimeRange::from_str("14d").is_err());
    }

    #[test]
    fn views_change_without_baseline_is_zero() {
        assert_eq!(views_change(10, 0), 0.0);
    }

    #[test]
    fn views_change_is_percentage() {
        assert_eq!(views_change(15, 10), 50.0);
        assert_eq!(views_change(5, 10), -50.0);
    }

    #[test]
    fn reviews_group_by_day_in_order() {
        let points = reviews_over_time(&[
            (date!(2026 - 02 - 02), 4),
            (date!(2026 - 02 - 01), 5),
            (date!(2026 - 02 - 02), 2),
        ]);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date!(2026 - 02 - 01));
        assert_eq!(points[0].average_rating, 5.0);
        assert_eq!(points[1].count, 2);
        assert_eq!(points[1].average_rating, 3.0);
    }
}
