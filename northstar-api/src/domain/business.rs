use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use super::category::CategoryRef;
use super::event::Event;
use super::review::ReviewWithAuthor;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessStatus {
    Draft,
    Pending,
    Active,
    Inactive,
    Suspended,
}

impl From<String> for BusinessStatus {
    fn from(value: String) -> Self {
        Self::from_str(&value).unwrap_or(Self::Pending)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub year_established: Option<i32>,
    pub status: BusinessStatus,
    pub verified: bool,
    pub featured: bool,
    pub claimed_by: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i32,
    pub business_id: i32,
    pub street_address: String,
    pub street_address_2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_primary: bool,
}

/// Full public projection of a business, as served by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDetail {
    #[serde(flatten)]
    pub business: Business,
    pub locations: Vec<Location>,
    pub categories: Vec<CategoryRef>,
    pub reviews: Vec<ReviewWithAuthor>,
    pub upcoming_events: Vec<Event>,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub street_address: String,
    pub street_address_2: Option<String>,
    pub city: String,
    #[serde(default = "default_state")]
    pub state: String,
    pub zip_code: String,
    pub latitude: f64,
    pub longitude: f64,
}

fn default_state() -> String {
    "MN".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBusiness {
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub year_established: Option<i32>,
    pub category_ids: Vec<i32>,
    pub location: NewLocation,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub year_established: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_screaming_case() {
        assert_eq!(BusinessStatus::Active.to_string(), "ACTIVE");
        assert_eq!(
            BusinessStatus::from_str("SUSPENDED").unwrap(),
            BusinessStatus::Suspended
        );
    }

    #[test]
    fn unknown_status_defaults_to_pending() {
        assert_eq!(
            BusinessStatus::from("ARCHIVED".to_string()),
            BusinessStatus::Pending
        );
    }
}
