use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Postponed,
    Completed,
}

impl From<String> for EventStatus {
    fn from(value: String) -> Self {
        Self::from_str(&value).unwrap_or(Self::Draft)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
}

impl From<String> for RegistrationStatus {
    fn from(value: String) -> Self {
        Self::from_str(&value).unwrap_or(Self::Confirmed)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    pub business_id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub status: EventStatus,
    pub is_virtual: bool,
    pub is_hybrid: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub venue: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: String,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub virtual_url: Option<String>,
    pub max_attendees: Option<i32>,
    pub price: Option<f64>,
    pub currency: String,
    pub registration_required: bool,
    pub registration_url: Option<String>,
    pub tags: Vec<String>,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// An event with its confirmed registration count attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWithCount {
    #[serde(flatten)]
    pub event: Event,
    pub registration_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistration {
    pub id: i32,
    pub event_id: i32,
    pub user_id: i32,
    pub attendee_name: String,
    pub attendee_email: String,
    pub attendee_phone: Option<String>,
    pub additional_info: Option<String>,
    pub status: RegistrationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub business_id: i32,
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_hybrid: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub venue: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    #[serde(default = "default_state")]
    pub state: String,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub virtual_url: Option<String>,
    pub max_attendees: Option<i32>,
    pub price: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub registration_required: bool,
    pub registration_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image: Option<String>,
}

fn default_state() -> String {
    "MN".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub is_virtual: Option<bool>,
    pub is_hybrid: Option<bool>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    pub venue: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub virtual_url: Option<String>,
    pub max_attendees: Option<i32>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub registration_required: Option<bool>,
    pub registration_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
    pub attendee_phone: Option<String>,
    pub additional_info: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_status_wire_format() {
        assert_eq!(EventStatus::Published.to_string(), "PUBLISHED");
        assert_eq!(
            EventStatus::from_str("cancelled").unwrap(),
            EventStatus::Cancelled
        );
        assert_eq!(EventStatus::from("bogus".to_string()), EventStatus::Draft);
    }
}
