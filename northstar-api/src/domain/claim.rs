use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use super::business::{Business, Location};
use super::category::CategoryRef;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
    Expired,
}

impl From<String> for ClaimStatus {
    fn from(value: String) -> Self {
        Self::from_str(&value).unwrap_or(Self::Pending)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationType {
    Email,
    Phone,
    Document,
    PhysicalMail,
}

impl From<String> for VerificationType {
    fn from(value: String) -> Self {
        Self::from_str(&value).unwrap_or(Self::Document)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: i32,
    pub business_id: i32,
    pub user_id: i32,
    pub status: ClaimStatus,
    pub verification_type: VerificationType,
    pub verification_data: Option<String>,
    pub documents: Vec<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub reviewed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimBusinessRef {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimUserRef {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Claim row as shown in the admin console listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSummary {
    #[serde(flatten)]
    pub claim: Claim,
    pub business: ClaimBusinessRef,
    pub user: ClaimUserRef,
}

/// Single claim with the full business context an admin reviews against.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDetail {
    #[serde(flatten)]
    pub claim: Claim,
    pub business: Business,
    pub locations: Vec<Location>,
    pub categories: Vec<CategoryRef>,
    pub user: ClaimUserRef,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub recent_claims: Vec<ClaimSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClaim {
    pub verification_type: VerificationType,
    pub verification_data: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_status_wire_format() {
        assert_eq!(ClaimStatus::InReview.to_string(), "IN_REVIEW");
        assert_eq!(
            VerificationType::PhysicalMail.to_string(),
            "PHYSICAL_MAIL"
        );
        assert_eq!(
            VerificationType::from_str("physical_mail").unwrap(),
            VerificationType::PhysicalMail
        );
    }
}
