//! Validation of raw search parameters into typed queries.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::domain::business::BusinessStatus;
use crate::domain::event::EventStatus;

use super::geo::{GeoFilter, GeoPoint};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MIN_RADIUS_MILES: f64 = 1.0;
pub const MAX_RADIUS_MILES: f64 = 100.0;
pub const MAX_AI_QUERY_LENGTH: usize = 500;
pub const MAX_AI_RESULTS: u32 = 50;

/// Malformed or out-of-range query parameters, by field name.
#[derive(Debug, Clone, Error)]
#[error("Invalid query parameters: {}", fields.join(", "))]
pub struct ValidationError {
    pub fields: Vec<String>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>) -> Self {
        Self {
            fields: vec![field.into()],
        }
    }
}

/// Business search parameters exactly as they arrive on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchParams {
    pub query: Option<String>,
    pub category_id: Option<String>,
    pub city: Option<String>,
    pub status: Option<String>,
    pub featured: Option<String>,
    pub verified: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    pub enhance: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SortKey {
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "createdAt")]
    CreatedAt,
    #[strum(serialize = "distance")]
    Distance,
    #[strum(serialize = "rating")]
    Rating,
    #[strum(serialize = "relevance")]
    Relevance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SortOrder {
    #[strum(serialize = "asc")]
    Asc,
    #[strum(serialize = "desc")]
    Desc,
}

/// A validated business search query.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub category_id: Option<i32>,
    pub city: Option<String>,
    pub status: Option<BusinessStatus>,
    pub featured: Option<bool>,
    pub verified: Option<bool>,
    pub geo: Option<GeoFilter>,
    pub enhance: bool,
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl SearchQuery {
    pub fn parse(params: RawSearchParams) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();

        let page = parse_bounded_int(params.page.as_deref(), 1, u32::MAX, 1, "page", &mut errors);
        let limit = parse_bounded_int(
            params.limit.as_deref(),
            1,
            MAX_PAGE_SIZE,
            DEFAULT_PAGE_SIZE,
            "limit",
            &mut errors,
        );

        let category_id = parse_optional(params.category_id.as_deref(), "categoryId", &mut errors);
        let status = parse_optional(params.status.as_deref(), "status", &mut errors);
        let featured = parse_optional(params.featured.as_deref(), "featured", &mut errors);
        let verified = parse_optional(params.verified.as_deref(), "verified", &mut errors);
        let enhance: Option<bool> = parse_optional(params.enhance.as_deref(), "enhance", &mut errors);

        let sort_by = parse_optional(params.sort_by.as_deref(), "sortBy", &mut errors)
            .unwrap_or(SortKey::Name);
        let sort_order = parse_optional(params.sort_order.as_deref(), "sortOrder", &mut errors)
            .unwrap_or(SortOrder::Asc);

        let geo = parse_geo(
            params.lat.as_deref(),
            params.lng.as_deref(),
            params.radius.as_deref(),
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(ValidationError { fields: errors });
        }

        Ok(Self {
            text: normalize_text(params.query),
            category_id,
            city: normalize_text(params.city),
            status,
            featured,
            verified,
            geo,
            enhance: enhance.unwrap_or(false),
            page,
            limit,
            sort_by,
            sort_order,
        })
    }
}

/// Event search parameters exactly as they arrive on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventSearchParams {
    pub query: Option<String>,
    pub business_id: Option<String>,
    pub is_virtual: Option<String>,
    pub is_hybrid: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub city: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum EventSortKey {
    #[strum(serialize = "startDate")]
    StartDate,
    #[strum(serialize = "createdAt")]
    CreatedAt,
    #[strum(serialize = "title")]
    Title,
}

/// A validated event search query.
#[derive(Debug, Clone)]
pub struct EventSearchQuery {
    pub text: Option<String>,
    pub business_id: Option<i32>,
    pub is_virtual: Option<bool>,
    pub is_hybrid: Option<bool>,
    pub status: Option<EventStatus>,
    pub starts_after: Option<OffsetDateTime>,
    pub ends_before: Option<OffsetDateTime>,
    pub city: Option<String>,
    pub geo: Option<GeoFilter>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: EventSortKey,
    pub sort_order: SortOrder,
}

impl EventSearchQuery {
    pub fn parse(params: RawEventSearchParams) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();

        let page = parse_bounded_int(params.page.as_deref(), 1, u32::MAX, 1, "page", &mut errors);
        let limit = parse_bounded_int(
            params.limit.as_deref(),
            1,
            MAX_PAGE_SIZE,
            DEFAULT_PAGE_SIZE,
            "limit",
            &mut errors,
        );

        let business_id = parse_optional(params.business_id.as_deref(), "businessId", &mut errors);
        let is_virtual = parse_optional(params.is_virtual.as_deref(), "isVirtual", &mut errors);
        let is_hybrid = parse_optional(params.is_hybrid.as_deref(), "isHybrid", &mut errors);
        let status = parse_optional(params.status.as_deref(), "status", &mut errors);

        let starts_after = parse_timestamp(params.start_date.as_deref(), "startDate", &mut errors);
        let ends_before = parse_timestamp(params.end_date.as_deref(), "endDate", &mut errors);

        let sort_by = parse_optional(params.sort_by.as_deref(), "sortBy", &mut errors)
            .unwrap_or(EventSortKey::StartDate);
        let sort_order = parse_optional(params.sort_order.as_deref(), "sortOrder", &mut errors)
            .unwrap_or(SortOrder::Asc);

        let geo = parse_geo(
            params.lat.as_deref(),
            params.lng.as_deref(),
            params.radius.as_deref(),
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(ValidationError { fields: errors });
        }

        Ok(Self {
            text: normalize_text(params.query),
            business_id,
            is_virtual,
            is_hybrid,
            status,
            starts_after,
            ends_before,
            city: normalize_text(params.city),
            geo,
            page,
            limit,
            sort_by,
            sort_order,
        })
    }
}

/// Body of the AI search endpoint before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSearchBody {
    pub query: String,
    #[serde(default = "default_true")]
    pub include_recommendations: bool,
    #[serde(default = "default_ai_limit")]
    pub limit: u32,
    pub user_context: Option<UserContext>,
}

fn default_true() -> bool {
    true
}

fn default_ai_limit() -> u32 {
    10
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserContext {
    pub industry: Option<String>,
    pub business_size: Option<String>,
    pub location: Option<String>,
    pub needs: Vec<String>,
}

/// A validated AI search request.
#[derive(Debug, Clone)]
pub struct AiSearchQuery {
    pub query: String,
    pub include_recommendations: bool,
    pub limit: u32,
    pub user_context: Option<UserContext>,
}

impl AiSearchBody {
    pub fn validate(self) -> Result<AiSearchQuery, ValidationError> {
        let mut errors = Vec::new();

        let query = self.query.trim().to_string();
        if query.is_empty() || query.len() > MAX_AI_QUERY_LENGTH {
            errors.push("query".to_string());
        }
        if self.limit < 1 || self.limit > MAX_AI_RESULTS {
            errors.push("limit".to_string());
        }

        if !errors.is_empty() {
            return Err(ValidationError { fields: errors });
        }

        Ok(AiSearchQuery {
            query,
            include_recommendations: self.include_recommendations,
            limit: self.limit,
            user_context: self.user_context,
        })
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_optional<T: FromStr>(
    value: Option<&str>,
    field: &str,
    errors: &mut Vec<String>,
) -> Option<T> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(field.to_string());
            None
        }
    }
}

fn parse_bounded_int(
    value: Option<&str>,
    min: u32,
    max: u32,
    default: u32,
    field: &str,
    errors: &mut Vec<String>,
) -> u32 {
    match parse_optional::<u32>(value, field, errors) {
        Some(parsed) if (min..=max).contains(&parsed) => parsed,
        Some(_) => {
            errors.push(field.to_string());
            default
        }
        None => default,
    }
}

fn parse_timestamp(
    value: Option<&str>,
    field: &str,
    errors: &mut Vec<String>,
) -> Option<OffsetDateTime> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(field.to_string());
            None
        }
    }
}

/// The geo point and radius must arrive together; partial combinations are
/// rejected with every missing field listed.
fn parse_geo(
    lat: Option<&str>,
    lng: Option<&str>,
    radius: Option<&str>,
    errors: &mut Vec<String>,
) -> Option<GeoFilter> {
    if lat.is_none() && lng.is_none() && radius.is_none() {
        return None;
    }

    if lat.is_none() {
        errors.push("lat".to_string());
    }
    if lng.is_none() {
        errors.push("lng".to_string());
    }
    if radius.is_none() {
        errors.push("radius".to_string());
    }

    let latitude = parse_optional::<f64>(lat, "lat", errors)
        .filter(|v| {
            let ok = (-90.0..=90.0).contains(v);
            if !ok {
                errors.push("lat".to_string());
            }
            ok
        })?;
    let longitude = parse_optional::<f64>(lng, "lng", errors)
        .filter(|v| {
            let ok = (-180.0..=180.0).contains(v);
            if !ok {
                errors.push("lng".to_string());
            }
            ok
        })?;
    let radius_miles = parse_optional::<f64>(radius, "radius", errors)
        .filter(|v| {
            let ok = (MIN_RADIUS_MILES..=MAX_RADIUS_MILES).contains(v);
            if !ok {
                errors.push("radius".to_string());
            }
            ok
        })?;

    Some(GeoFilter {
        center: GeoPoint::new(latitude, longitude),
        radius_miles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawSearchParams {
        let mut params = RawSearchParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "query" => params.query = value,
                "categoryId" => params.category_id = value,
                "city" => params.city = value,
                "status" => params.status = value,
                "featured" => params.featured = value,
                "verified" => params.verified = value,
                "lat" => params.lat = value,
                "lng" => params.lng = value,
                "radius" => params.radius = value,
                "page" => params.page = value,
                "limit" => params.limit = value,
                "sortBy" => params.sort_by = value,
                "sortOrder" => params.sort_order = value,
                other => panic!("unknown key {other}"),
            }
        }
        params
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let query = SearchQuery::parse(RawSearchParams::default()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(query.sort_by, SortKey::Name);
        assert_eq!(query.sort_order, SortOrder::Asc);
        assert!(query.geo.is_none());
        assert!(!query.enhance);
    }

    #[test]
    fn rejects_out_of_range_numbers_listing_fields() {
        let err = SearchQuery::parse(raw(&[("page", "0"), ("limit", "500")])).unwrap_err();
        assert!(err.fields.contains(&"page".to_string()));
        assert!(err.fields.contains(&"limit".to_string()));
    }

    #[test]
    fn rejects_non_numeric_page() {
        let err = SearchQuery::parse(raw(&[("page", "two")])).unwrap_err();
        assert_eq!(err.fields, vec!["page"]);
    }

    #[test]
    fn rejects_unknown_enum_values() {
        let err = SearchQuery::parse(raw(&[
            ("status", "LIVE"),
            ("sortBy", "slug"),
            ("sortOrder", "sideways"),
        ]))
        .unwrap_err();
        assert_eq!(err.fields, vec!["status", "sortBy", "sortOrder"]);
    }

    #[test]
    fn accepts_complete_geo_triple() {
        let query = SearchQuery::parse(raw(&[
            ("lat", "44.9778"),
            ("lng", "-93.2650"),
            ("radius", "10"),
        ]))
        .unwrap();
        let geo = query.geo.unwrap();
        assert_eq!(geo.radius_miles, 10.0);
        assert_eq!(geo.center.latitude, 44.9778);
    }

    #[test]
    fn rejects_partial_geo_parameters() {
        let err = SearchQuery::parse(raw(&[("lat", "44.9778")])).unwrap_err();
        assert!(err.fields.contains(&"lng".to_string()));
        assert!(err.fields.contains(&"radius".to_string()));
    }

    #[test]
    fn rejects_radius_outside_bounds() {
        for bad in ["0.5", "101"] {
            let err = SearchQuery::parse(raw(&[
                ("lat", "44.0"),
                ("lng", "-93.0"),
                ("radius", bad),
            ]))
            .unwrap_err();
            assert!(err.fields.contains(&"radius".to_string()));
        }
    }

    #[test]
    fn trims_and_drops_empty_text() {
        let query = SearchQuery::parse(raw(&[("query", "  "), ("city", " Duluth ")])).unwrap();
        assert_eq!(query.text, None);
        assert_eq!(query.city.as_deref(), Some("Duluth"));
    }

    #[test]
    fn event_query_parses_dates_and_sort() {
        let mut params = RawEventSearchParams::default();
        params.start_date = Some("2026-06-01T00:00:00Z".to_string());
        params.sort_by = Some("title".to_string());
        let query = EventSearchQuery::parse(params).unwrap();
        assert!(query.starts_after.is_some());
        assert_eq!(query.sort_by, EventSortKey::Title);
    }

    #[test]
    fn event_query_rejects_malformed_date() {
        let mut params = RawEventSearchParams::default();
        params.end_date = Some("next tuesday".to_string());
        let err = EventSearchQuery::parse(params).unwrap_err();
        assert_eq!(err.fields, vec!["endDate"]);
    }

    #[test]
    fn ai_body_bounds() {
        let body = AiSearchBody {
            query: "  AI consulting  ".to_string(),
            include_recommendations: true,
            limit: 10,
            user_context: None,
        };
        let validated = body.validate().unwrap();
        assert_eq!(validated.query, "AI consulting");

        let err = AiSearchBody {
            query: String::new(),
            include_recommendations: true,
            limit: 80,
            user_context: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.fields, vec!["query", "limit"]);
    }
}
