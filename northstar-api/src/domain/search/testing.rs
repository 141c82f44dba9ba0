//! Shared fixtures for search pipeline tests.

use time::macros::datetime;

use crate::domain::business::BusinessStatus;
use crate::domain::event::{Event, EventStatus, EventWithCount};

use super::types::{BusinessCandidate, CandidateLocation};

pub(crate) fn candidate(id: i32, name: &str) -> BusinessCandidate {
    BusinessCandidate {
        id,
        slug: name.to_lowercase().replace(' ', "-"),
        name: name.to_string(),
        description: None,
        short_description: None,
        status: BusinessStatus::Active,
        verified: false,
        featured: false,
        categories: vec![],
        locations: vec![],
        average_rating: None,
        review_count: 0,
        created_at: datetime!(2026-01-01 00:00 UTC),
    }
}

pub(crate) fn location(city: &str, latitude: f64, longitude: f64, is_primary: bool) -> CandidateLocation {
    CandidateLocation {
        city: city.to_string(),
        state: "MN".to_string(),
        latitude,
        longitude,
        is_primary,
    }
}

pub(crate) fn event(id: i32, title: &str) -> EventWithCount {
    EventWithCount {
        event: Event {
            id,
            business_id: 1,
            slug: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            description: "An event".to_string(),
            short_description: None,
            status: EventStatus::Published,
            is_virtual: false,
            is_hybrid: false,
            start_date: datetime!(2026-06-01 18:00 UTC),
            end_date: datetime!(2026-06-01 20:00 UTC),
            venue: None,
            street_address: None,
            city: None,
            state: "MN".to_string(),
            zip_code: None,
            latitude: None,
            longitude: None,
            virtual_url: None,
            max_attendees: None,
            price: None,
            currency: "USD".to_string(),
            registration_required: false,
            registration_url: None,
            tags: vec![],
            image: None,
            created_at: datetime!(2026-01-01 00:00 UTC),
            updated_at: datetime!(2026-01-01 00:00 UTC),
        },
        registration_count: 0,
    }
}
