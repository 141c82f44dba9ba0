//! PostgreSQL-backed candidate repository.

use std::collections::HashMap;

use async_trait::async_trait;
use itertools::Itertools;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::category::CategoryRef;
use crate::domain::event::{Event, EventWithCount};
use crate::repositories::RepositoryError;

use super::super::types::{BusinessCandidate, CandidateFilter, CandidateLocation, EventFilter};
use super::CandidateRepository;

/// Fetches candidate supersets with review aggregates attached. Each filter
/// field is an optional bind so the SQL stays static; omitted fields
/// collapse to `TRUE` in the predicate.
#[derive(Clone)]
pub struct PgCandidateRepository {
    pool: PgPool,
}

impl PgCandidateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_associations(
        &self,
        rows: Vec<BusinessRow>,
    ) -> Result<Vec<BusinessCandidate>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let locations = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT business_id, city, state, latitude, longitude, is_primary
            FROM locations
            WHERE business_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let categories = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT bc.business_id, c.id, c.slug, c.name, bc.is_primary
            FROM business_categories bc
            JOIN categories c ON c.id = bc.category_id
            WHERE bc.business_id = ANY($1)
            ORDER BY bc.is_primary DESC, c.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut locations_by_business: HashMap<i32, Vec<CandidateLocation>> = locations
            .into_iter()
            .map(|row| {
                (
                    row.business_id,
                    CandidateLocation {
                        city: row.city,
                        state: row.state,
                        latitude: row.latitude,
                        longitude: row.longitude,
                        is_primary: row.is_primary,
                    },
                )
            })
            .into_group_map();

        let mut categories_by_business: HashMap<i32, Vec<CategoryRef>> = categories
            .into_iter()
            .map(|row| {
                (
                    row.business_id,
                    CategoryRef {
                        id: row.id,
                        slug: row.slug,
                        name: row.name,
                        is_primary: row.is_primary,
                    },
                )
            })
            .into_group_map();

        Ok(rows
            .into_iter()
            .map(|row| {
                let locations = locations_by_business.remove(&row.id).unwrap_or_default();
                let categories = categories_by_business.remove(&row.id).unwrap_or_default();
                row.into_candidate(locations, categories)
            })
            .collect())
    }
}

#[async_trait]
impl CandidateRepository for PgCandidateRepository {
    async fn fetch_businesses(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<BusinessCandidate>, RepositoryError> {
        let rows = sqlx::query_as::<_, BusinessRow>(
            r#"
            SELECT b.id, b.slug, b.name, b.description, b.short_description,
                   b.status, b.verified, b.featured, b.created_at,
                   AVG(r.rating)::float8 AS average_rating,
                   COUNT(r.id) AS review_count
            FROM businesses b
            LEFT JOIN reviews r ON r.business_id = b.id AND r.status = 'APPROVED'
            WHERE ($1::text IS NULL OR b.status = $1)
              AND ($2::bool IS NULL OR b.featured = $2)
              AND ($3::bool IS NULL OR b.verified = $3)
              AND ($4::int IS NULL OR b.id <> $4)
              AND ($5::int IS NULL OR EXISTS (
                    SELECT 1 FROM business_categories bc
                    WHERE bc.business_id = b.id AND bc.category_id = $5))
              AND ($6::text IS NULL
                   OR b.name ILIKE '%' || $6 || '%'
                   OR b.description ILIKE '%' || $6 || '%')
              AND ($7::text IS NULL OR EXISTS (
                    SELECT 1 FROM locations l
                    WHERE l.business_id = b.id AND l.city ILIKE '%' || $7 || '%'))
              AND ((COALESCE(array_length($8::text[], 1), 0) = 0
                    AND COALESCE(array_length($9::text[], 1), 0) = 0)
                   OR EXISTS (
                        SELECT 1 FROM unnest($8::text[]) AS term
                        WHERE b.name ILIKE '%' || term || '%'
                           OR b.description ILIKE '%' || term || '%'
                           OR b.short_description ILIKE '%' || term || '%')
                   OR EXISTS (
                        SELECT 1 FROM business_categories bc
                        JOIN categories c ON c.id = bc.category_id
                        WHERE bc.business_id = b.id
                          AND lower(c.name) = ANY (
                              SELECT lower(t) FROM unnest($9::text[]) AS t)))
            GROUP BY b.id
            ORDER BY b.id
            LIMIT $10::bigint
            "#,
        )
        .bind(filter.status.map(|s| s.to_string()))
        .bind(filter.featured)
        .bind(filter.verified)
        .bind(filter.exclude_id)
        .bind(filter.category_id)
        .bind(filter.text.as_deref())
        .bind(filter.city.as_deref())
        .bind(&filter.terms)
        .bind(&filter.category_names)
        .bind(filter.fetch_limit)
        .fetch_all(&self.pool)
        .await?;

        self.attach_associations(rows).await
    }

    async fn fetch_business(
        &self,
        id: i32,
    ) -> Result<Option<BusinessCandidate>, RepositoryError> {
        let row = sqlx::query_as::<_, BusinessRow>(
            r#"
            SELECT b.id, b.slug, b.name, b.description, b.short_description,
                   b.status, b.verified, b.featured, b.created_at,
                   AVG(r.rating)::float8 AS average_rating,
                   COUNT(r.id) AS review_count
            FROM businesses b
            LEFT JOIN reviews r ON r.business_id = b.id AND r.status = 'APPROVED'
            WHERE b.id = $1
            GROUP BY b.id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_associations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn fetch_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<EventWithCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT e.id, e.business_id, e.slug, e.title, e.description,
                   e.short_description, e.status, e.is_virtual, e.is_hybrid,
                   e.start_date, e.end_date, e.venue, e.street_address, e.city,
                   e.state, e.zip_code, e.latitude, e.longitude, e.virtual_url,
                   e.max_attendees, e.price, e.currency, e.registration_required,
                   e.registration_url, e.tags, e.image, e.created_at, e.updated_at,
                   COUNT(er.id) FILTER (WHERE er.status = 'CONFIRMED') AS registration_count
            FROM events e
            LEFT JOIN event_registrations er ON er.event_id = e.id
            WHERE ($1::text IS NULL OR e.status = $1)
              AND ($2::int IS NULL OR e.business_id = $2)
              AND ($3::bool IS NULL OR e.is_virtual = $3)
              AND ($4::bool IS NULL OR e.is_hybrid = $4)
              AND ($5::timestamptz IS NULL OR e.start_date >= $5)
              AND ($6::timestamptz IS NULL OR e.end_date <= $6)
              AND ($7::text IS NULL
                   OR e.title ILIKE '%' || $7 || '%'
                   OR e.description ILIKE '%' || $7 || '%')
              AND ($8::text IS NULL OR e.city ILIKE '%' || $8 || '%')
            GROUP BY e.id
            ORDER BY e.id
            "#,
        )
        .bind(filter.status.map(|s| s.to_string()))
        .bind(filter.business_id)
        .bind(filter.is_virtual)
        .bind(filter.is_hybrid)
        .bind(filter.starts_after)
        .bind(filter.ends_before)
        .bind(filter.text.as_deref())
        .bind(filter.city.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EventRow::into_entry).collect())
    }
}

#[derive(sqlx::FromRow)]
struct BusinessRow {
    id: i32,
    slug: String,
    name: String,
    description: Option<String>,
    short_description: Option<String>,
    status: String,
    verified: bool,
    featured: bool,
    created_at: OffsetDateTime,
    average_rating: Option<f64>,
    review_count: i64,
}

impl BusinessRow {
    fn into_candidate(
        self,
        locations: Vec<CandidateLocation>,
        categories: Vec<CategoryRef>,
    ) -> BusinessCandidate {
        BusinessCandidate {
            id: self.id,
            slug: self.slug,
            name: self.name,
            description: self.description,
            short_description: self.short_description,
            status: self.status.into(),
            verified: self.verified,
            featured: self.featured,
            categories,
            locations,
            average_rating: self.average_rating,
            review_count: self.review_count,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    business_id: i32,
    city: String,
    state: String,
    latitude: f64,
    longitude: f64,
    is_primary: bool,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    business_id: i32,
    id: i32,
    slug: String,
    name: String,
    is_primary: bool,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i32,
    business_id: i32,
    slug: String,
    title: String,
    description: String,
    short_description: Option<String>,
    status: String,
    is_virtual: bool,
    is_hybrid: bool,
    start_date: OffsetDateTime,
    end_date: OffsetDateTime,
    venue: Option<String>,
    street_address: Option<String>,
    city: Option<String>,
    state: String,
    zip_code: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    virtual_url: Option<String>,
    max_attendees: Option<i32>,
    price: Option<f64>,
    currency: String,
    registration_required: bool,
    registration_url: Option<String>,
    tags: Vec<String>,
    image: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    registration_count: i64,
}

impl EventRow {
    fn into_entry(self) -> EventWithCount {
        EventWithCount {
            event: Event {
                id: self.id,
                business_id: self.business_id,
                slug: self.slug,
                title: self.title,
                description: self.description,
                short_description: self.short_description,
                status: self.status.into(),
                is_virtual: self.is_virtual,
                is_hybrid: self.is_hybrid,
                start_date: self.start_date,
                end_date: self.end_date,
                venue: self.venue,
                street_address: self.street_address,
                city: self.city,
                state: self.state,
                zip_code: self.zip_code,
                latitude: self.latitude,
                longitude: self.longitude,
                virtual_url: self.virtual_url,
                max_attendees: self.max_attendees,
                price: self.price,
                currency: self.currency,
                registration_required: self.registration_required,
                registration_url: self.registration_url,
                tags: self.tags,
                image: self.image,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            registration_count: self.registration_count,
        }
    }
}
