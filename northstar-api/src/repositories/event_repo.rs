use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::event::{
    Event, EventRegistration, EventStatus, EventUpdate, EventWithCount, NewEvent,
    NewRegistration,
};

use super::business_repo::EventRow;
use super::repo_error::RepositoryError;

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_event(&self, id: i32) -> Result<Event, RepositoryError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, business_id, slug, title, description, short_description,
                   status, is_virtual, is_hybrid, start_date, end_date, venue,
                   street_address, city, state, zip_code, latitude, longitude,
                   virtual_url, max_attendees, price, currency,
                   registration_required, registration_url, tags, image,
                   created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("event {id}")))?;

        Ok(row.into_event())
    }

    pub async fn get_with_count(&self, id: i32) -> Result<EventWithCount, RepositoryError> {
        let event = self.get_event(id).await?;
        let registration_count = self.registration_count(id).await?;
        Ok(EventWithCount {
            event,
            registration_count,
        })
    }

    pub async fn insert_event(
        &self,
        slug: &str,
        new: &NewEvent,
    ) -> Result<Event, RepositoryError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (business_id, slug, title, description,
                                short_description, status, is_virtual, is_hybrid,
                                start_date, end_date, venue, street_address, city,
                                state, zip_code, latitude, longitude, virtual_url,
                                max_attendees, price, currency,
                                registration_required, registration_url, tags, image)
            VALUES ($1, $2, $3, $4, $5, 'DRAFT', $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            RETURNING id, business_id, slug, title, description, short_description,
                      status, is_virtual, is_hybrid, start_date, end_date, venue,
                      street_address, city, state, zip_code, latitude, longitude,
                      virtual_url, max_attendees, price, currency,
                      registration_required, registration_url, tags, image,
                      created_at, updated_at
            "#,
        )
        .bind(new.business_id)
        .bind(slug)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.short_description)
        .bind(new.is_virtual)
        .bind(new.is_hybrid)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.venue)
        .bind(&new.street_address)
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.zip_code)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(&new.virtual_url)
        .bind(new.max_attendees)
        .bind(new.price)
        .bind(&new.currency)
        .bind(new.registration_required)
        .bind(&new.registration_url)
        .bind(&new.tags)
        .bind(&new.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_event())
    }

    pub async fn update_event(
        &self,
        id: i32,
        update: &EventUpdate,
    ) -> Result<Event, RepositoryError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                short_description = COALESCE($4, short_description),
                is_virtual = COALESCE($5, is_virtual),
                is_hybrid = COALESCE($6, is_hybrid),
                start_date = COALESCE($7, start_date),
                end_date = COALESCE($8, end_date),
                venue = COALESCE($9, venue),
                street_address = COALESCE($10, street_address),
                city = COALESCE($11, city),
                state = COALESCE($12, state),
                zip_code = COALESCE($13, zip_code),
                latitude = COALESCE($14, latitude),
                longitude = COALESCE($15, longitude),
                virtual_url = COALESCE($16, virtual_url),
                max_attendees = COALESCE($17, max_attendees),
                price = COALESCE($18, price),
                currency = COALESCE($19, currency),
                registration_required = COALESCE($20, registration_required),
                registration_url = COALESCE($21, registration_url),
                tags = COALESCE($22, tags),
                image = COALESCE($23, image),
                updated_at = now()
            WHERE id = $1
            RETURNING id, business_id, slug, title, description, short_description,
                      status, is_virtual, is_hybrid, start_date, end_date, venue,
                      street_address, city, state, zip_code, latitude, longitude,
                      virtual_url, max_attendees, price, currency,
                      registration_required, registration_url, tags, image,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.short_description)
        .bind(update.is_virtual)
        .bind(update.is_hybrid)
        .bind(update.start_date)
        .bind(update.end_date)
        .bind(&update.venue)
        .bind(&update.street_address)
        .bind(&update.city)
        .bind(&update.state)
        .bind(&update.zip_code)
        .bind(update.latitude)
        .bind(update.longitude)
        .bind(&update.virtual_url)
        .bind(update.max_attendees)
        .bind(update.price)
        .bind(&update.currency)
        .bind(update.registration_required)
        .bind(&update.registration_url)
        .bind(&update.tags)
        .bind(&update.image)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("event {id}")))?;

        Ok(row.into_event())
    }

    pub async fn set_status(
        &self,
        id: i32,
        status: EventStatus,
    ) -> Result<Event, RepositoryError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, business_id, slug, title, description, short_description,
                      status, is_virtual, is_hybrid, start_date, end_date, venue,
                      street_address, city, state, zip_code, latitude, longitude,
                      virtual_url, max_attendees, price, currency,
                      registration_required, registration_url, tags, image,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("event {id}")))?;

        Ok(row.into_event())
    }

    pub async fn delete_event(&self, id: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("event {id}")));
        }
        Ok(())
    }

    pub async fn registration_count(&self, event_id: i32) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM event_registrations
            WHERE event_id = $1 AND status = 'CONFIRMED'
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn find_registration(
        &self,
        event_id: i32,
        user_id: i32,
    ) -> Result<Option<EventRegistration>, RepositoryError> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, event_id, user_id, attendee_name, attendee_email,
                   attendee_phone, additional_info, status, created_at
            FROM event_registrations
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RegistrationRow::into_registration))
    }

    /// Insert a confirmed registration, or revive a previously cancelled one.
    pub async fn insert_registration(
        &self,
        event_id: i32,
        user_id: i32,
        attendee_name: &str,
        attendee_email: &str,
        extra: &NewRegistration,
    ) -> Result<EventRegistration, RepositoryError> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            INSERT INTO event_registrations (event_id, user_id, attendee_name,
                                             attendee_email, attendee_phone,
                                             additional_info, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'CONFIRMED')
            ON CONFLICT (event_id, user_id)
            DO UPDATE SET status = 'CONFIRMED',
                          attendee_name = EXCLUDED.attendee_name,
                          attendee_email = EXCLUDED.attendee_email,
                          attendee_phone = EXCLUDED.attendee_phone,
                          additional_info = EXCLUDED.additional_info
            RETURNING id, event_id, user_id, attendee_name, attendee_email,
                      attendee_phone, additional_info, status, created_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(attendee_name)
        .bind(attendee_email)
        .bind(&extra.attendee_phone)
        .bind(&extra.additional_info)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_registration())
    }

    pub async fn cancel_registration(
        &self,
        event_id: i32,
        user_id: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE event_registrations
            SET status = 'CANCELLED'
            WHERE event_id = $1 AND user_id = $2 AND status = 'CONFIRMED'
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "registration for event {event_id}"
            )));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct RegistrationRow {
    id: i32,
    event_id: i32,
    user_id: i32,
    attendee_name: String,
    attendee_email: String,
    attendee_phone: Option<String>,
    additional_info: Option<String>,
    status: String,
    created_at: OffsetDateTime,
}

impl RegistrationRow {
    fn into_registration(self) -> EventRegistration {
        EventRegistration {
            id: self.id,
            event_id: self.event_id,
            user_id: self.user_id,
            attendee_name: self.attendee_name,
            attendee_email: self.attendee_email,
            attendee_phone: self.attendee_phone,
            additional_info: self.additional_info,
            status: self.status.into(),
            created_at: self.created_at,
        }
    }
}
