use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::business::{
    Business, BusinessDetail, BusinessUpdate, Location, NewBusiness,
};
use crate::domain::category::CategoryRef;
use crate::domain::event::Event;
use crate::domain::review::{Review, ReviewAuthor, ReviewWithAuthor};

use super::repo_error::RepositoryError;

#[derive(Clone)]
pub struct BusinessRepository {
    pool: PgPool,
}

impl BusinessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_business(&self, id: i32) -> Result<Business, RepositoryError> {
        let row = sqlx::query_as::<_, BusinessRow>(
            r#"
            SELECT id, slug, name, description, short_description, website, email,
                   phone, year_established, status, verified, featured, claimed_by,
                   created_at, updated_at
            FROM businesses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("business {id}")))?;

        Ok(row.into_business())
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM businesses WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Everything the public detail page shows: locations, categories, the
    /// ten latest approved reviews, five upcoming published events, and
    /// review aggregates.
    pub async fn get_detail(&self, slug: &str) -> Result<BusinessDetail, RepositoryError> {
        let business = sqlx::query_as::<_, BusinessRow>(
            r#"
            SELECT id, slug, name, description, short_description, website, email,
                   phone, year_established, status, verified, featured, claimed_by,
                   created_at, updated_at
            FROM businesses
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("business {slug}")))?
        .into_business();

        let locations = self.locations_for(business.id).await?;
        let categories = self.categories_for(business.id).await?;

        let reviews = sqlx::query_as::<_, ReviewWithAuthorRow>(
            r#"
            SELECT r.id, r.business_id, r.user_id, r.rating, r.title, r.comment,
                   r.visit_date, r.recommends_business, r.images, r.status,
                   r.created_at, r.edited_at,
                   u.full_name AS author_name, u.picture AS author_picture
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.business_id = $1 AND r.status = 'APPROVED'
            ORDER BY r.created_at DESC
            LIMIT 10
            "#,
        )
        .bind(business.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ReviewWithAuthorRow::into_review)
        .collect();

        let upcoming_events = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, business_id, slug, title, description, short_description,
                   status, is_virtual, is_hybrid, start_date, end_date, venue,
                   street_address, city, state, zip_code, latitude, longitude,
                   virtual_url, max_attendees, price, currency,
                   registration_required, registration_url, tags, image,
                   created_at, updated_at
            FROM events
            WHERE business_id = $1 AND status = 'PUBLISHED' AND start_date >= now()
            ORDER BY start_date
            LIMIT 5
            "#,
        )
        .bind(business.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(EventRow::into_event)
        .collect();

        let (average_rating, review_count): (Option<f64>, i64) = sqlx::query_as(
            r#"
            SELECT AVG(rating)::float8, COUNT(*)
            FROM reviews
            WHERE business_id = $1 AND status = 'APPROVED'
            "#,
        )
        .bind(business.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(BusinessDetail {
            business,
            locations,
            categories,
            reviews,
            upcoming_events,
            average_rating,
            review_count,
        })
    }

    /// Create a business as `PENDING`, owned by its creator. The first
    /// category and the single location are primary.
    pub async fn insert_business(
        &self,
        owner_id: i32,
        slug: &str,
        new: &NewBusiness,
    ) -> Result<Business, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let business = sqlx::query_as::<_, BusinessRow>(
            r#"
            INSERT INTO businesses (slug, name, description, short_description,
                                    website, email, phone, year_established,
                                    status, claimed_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'PENDING', $9)
            RETURNING id, slug, name, description, short_description, website,
                      email, phone, year_established, status, verified, featured,
                      claimed_by, created_at, updated_at
            "#,
        )
        .bind(slug)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.short_description)
        .bind(&new.website)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.year_established)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?
        .into_business();

        for (index, category_id) in new.category_ids.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO business_categories (business_id, category_id, is_primary)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(business.id)
            .bind(category_id)
            .bind(index == 0)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO locations (business_id, street_address, street_address_2,
                                   city, state, zip_code, latitude, longitude,
                                   is_primary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
            "#,
        )
        .bind(business.id)
        .bind(&new.location.street_address)
        .bind(&new.location.street_address_2)
        .bind(&new.location.city)
        .bind(&new.location.state)
        .bind(&new.location.zip_code)
        .bind(new.location.latitude)
        .bind(new.location.longitude)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(business)
    }

    pub async fn update_business(
        &self,
        id: i32,
        update: &BusinessUpdate,
    ) -> Result<Business, RepositoryError> {
        let row = sqlx::query_as::<_, BusinessRow>(
            r#"
            UPDATE businesses
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                short_description = COALESCE($4, short_description),
                website = COALESCE($5, website),
                email = COALESCE($6, email),
                phone = COALESCE($7, phone),
                year_established = COALESCE($8, year_established),
                updated_at = now()
            WHERE id = $1
            RETURNING id, slug, name, description, short_description, website,
                      email, phone, year_established, status, verified, featured,
                      claimed_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.short_description)
        .bind(&update.website)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(update.year_established)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("business {id}")))?;

        Ok(row.into_business())
    }

    pub async fn delete_business(&self, id: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM businesses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("business {id}")));
        }
        Ok(())
    }

    pub async fn locations_for(&self, business_id: i32) -> Result<Vec<Location>, RepositoryError> {
        let locations = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT id, business_id, street_address, street_address_2, city, state,
                   zip_code, latitude, longitude, is_primary
            FROM locations
            WHERE business_id = $1
            ORDER BY is_primary DESC, id
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations.into_iter().map(LocationRow::into_location).collect())
    }

    pub async fn categories_for(
        &self,
        business_id: i32,
    ) -> Result<Vec<CategoryRef>, RepositoryError> {
        let categories = sqlx::query_as::<_, CategoryRefRow>(
            r#"
            SELECT c.id, c.slug, c.name, bc.is_primary
            FROM business_categories bc
            JOIN categories c ON c.id = bc.category_id
            WHERE bc.business_id = $1
            ORDER BY bc.is_primary DESC, c.id
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories
            .into_iter()
            .map(|row| CategoryRef {
                id: row.id,
                slug: row.slug,
                name: row.name,
                is_primary: row.is_primary,
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct BusinessRow {
    id: i32,
    slug: String,
    name: String,
    description: Option<String>,
    short_description: Option<String>,
    website: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    year_established: Option<i32>,
    status: String,
    verified: bool,
    featured: bool,
    claimed_by: Option<i32>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl BusinessRow {
    fn into_business(self) -> Business {
        Business {
            id: self.id,
            slug: self.slug,
            name: self.name,
            description: self.description,
            short_description: self.short_description,
            website: self.website,
            email: self.email,
            phone: self.phone,
            year_established: self.year_established,
            status: self.status.into(),
            verified: self.verified,
            featured: self.featured,
            claimed_by: self.claimed_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    id: i32,
    business_id: i32,
    street_address: String,
    street_address_2: Option<String>,
    city: String,
    state: String,
    zip_code: String,
    latitude: f64,
    longitude: f64,
    is_primary: bool,
}

impl LocationRow {
    fn into_location(self) -> Location {
        Location {
            id: self.id,
            business_id: self.business_id,
            street_address: self.street_address,
            street_address_2: self.street_address_2,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            latitude: self.latitude,
            longitude: self.longitude,
            is_primary: self.is_primary,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRefRow {
    id: i32,
    slug: String,
    name: String,
    is_primary: bool,
}

#[derive(sqlx::FromRow)]
struct ReviewWithAuthorRow {
    id: i32,
    business_id: i32,
    user_id: i32,
    rating: i32,
    title: String,
    comment: String,
    visit_date: Option<time::Date>,
    recommends_business: Option<bool>,
    images: Vec<String>,
    status: String,
    created_at: OffsetDateTime,
    edited_at: Option<OffsetDateTime>,
    author_name: String,
    author_picture: Option<String>,
}

impl ReviewWithAuthorRow {
    fn into_review(self) -> ReviewWithAuthor {
        ReviewWithAuthor {
            user: ReviewAuthor {
                id: self.user_id,
                name: self.author_name,
                picture: self.author_picture,
            },
            review: Review {
                id: self.id,
                business_id: self.business_id,
                user_id: self.user_id,
                rating: self.rating,
                title: self.title,
                comment: self.comment,
                visit_date: self.visit_date,
                recommends_business: self.recommends_business,
                images: self.images,
                status: self.status.into(),
                created_at: self.created_at,
                edited_at: self.edited_at,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct EventRow {
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
}

impl EventRow {
    pub(crate) fn into_event(self) -> Event {
        Event {
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
        }
    }
}
