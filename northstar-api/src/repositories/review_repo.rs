use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::review::{
    NewReview, Review, ReviewAuthor, ReviewResponseEntry, ReviewSort, ReviewUpdate,
    ReviewWithMeta,
};

use super::repo_error::RepositoryError;

#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Approved reviews for a business, with author, owner response, and
    /// vote counts, paginated at the database.
    pub async fn list_for_business(
        &self,
        business_id: i32,
        sort: ReviewSort,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<ReviewWithMeta>, i64), RepositoryError> {
        // sort key fragments are fixed strings, never user input
        let order_by = match sort {
            ReviewSort::Recent => "r.created_at DESC",
            ReviewSort::RatingHigh => "r.rating DESC, r.created_at DESC",
            ReviewSort::RatingLow => "r.rating ASC, r.created_at DESC",
            ReviewSort::Helpful => "helpful_votes DESC, r.created_at DESC",
        };

        let sql = format!(
            r#"
            SELECT r.id, r.business_id, r.user_id, r.rating, r.title, r.comment,
                   r.visit_date, r.recommends_business, r.images, r.status,
                   r.created_at, r.edited_at,
                   u.full_name AS author_name, u.picture AS author_picture,
                   resp.id AS response_id, resp.comment AS response_comment,
                   resp.created_at AS response_created_at,
                   resp.user_id AS responder_id,
                   ru.full_name AS responder_name, ru.picture AS responder_picture,
                   COUNT(v.*) FILTER (WHERE v.is_helpful) AS helpful_votes,
                   COUNT(v.*) AS total_votes
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            LEFT JOIN review_responses resp ON resp.review_id = r.id
            LEFT JOIN users ru ON ru.id = resp.user_id
            LEFT JOIN review_votes v ON v.review_id = r.id
            WHERE r.business_id = $1 AND r.status = 'APPROVED'
            GROUP BY r.id, u.id, resp.id, ru.id
            ORDER BY {order_by}
            LIMIT $2 OFFSET $3
            "#
        );

        let rows = sqlx::query_as::<_, ReviewMetaRow>(&sql)
            .bind(business_id)
            .bind(i64::from(limit))
            .bind(i64::from(page.saturating_sub(1)) * i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM reviews
            WHERE business_id = $1 AND status = 'APPROVED'
            "#,
        )
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((
            rows.into_iter().map(ReviewMetaRow::into_review).collect(),
            total,
        ))
    }

    /// `(rating, recommends)` pairs of approved reviews, feeding the stats
    /// aggregation.
    pub async fn rating_rows(
        &self,
        business_id: i32,
    ) -> Result<Vec<(i32, Option<bool>)>, RepositoryError> {
        let rows: Vec<(i32, Option<bool>)> = sqlx::query_as(
            r#"
            SELECT rating, recommends_business
            FROM reviews
            WHERE business_id = $1 AND status = 'APPROVED'
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_review(&self, id: i32) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, business_id, user_id, rating, title, comment, visit_date,
                   recommends_business, images, status, created_at, edited_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("review {id}")))?;

        Ok(row.into_review())
    }

    pub async fn user_has_reviewed(
        &self,
        user_id: i32,
        business_id: i32,
    ) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM reviews WHERE user_id = $1 AND business_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Reviews go live immediately; moderation happens after the fact.
    pub async fn insert_review(
        &self,
        user_id: i32,
        new: &NewReview,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (business_id, user_id, rating, title, comment,
                                 visit_date, recommends_business, images, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'APPROVED')
            RETURNING id, business_id, user_id, rating, title, comment, visit_date,
                      recommends_business, images, status, created_at, edited_at
            "#,
        )
        .bind(new.business_id)
        .bind(user_id)
        .bind(new.rating)
        .bind(&new.title)
        .bind(&new.comment)
        .bind(new.visit_date)
        .bind(new.recommends_business)
        .bind(&new.images)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_review())
    }

    pub async fn update_review(
        &self,
        id: i32,
        update: &ReviewUpdate,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            UPDATE reviews
            SET rating = COALESCE($2, rating),
                title = COALESCE($3, title),
                comment = COALESCE($4, comment),
                visit_date = COALESCE($5, visit_date),
                recommends_business = COALESCE($6, recommends_business),
                images = COALESCE($7, images),
                edited_at = now()
            WHERE id = $1
            RETURNING id, business_id, user_id, rating, title, comment, visit_date,
                      recommends_business, images, status, created_at, edited_at
            "#,
        )
        .bind(id)
        .bind(update.rating)
        .bind(&update.title)
        .bind(&update.comment)
        .bind(update.visit_date)
        .bind(update.recommends_business)
        .bind(&update.images)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("review {id}")))?;

        Ok(row.into_review())
    }

    pub async fn delete_review(&self, id: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("review {id}")));
        }
        Ok(())
    }

    /// One vote per user per review; re-voting flips the existing vote.
    pub async fn upsert_vote(
        &self,
        review_id: i32,
        user_id: i32,
        is_helpful: bool,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO review_votes (review_id, user_id, is_helpful)
            VALUES ($1, $2, $3)
            ON CONFLICT (review_id, user_id)
            DO UPDATE SET is_helpful = EXCLUDED.is_helpful
            "#,
        )
        .bind(review_id)
        .bind(user_id)
        .bind(is_helpful)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn has_response(&self, review_id: i32) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM review_responses WHERE review_id = $1)",
        )
        .bind(review_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn insert_response(
        &self,
        review_id: i32,
        user_id: i32,
        comment: &str,
    ) -> Result<ReviewResponseEntry, RepositoryError> {
        let row = sqlx::query_as::<_, ResponseRow>(
            r#"
            WITH inserted AS (
                INSERT INTO review_responses (review_id, user_id, comment)
                VALUES ($1, $2, $3)
                RETURNING id, user_id, comment, created_at
            )
            SELECT i.id, i.comment, i.created_at, i.user_id,
                   u.full_name AS responder_name, u.picture AS responder_picture
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(review_id)
        .bind(user_id)
        .bind(comment)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_entry())
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
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
}

impl ReviewRow {
    fn into_review(self) -> Review {
        Review {
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
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewMetaRow {
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
    response_id: Option<i32>,
    response_comment: Option<String>,
    response_created_at: Option<OffsetDateTime>,
    responder_id: Option<i32>,
    responder_name: Option<String>,
    responder_picture: Option<String>,
    helpful_votes: i64,
    total_votes: i64,
}

impl ReviewMetaRow {
    fn into_review(self) -> ReviewWithMeta {
        let response = match (
            self.response_id,
            self.response_comment,
            self.response_created_at,
            self.responder_id,
        ) {
            (Some(id), Some(comment), Some(created_at), Some(responder_id)) => {
                Some(ReviewResponseEntry {
                    id,
                    comment,
                    created_at,
                    user: ReviewAuthor {
                        id: responder_id,
                        name: self.responder_name.unwrap_or_default(),
                        picture: self.responder_picture,
                    },
                })
            }
            _ => None,
        };

        ReviewWithMeta {
            user: ReviewAuthor {
                id: self.user_id,
                name: self.author_name,
                picture: self.author_picture,
            },
            response,
            helpful_votes: self.helpful_votes,
            total_votes: self.total_votes,
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
struct ResponseRow {
    id: i32,
    comment: String,
    created_at: OffsetDateTime,
    user_id: i32,
    responder_name: String,
    responder_picture: Option<String>,
}

impl ResponseRow {
    fn into_entry(self) -> ReviewResponseEntry {
        ReviewResponseEntry {
            id: self.id,
            comment: self.comment,
            created_at: self.created_at,
            user: ReviewAuthor {
                id: self.user_id,
                name: self.responder_name,
                picture: self.responder_picture,
            },
        }
    }
}
