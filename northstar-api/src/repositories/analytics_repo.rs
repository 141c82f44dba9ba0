use sqlx::PgPool;
use time::Date;

use crate::domain::analytics::ViewsPoint;

use super::repo_error::RepositoryError;

/// Daily detail-view counters and the raw series behind the analytics
/// dashboard.
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bump today's detail-view counter for a business.
    pub async fn record_detail_view(
        &self,
        business_id: i32,
        date: Date,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO business_analytics (business_id, date, detail_views)
            VALUES ($1, $2, 1)
            ON CONFLICT (business_id, date)
            DO UPDATE SET detail_views = business_analytics.detail_views + 1
            "#,
        )
        .bind(business_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn views_total(
        &self,
        business_id: i32,
        from: Date,
        to: Date,
    ) -> Result<i64, RepositoryError> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(detail_views), 0)::bigint
            FROM business_analytics
            WHERE business_id = $1 AND date >= $2 AND date <= $3
            "#,
        )
        .bind(business_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    pub async fn views_over_time(
        &self,
        business_id: i32,
        from: Date,
        to: Date,
    ) -> Result<Vec<ViewsPoint>, RepositoryError> {
        let rows: Vec<(Date, i64)> = sqlx::query_as(
            r#"
            SELECT date, detail_views::bigint
            FROM business_analytics
            WHERE business_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date
            "#,
        )
        .bind(business_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(date, views)| ViewsPoint { date, views })
            .collect())
    }

    /// `(created day, rating)` of approved reviews in the window, for the
    /// reviews-over-time series.
    pub async fn review_ratings_by_day(
        &self,
        business_id: i32,
        from: Date,
        to: Date,
    ) -> Result<Vec<(Date, i32)>, RepositoryError> {
        let rows: Vec<(Date, i32)> = sqlx::query_as(
            r#"
            SELECT created_at::date, rating
            FROM reviews
            WHERE business_id = $1
              AND status = 'APPROVED'
              AND created_at::date >= $2 AND created_at::date <= $3
            ORDER BY created_at
            "#,
        )
        .bind(business_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn event_count(&self, business_id: i32) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM events WHERE business_id = $1")
                .bind(business_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
