use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::claim::{
    Claim, ClaimBusinessRef, ClaimDetail, ClaimStats, ClaimStatus, ClaimSummary,
    ClaimUserRef, NewClaim,
};

use super::business_repo::BusinessRepository;
use super::repo_error::RepositoryError;

#[derive(Clone)]
pub struct ClaimRepository {
    pool: PgPool,
}

impl ClaimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_claim(
        &self,
        business_id: i32,
        user_id: i32,
        new: &NewClaim,
    ) -> Result<Claim, RepositoryError> {
        let row = sqlx::query_as::<_, ClaimRow>(
            r#"
            INSERT INTO business_claims (business_id, user_id, status,
                                         verification_type, verification_data,
                                         documents)
            VALUES ($1, $2, 'PENDING', $3, $4, $5)
            RETURNING id, business_id, user_id, status, verification_type,
                      verification_data, documents, notes, submitted_at, reviewed_at
            "#,
        )
        .bind(business_id)
        .bind(user_id)
        .bind(new.verification_type.to_string())
        .bind(&new.verification_data)
        .bind(&new.documents)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_claim())
    }

    /// Is there already an open claim for this business?
    pub async fn open_claim_exists(&self, business_id: i32) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM business_claims
                WHERE business_id = $1 AND status IN ('PENDING', 'IN_REVIEW')
            )
            "#,
        )
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn list_claims(
        &self,
        status: Option<ClaimStatus>,
    ) -> Result<Vec<ClaimSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ClaimSummaryRow>(
            r#"
            SELECT cl.id, cl.business_id, cl.user_id, cl.status,
                   cl.verification_type, cl.verification_data, cl.documents,
                   cl.notes, cl.submitted_at, cl.reviewed_at,
                   b.name AS business_name, b.slug AS business_slug,
                   u.full_name AS user_name, u.email AS user_email
            FROM business_claims cl
            JOIN businesses b ON b.id = cl.business_id
            JOIN users u ON u.id = cl.user_id
            WHERE ($1::text IS NULL OR cl.status = $1)
            ORDER BY cl.submitted_at DESC
            "#,
        )
        .bind(status.map(|s| s.to_string()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ClaimSummaryRow::into_summary).collect())
    }

    pub async fn get_claim(&self, id: i32) -> Result<Claim, RepositoryError> {
        let row = sqlx::query_as::<_, ClaimRow>(
            r#"
            SELECT id, business_id, user_id, status, verification_type,
                   verification_data, documents, notes, submitted_at, reviewed_at
            FROM business_claims
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("claim {id}")))?;

        Ok(row.into_claim())
    }

    /// The claim plus the full business context an admin reviews against.
    pub async fn get_detail(
        &self,
        id: i32,
        businesses: &BusinessRepository,
    ) -> Result<ClaimDetail, RepositoryError> {
        let claim = self.get_claim(id).await?;
        let business = businesses.get_business(claim.business_id).await?;
        let locations = businesses.locations_for(business.id).await?;
        let categories = businesses.categories_for(business.id).await?;

        let user: (String, String) =
            sqlx::query_as("SELECT full_name, email FROM users WHERE id = $1")
                .bind(claim.user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(ClaimDetail {
            user: ClaimUserRef {
                id: claim.user_id,
                name: user.0,
                email: user.1,
            },
            claim,
            business,
            locations,
            categories,
        })
    }

    pub async fn stats(&self) -> Result<ClaimStats, RepositoryError> {
        let counts: (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'PENDING'),
                   COUNT(*) FILTER (WHERE status = 'APPROVED'),
                   COUNT(*) FILTER (WHERE status = 'REJECTED')
            FROM business_claims
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let recent = sqlx::query_as::<_, ClaimSummaryRow>(
            r#"
            SELECT cl.id, cl.business_id, cl.user_id, cl.status,
                   cl.verification_type, cl.verification_data, cl.documents,
                   cl.notes, cl.submitted_at, cl.reviewed_at,
                   b.name AS business_name, b.slug AS business_slug,
                   u.full_name AS user_name, u.email AS user_email
            FROM business_claims cl
            JOIN businesses b ON b.id = cl.business_id
            JOIN users u ON u.id = cl.user_id
            ORDER BY cl.submitted_at DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ClaimStats {
            total: counts.0,
            pending: counts.1,
            approved: counts.2,
            rejected: counts.3,
            recent_claims: recent
                .into_iter()
                .map(ClaimSummaryRow::into_summary)
                .collect(),
        })
    }

    /// Approve atomically: the claim closes and the business becomes
    /// claimed and verified in the same transaction.
    pub async fn approve(&self, id: i32) -> Result<Claim, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ClaimRow>(
            r#"
            UPDATE business_claims
            SET status = 'APPROVED', reviewed_at = now()
            WHERE id = $1
            RETURNING id, business_id, user_id, status, verification_type,
                      verification_data, documents, notes, submitted_at, reviewed_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("claim {id}")))?;

        sqlx::query(
            r#"
            UPDATE businesses
            SET claimed_by = $2, verified = TRUE, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(row.business_id)
        .bind(row.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into_claim())
    }

    pub async fn reject(&self, id: i32, notes: Option<&str>) -> Result<Claim, RepositoryError> {
        let row = sqlx::query_as::<_, ClaimRow>(
            r#"
            UPDATE business_claims
            SET status = 'REJECTED', reviewed_at = now(),
                notes = COALESCE($2, notes)
            WHERE id = $1
            RETURNING id, business_id, user_id, status, verification_type,
                      verification_data, documents, notes, submitted_at, reviewed_at
            "#,
        )
        .bind(id)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("claim {id}")))?;

        Ok(row.into_claim())
    }
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    id: i32,
    business_id: i32,
    user_id: i32,
    status: String,
    verification_type: String,
    verification_data: Option<String>,
    documents: Vec<String>,
    notes: Option<String>,
    submitted_at: OffsetDateTime,
    reviewed_at: Option<OffsetDateTime>,
}

impl ClaimRow {
    fn into_claim(self) -> Claim {
        Claim {
            id: self.id,
            business_id: self.business_id,
            user_id: self.user_id,
            status: self.status.into(),
            verification_type: self.verification_type.into(),
            verification_data: self.verification_data,
            documents: self.documents,
            notes: self.notes,
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClaimSummaryRow {
    id: i32,
    business_id: i32,
    user_id: i32,
    status: String,
    verification_type: String,
    verification_data: Option<String>,
    documents: Vec<String>,
    notes: Option<String>,
    submitted_at: OffsetDateTime,
    reviewed_at: Option<OffsetDateTime>,
    business_name: String,
    business_slug: String,
    user_name: String,
    user_email: String,
}

impl ClaimSummaryRow {
    fn into_summary(self) -> ClaimSummary {
        ClaimSummary {
            business: ClaimBusinessRef {
                id: self.business_id,
                name: self.business_name,
                slug: self.business_slug,
            },
            user: ClaimUserRef {
                id: self.user_id,
                name: self.user_name,
                email: self.user_email,
            },
            claim: Claim {
                id: self.id,
                business_id: self.business_id,
                user_id: self.user_id,
                status: self.status.into(),
                verification_type: self.verification_type.into(),
                verification_data: self.verification_data,
                documents: self.documents,
                notes: self.notes,
                submitted_at: self.submitted_at,
                reviewed_at: self.reviewed_at,
            },
        }
    }
}
