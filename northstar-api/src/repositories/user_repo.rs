use sqlx::PgPool;

use crate::domain::user::User;

use super::repo_error::RepositoryError;

/// Users and their bearer sessions. Sessions are issued by the external
/// identity provider; this service only validates them.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve an unexpired session token to its user.
    pub async fn user_by_session_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.email, u.full_name, u.picture, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    full_name: String,
    picture: Option<String>,
    role: String,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            picture: self.picture,
            role: self.role.into(),
        }
    }
}
