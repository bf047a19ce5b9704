//! Auth token repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::user::{AuthToken, User};
use crate::utils::errors::StudyBuddyError;

#[derive(Clone)]
#[derive(Debug)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Token of a user, if one was issued
    pub async fn find_by_user(&self, user_id: i64) -> Result<Option<AuthToken>, StudyBuddyError> {
        let token = sqlx::query_as::<_, AuthToken>(
            "SELECT key, user_id, created_at FROM auth_tokens WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    /// Store a token for a user; an existing token for the user is kept
    pub async fn create(&self, user_id: i64, key: &str) -> Result<AuthToken, StudyBuddyError> {
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (key, user_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING key, user_id, created_at
            "#
        )
        .bind(key)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(token)
    }

    /// Owner of a token
    pub async fn find_user_by_key(&self, key: &str) -> Result<Option<User>, StudyBuddyError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
                   u.is_staff, u.is_active, u.is_superuser, u.date_joined, u.last_login
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.key = $1
            "#
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Revoke a token; returns whether it existed
    pub async fn delete(&self, key: &str) -> Result<bool, StudyBuddyError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
