//! User repository implementation

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use crate::models::user::{User, CreateUserRequest, UpdateUserRequest, LearnerProgress};
use crate::utils::errors::StudyBuddyError;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, is_staff, is_active, is_superuser, date_joined, last_login";

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user; a taken username is a `Conflict`
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, StudyBuddyError> {
        let username = request.username.clone();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, email, first_name, last_name, is_staff, date_joined)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.username)
        .bind(request.password_hash)
        .bind(request.email)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.is_staff)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StudyBuddyError::Conflict(format!("Username '{}' is already taken", username))
            }
            other => StudyBuddyError::Database(other),
        })?;

        Ok(user)
    }

    /// Find user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StudyBuddyError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Update admin-editable fields
    pub async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<Option<User>, StudyBuddyError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                is_staff = COALESCE($5, is_staff),
                is_active = COALESCE($6, is_active)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.email)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.is_staff)
        .bind(request.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Record a successful login
    pub async fn touch_last_login(&self, id: i64) -> Result<(), StudyBuddyError> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List all users, newest first
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, StudyBuddyError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY date_joined DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Most recently joined non-staff users
    pub async fn recent_learners(&self, limit: i64) -> Result<Vec<User>, StudyBuddyError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_staff = false ORDER BY date_joined DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64, StudyBuddyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Count non-staff users
    pub async fn count_learners(&self) -> Result<i64, StudyBuddyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_staff = false")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Count users who joined at or after `since`
    pub async fn count_joined_since(&self, since: DateTime<Utc>) -> Result<i64, StudyBuddyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE date_joined >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Session counts per non-staff user
    pub async fn learner_progress(&self) -> Result<Vec<LearnerProgress>, StudyBuddyError> {
        let progress = sqlx::query_as::<_, LearnerProgress>(
            r#"
            SELECT u.id AS user_id,
                   u.username,
                   COUNT(s.id) AS session_count,
                   MAX(s.created_at) AS last_session_at
            FROM users u
            LEFT JOIN study_sessions s ON s.user_id = u.id
            WHERE u.is_staff = false
            GROUP BY u.id, u.username
            ORDER BY session_count DESC, u.username
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(progress)
    }
}
