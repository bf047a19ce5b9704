//! Study session repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::study_session::{StudySession, CreateStudySessionRequest};
use crate::utils::errors::StudyBuddyError;

const SESSION_COLUMNS: &str = "id, user_id, topic_name, duration_input, generated_content, created_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct StudySessionRepository {
    pool: PgPool,
}

impl StudySessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new study session
    pub async fn create(&self, request: CreateStudySessionRequest) -> Result<StudySession, StudyBuddyError> {
        let session = sqlx::query_as::<_, StudySession>(&format!(
            r#"
            INSERT INTO study_sessions (user_id, topic_name, duration_input, generated_content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(request.topic_name)
        .bind(request.duration_input)
        .bind(request.generated_content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// Find a session owned by a user
    pub async fn find_for_user(&self, id: i64, user_id: i64) -> Result<Option<StudySession>, StudyBuddyError> {
        let session = sqlx::query_as::<_, StudySession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Sessions of a user, newest first
    pub async fn list_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<StudySession>, StudyBuddyError> {
        let sessions = sqlx::query_as::<_, StudySession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Count total sessions
    pub async fn count(&self) -> Result<i64, StudyBuddyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM study_sessions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Most frequently studied topic name
    pub async fn most_popular_topic(&self) -> Result<Option<String>, StudyBuddyError> {
        let topic: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT topic_name FROM study_sessions
            GROUP BY topic_name
            ORDER BY COUNT(*) DESC, topic_name
            LIMIT 1
            "#
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(topic.map(|t| t.0))
    }
}
