//! Topic repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::topic::{Topic, UpdateTopicRequest};
use crate::utils::errors::StudyBuddyError;

const TOPIC_COLUMNS: &str = "id, name, slug, description, is_active, created_at, updated_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct TopicRepository {
    pool: PgPool,
}

impl TopicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a topic with an already-unique slug
    pub async fn create(&self, name: &str, slug: &str, description: Option<String>, is_active: bool) -> Result<Topic, StudyBuddyError> {
        let now = Utc::now();
        let topic = sqlx::query_as::<_, Topic>(&format!(
            r#"
            INSERT INTO topics (name, slug, description, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TOPIC_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(is_active)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(topic)
    }

    /// Find topic by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Topic>, StudyBuddyError> {
        let topic = sqlx::query_as::<_, Topic>(&format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(topic)
    }

    /// Check whether a slug is already used
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, StudyBuddyError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM topics WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.0)
    }

    /// List topics ordered by name
    pub async fn list(&self, active_only: bool) -> Result<Vec<Topic>, StudyBuddyError> {
        let topics = sqlx::query_as::<_, Topic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE ($1 = false OR is_active = true) ORDER BY name"
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(topics)
    }

    /// Topics linked to a course
    pub async fn list_for_course(&self, course_id: i64) -> Result<Vec<Topic>, StudyBuddyError> {
        let topics = sqlx::query_as::<_, Topic>(
            r#"
            SELECT t.id, t.name, t.slug, t.description, t.is_active, t.created_at, t.updated_at
            FROM topics t
            JOIN course_topics ct ON ct.topic_id = t.id
            WHERE ct.course_id = $1
            ORDER BY t.name
            "#
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(topics)
    }

    /// Update topic; the slug is left untouched
    pub async fn update(&self, id: i64, request: UpdateTopicRequest) -> Result<Option<Topic>, StudyBuddyError> {
        let topic = sqlx::query_as::<_, Topic>(&format!(
            r#"
            UPDATE topics
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active),
                updated_at = $5
            WHERE id = $1
            RETURNING {TOPIC_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(topic)
    }

    /// Delete topic; returns whether it existed
    pub async fn delete(&self, id: i64) -> Result<bool, StudyBuddyError> {
        let result = sqlx::query("DELETE FROM topics WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count total topics
    pub async fn count(&self) -> Result<i64, StudyBuddyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// How many of the given IDs exist
    pub async fn count_existing(&self, ids: &[i64]) -> Result<i64, StudyBuddyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
