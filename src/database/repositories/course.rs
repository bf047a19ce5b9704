//! Course repository implementation

use sqlx::{PgPool, Postgres, Transaction};
use chrono::Utc;
use crate::models::course::{Course, UpdateCourseRequest};
use crate::utils::errors::StudyBuddyError;

const COURSE_COLUMNS: &str = "id, name, slug, description, duration_hours, is_published, created_at, updated_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a course and link its topics in one transaction
    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        description: Option<String>,
        duration_hours: Option<i32>,
        is_published: bool,
        topic_ids: &[i64],
    ) -> Result<Course, StudyBuddyError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let course = sqlx::query_as::<_, Course>(&format!(
            r#"
            INSERT INTO courses (name, slug, description, duration_hours, is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(duration_hours)
        .bind(is_published)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        Self::link_topics(&mut tx, course.id, topic_ids).await?;
        tx.commit().await?;

        Ok(course)
    }

    /// Find course by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Course>, StudyBuddyError> {
        let course = sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(course)
    }

    /// Check whether a slug is already used
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, StudyBuddyError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM courses WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.0)
    }

    /// List all courses, newest first
    pub async fn list(&self) -> Result<Vec<Course>, StudyBuddyError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    /// Update course fields and, when given, replace its topic links
    pub async fn update(&self, id: i64, request: UpdateCourseRequest) -> Result<Option<Course>, StudyBuddyError> {
        let mut tx = self.pool.begin().await?;

        let course = sqlx::query_as::<_, Course>(&format!(
            r#"
            UPDATE courses
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                duration_hours = COALESCE($4, duration_hours),
                is_published = COALESCE($5, is_published),
                updated_at = $6
            WHERE id = $1
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.duration_hours)
        .bind(request.is_published)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(course) = course else {
            return Ok(None);
        };

        if let Some(topic_ids) = request.topic_ids {
            sqlx::query("DELETE FROM course_topics WHERE course_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::link_topics(&mut tx, id, &topic_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(course))
    }

    /// Delete course; returns whether it existed
    pub async fn delete(&self, id: i64) -> Result<bool, StudyBuddyError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count total courses
    pub async fn count(&self) -> Result<i64, StudyBuddyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn link_topics(tx: &mut Transaction<'_, Postgres>, course_id: i64, topic_ids: &[i64]) -> Result<(), StudyBuddyError> {
        if topic_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO course_topics (course_id, topic_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#
        )
        .bind(course_id)
        .bind(topic_ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
