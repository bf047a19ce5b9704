//! Course model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const MAX_COURSE_NAME_LENGTH: usize = 200;
use super::topic::Topic;

/// Course row as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub duration_hours: Option<i32>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course with its linked topics, as returned to readers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseWithTopics {
    #[serde(flatten)]
    pub course: Course,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseRequest {
    pub name: String,
    pub description: Option<String>,
    pub duration_hours: Option<i32>,
    pub is_published: Option<bool>,
    #[serde(default)]
    pub topic_ids: Vec<i64>,
}

/// Partial course update; the slug is fixed at creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_hours: Option<i32>,
    pub is_published: Option<bool>,
    /// Replaces the topic links when present
    pub topic_ids: Option<Vec<i64>>,
}
