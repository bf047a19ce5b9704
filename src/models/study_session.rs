//! Study session model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Column widths of `study_sessions`
pub const MAX_TOPIC_NAME_LENGTH: usize = 200;
pub const MAX_DURATION_LENGTH: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudySession {
    pub id: i64,
    pub user_id: i64,
    pub topic_name: String,
    pub duration_input: String,
    pub generated_content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudySessionRequest {
    pub user_id: i64,
    pub topic_name: String,
    pub duration_input: String,
    pub generated_content: String,
}
