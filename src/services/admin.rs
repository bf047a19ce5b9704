//! Admin dashboard service
//!
//! User management and platform statistics for staff. Callers check staff
//! access through `AuthService::require_staff` before reaching this service.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::database::DatabaseService;
use crate::models::user::{LearnerProgress, UpdateUserRequest, User};
use crate::utils::errors::{StudyBuddyError, Result};
use crate::utils::logging;

const RECENT_ACTIVITY_LIMIT: usize = 5;
const RECENT_USER_DAYS: i64 = 7;
const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_users: i64,
    pub active_learners: i64,
    pub recent_users: i64,
    pub total_sessions: i64,
    pub total_topics: i64,
    pub total_courses: i64,
    pub popular_topic: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    UserRegistered,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub user: String,
}

/// Feed of registrations plus a system entry, newest first, at most five
pub fn build_activities(recent_learners: &[User], now: DateTime<Utc>) -> Vec<Activity> {
    let mut activities: Vec<Activity> = recent_learners
        .iter()
        .map(|user| Activity {
            kind: ActivityKind::UserRegistered,
            message: format!("New user registered: {}", user.username),
            timestamp: user.date_joined,
            user: user.username.clone(),
        })
        .collect();

    activities.push(Activity {
        kind: ActivityKind::System,
        message: "System maintenance completed".to_string(),
        timestamp: now,
        user: "System".to_string(),
    });

    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activities.truncate(RECENT_ACTIVITY_LIMIT);
    activities
}

#[derive(Debug, Clone)]
pub struct AdminService {
    db: DatabaseService,
}

impl AdminService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn list_users(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<User>> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 500);
        let offset = offset.unwrap_or(0).max(0);
        self.db.users.list(limit, offset).await
    }

    /// Patch a user's flags; only `is_active` and `is_staff` are applied
    pub async fn update_user(&self, admin_id: i64, user_id: i64, is_active: Option<bool>, is_staff: Option<bool>) -> Result<User> {
        if is_active.is_none() && is_staff.is_none() {
            return Err(StudyBuddyError::InvalidInput("Nothing to update".to_string()));
        }

        let request = UpdateUserRequest { is_active, is_staff, ..Default::default() };
        let user = self
            .db
            .users
            .update(user_id, request)
            .await?
            .ok_or(StudyBuddyError::UserNotFound { user_id })?;

        let details = format!("is_active={:?} is_staff={:?}", is_active, is_staff);
        logging::log_admin_action(admin_id, "update_user", Some(user.username.as_str()), Some(details.as_str()));
        Ok(user)
    }

    pub async fn analytics(&self) -> Result<Analytics> {
        debug!("Collecting admin analytics");
        let since = Utc::now() - Duration::days(RECENT_USER_DAYS);

        let analytics = Analytics {
            total_users: self.db.users.count().await?,
            active_learners: self.db.users.count_learners().await?,
            recent_users: self.db.users.count_joined_since(since).await?,
            total_sessions: self.db.sessions.count().await?,
            total_topics: self.db.topics.count().await?,
            total_courses: self.db.courses.count().await?,
            popular_topic: self.db.sessions.most_popular_topic().await?,
        };

        info!(total_users = analytics.total_users, total_sessions = analytics.total_sessions, "Analytics collected");
        Ok(analytics)
    }

    pub async fn recent_activities(&self) -> Result<Vec<Activity>> {
        let learners = self.db.users.recent_learners(RECENT_ACTIVITY_LIMIT as i64).await?;
        Ok(build_activities(&learners, Utc::now()))
    }

    pub async fn learner_progress(&self) -> Result<Vec<LearnerProgress>> {
        self.db.users.learner_progress().await
    }
}
