//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod topic;
pub mod course;
pub mod study_session;

// Re-export commonly used models
pub use user::{User, AuthToken, CreateUserRequest, UpdateUserRequest, LearnerProgress};
pub use topic::{Topic, CreateTopicRequest, UpdateTopicRequest};
pub use course::{Course, CourseWithTopics, CreateCourseRequest, UpdateCourseRequest};
pub use study_session::{StudySession, CreateStudySessionRequest};
