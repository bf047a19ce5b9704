//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod user;
pub mod token;
pub mod topic;
pub mod course;
pub mod study_session;

// Re-export repositories
pub use user::UserRepository;
pub use token::TokenRepository;
pub use topic::TopicRepository;
pub use course::CourseRepository;
pub use study_session::StudySessionRepository;
