//! Database module
//!
//! This module handles database connections and operations

pub mod connection;
pub mod repositories;
pub mod service;

// Re-export commonly used database components
pub use connection::{DatabasePool, PoolStatus, create_pool, create_lazy_pool, run_migrations, health_check, pool_status};
pub use repositories::{UserRepository, TokenRepository, TopicRepository, CourseRepository, StudySessionRepository};
pub use service::DatabaseService;
