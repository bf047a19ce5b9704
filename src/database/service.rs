//! Database service layer
//!
//! This module bundles the repositories behind a single handle

use crate::database::{DatabasePool, UserRepository, TokenRepository, TopicRepository, CourseRepository, StudySessionRepository};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub tokens: TokenRepository,
    pub topics: TopicRepository,
    pub courses: CourseRepository,
    pub sessions: StudySessionRepository,
    pool: DatabasePool,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            tokens: TokenRepository::new(pool.clone()),
            topics: TopicRepository::new(pool.clone()),
            courses: CourseRepository::new(pool.clone()),
            sessions: StudySessionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}
