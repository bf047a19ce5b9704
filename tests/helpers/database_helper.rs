//! Test database helper utilities
//!
//! Database tests run against the PostgreSQL instance named by
//! `TEST_DATABASE_URL` and are skipped when it is not set.

use sqlx::PgPool;
use std::sync::Once;
use StudyBuddy::database::{run_migrations, DatabaseService};
use StudyBuddy::models::user::{CreateUserRequest, User};
use StudyBuddy::services::auth::hash_password;

static INIT: Once = Once::new();

/// Initialize test logging once per process
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("StudyBuddy=debug,warn")
            .try_init();
    });
}

/// Test database helper that manages PostgreSQL test database setup
pub struct TestDatabase {
    pub pool: PgPool,
    pub database_url: String,
}

impl TestDatabase {
    /// Connect, migrate and clean the test database; `None` when
    /// `TEST_DATABASE_URL` is not set
    pub async fn connect() -> Option<Self> {
        init_test_env();

        let database_url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => {
                eprintln!("TEST_DATABASE_URL not set, skipping database test");
                return None;
            }
        };

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let db = Self { pool, database_url };
        db.cleanup().await.expect("Failed to clean test database");
        Some(db)
    }

    pub fn service(&self) -> DatabaseService {
        DatabaseService::new(self.pool.clone())
    }

    /// Clean all test data from the database
    pub async fn cleanup(&self) -> Result<(), sqlx::Error> {
        // Delete in reverse order of dependencies
        sqlx::query("DELETE FROM study_sessions").execute(&self.pool).await?;
        sqlx::query("DELETE FROM course_topics").execute(&self.pool).await?;
        sqlx::query("DELETE FROM courses").execute(&self.pool).await?;
        sqlx::query("DELETE FROM topics").execute(&self.pool).await?;
        sqlx::query("DELETE FROM auth_tokens").execute(&self.pool).await?;
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;

        Ok(())
    }

    /// Create a user directly, bypassing registration rules
    pub async fn create_test_user(&self, username: &str, password: &str, is_staff: bool) -> User {
        self.service()
            .users
            .create(CreateUserRequest {
                username: username.to_string(),
                password_hash: hash_password(password).expect("Failed to hash password"),
                email: Some(format!("{}@example.com", username)),
                first_name: None,
                last_name: None,
                is_staff,
            })
            .await
            .expect("Failed to create test user")
    }

    /// Count records in a table
    pub async fn count_records(&self, table: &str) -> Result<i64, sqlx::Error> {
        let count = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Bind a `TestDatabase` or return from the test when none is configured
#[macro_export]
macro_rules! test_db_or_skip {
    () => {
        match $crate::helpers::TestDatabase::connect().await {
            Some(db) => db,
            None => return,
        }
    };
}
