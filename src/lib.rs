//! StudyBuddy backend
//!
//! Study assistant services: AI-generated study plans, notes, quizzes,
//! tutoring and recommendations behind a retrying generation gateway, plus
//! the account, catalog and admin operations around them.

#![allow(non_snake_case)]

pub mod config;
pub mod services;
pub mod models;
pub mod database;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{StudyBuddyError, GenerationError, ProviderError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::{ServiceFactory, GenerationGateway, TextGenerator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
