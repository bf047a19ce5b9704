//! Error handling for StudyBuddy
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Fixed message returned to users when the AI service stays overloaded
/// through every retry attempt.
pub const OVERLOADED_FALLBACK_MESSAGE: &str =
    "The AI service is temporarily overloaded. Please try again in a few moments.";

/// Main error type for StudyBuddy application
#[derive(Error, Debug)]
pub enum StudyBuddyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("AI provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Topic not found: {topic_id}")]
    TopicNotFound { topic_id: i64 },

    #[error("Course not found: {course_id}")]
    CourseNotFound { course_id: i64 },

    #[error("Study session not found: {session_id}")]
    SessionNotFound { session_id: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

/// Errors reported by a text-generation provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("API key is not configured")]
    MissingApiKey,
}

/// Terminal outcome of a failed generation through the gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Every attempt failed with a transient condition
    #[error("{}", OVERLOADED_FALLBACK_MESSAGE)]
    Overloaded { attempts: u32 },

    /// The provider failed with a non-transient condition
    #[error("Error generating content: {detail}")]
    Failed { detail: String },
}

impl GenerationError {
    /// Text shown to the user in place of generated content
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn is_overloaded(&self) -> bool {
        matches!(self, GenerationError::Overloaded { .. })
    }
}

/// Result type alias for StudyBuddy operations
pub type Result<T> = std::result::Result<T, StudyBuddyError>;

/// Result type alias for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl StudyBuddyError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            StudyBuddyError::Database(_) => false,
            StudyBuddyError::Migration(_) => false,
            StudyBuddyError::Generation(e) => e.is_overloaded(),
            StudyBuddyError::Provider(_) => true,
            StudyBuddyError::Config(_) => false,
            StudyBuddyError::Authentication(_) => false,
            StudyBuddyError::PermissionDenied(_) => false,
            StudyBuddyError::UserNotFound { .. } => false,
            StudyBuddyError::TopicNotFound { .. } => false,
            StudyBuddyError::CourseNotFound { .. } => false,
            StudyBuddyError::SessionNotFound { .. } => false,
            StudyBuddyError::Conflict(_) => false,
            StudyBuddyError::InvalidInput(_) => false,
            StudyBuddyError::Http(_) => true,
            StudyBuddyError::Serialization(_) => false,
            StudyBuddyError::Io(_) => true,
            StudyBuddyError::UrlParse(_) => false,
            StudyBuddyError::PasswordHash(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StudyBuddyError::Database(_) => ErrorSeverity::Critical,
            StudyBuddyError::Migration(_) => ErrorSeverity::Critical,
            StudyBuddyError::Config(_) => ErrorSeverity::Critical,
            StudyBuddyError::PermissionDenied(_) => ErrorSeverity::Warning,
            StudyBuddyError::Authentication(_) => ErrorSeverity::Warning,
            StudyBuddyError::Generation(GenerationError::Overloaded { .. }) => ErrorSeverity::Warning,
            StudyBuddyError::InvalidInput(_) => ErrorSeverity::Info,
            StudyBuddyError::Conflict(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP status an API layer should answer with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StudyBuddyError::InvalidInput(_) => 400,
            StudyBuddyError::Authentication(_) => 401,
            StudyBuddyError::PermissionDenied(_) => 403,
            StudyBuddyError::UserNotFound { .. }
            | StudyBuddyError::TopicNotFound { .. }
            | StudyBuddyError::CourseNotFound { .. }
            | StudyBuddyError::SessionNotFound { .. } => 404,
            StudyBuddyError::Conflict(_) => 409,
            StudyBuddyError::Generation(GenerationError::Overloaded { .. }) => 503,
            _ => 500,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
