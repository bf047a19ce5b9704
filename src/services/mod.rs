//! Services module
//!
//! This module contains business logic services

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod gemini;
pub mod generation;
pub mod prompts;
pub mod study;

// Re-export commonly used services
pub use admin::{AdminService, Analytics, Activity, ActivityKind};
pub use auth::{AuthService, AuthContext, LoginResponse, RegisterRequest};
pub use catalog::CatalogService;
pub use gemini::GeminiClient;
pub use generation::{GenerationGateway, BackoffPolicy, TextGenerator, is_transient_error};
pub use prompts::{ChatTurn, StudyAnalysis};
pub use study::{StudyService, StudyTools, NotesResponse, QuizResponse, TutorResponse, Recommendations, Recommendation};

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::{health_check, pool_status, DatabaseService, PoolStatus};
use crate::utils::errors::Result;

/// Build the study tools on top of the configured Gemini client
pub fn build_study_tools(settings: &Settings) -> Result<StudyTools> {
    let client = GeminiClient::new(&settings.gemini)?;
    let gateway = GenerationGateway::from_settings(Arc::new(client), settings);
    Ok(StudyTools::new(gateway))
}

/// Service factory for creating and managing all services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub study_service: StudyService,
    pub catalog_service: CatalogService,
    pub admin_service: AdminService,
    database: DatabaseService,
    gemini_configured: bool,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, database: DatabaseService) -> Result<Self> {
        Ok(Self::with_tools(settings, database, build_study_tools(settings)?))
    }

    /// Create services around already-built study tools
    pub fn with_tools(settings: &Settings, database: DatabaseService, tools: StudyTools) -> Self {
        Self {
            auth_service: AuthService::new(database.users.clone(), database.tokens.clone(), settings.auth.clone()),
            study_service: StudyService::new(tools, database.sessions.clone()),
            catalog_service: CatalogService::new(database.topics.clone(), database.courses.clone()),
            admin_service: AdminService::new(database.clone()),
            gemini_configured: !settings.gemini.api_key.is_empty(),
            database,
        }
    }

    pub fn study_tools(&self) -> &StudyTools {
        self.study_service.tools()
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = health_check(self.database.pool()).await.is_ok();
        let gateway = self.study_tools().gateway();

        ServiceHealthStatus {
            database_healthy,
            pool: pool_status(self.database.pool()),
            gemini_configured: self.gemini_configured,
            model: gateway.model().to_string(),
            max_retries: gateway.max_retries(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub pool: PoolStatus,
    pub gemini_configured: bool,
    pub model: String,
    pub max_retries: u32,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.database_healthy && self.gemini_configured
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if !self.gemini_configured {
            issues.push("Gemini API key is not configured".to_string());
        }

        issues
    }
}
