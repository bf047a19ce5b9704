//! Authentication service implementation
//!
//! Handles learner registration, password login with opaque tokens, token
//! authentication and the staff check guarding admin operations.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::{debug, info, warn};
use crate::config::settings::AuthConfig;
use crate::database::repositories::{TokenRepository, UserRepository};
use crate::models::user::{AuthToken, CreateUserRequest, User, MAX_EMAIL_LENGTH, MAX_USERNAME_LENGTH};
use crate::utils::errors::{StudyBuddyError, Result};
use crate::utils::helpers::{ensure_max_length, generate_token};

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

impl AuthContext {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn is_staff(&self) -> bool {
        self.user.is_staff
    }
}

/// Registration input
#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Login result handed back to clients
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Token key without surrounding whitespace or a `Token ` scheme prefix
pub fn normalize_token(token: &str) -> &str {
    let token = token.trim();
    match token.strip_prefix("Token") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => token,
    }
}

/// Hash a password with argon2 and a fresh salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StudyBuddyError::PasswordHash(e.to_string()))
}

/// Check a password against a stored argon2 hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// Authentication service for managing accounts and tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserRepository,
    tokens: TokenRepository,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(users: UserRepository, tokens: TokenRepository, config: AuthConfig) -> Self {
        Self { users, tokens, config }
    }

    /// Register a learner account
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let username = request.username.trim().to_string();
        debug!(username = %username, "Registering user");

        if username.is_empty() {
            return Err(StudyBuddyError::InvalidInput("Username is required".to_string()));
        }
        ensure_max_length(&username, MAX_USERNAME_LENGTH, "Username")?;
        let email = request.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        if let Some(email) = &email {
            ensure_max_length(email, MAX_EMAIL_LENGTH, "Email")?;
        }
        if request.password.chars().count() < self.config.min_password_length {
            return Err(StudyBuddyError::InvalidInput(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        if self.users.find_by_username(&username).await?.is_some() {
            warn!(username = %username, "Registration rejected, username taken");
            return Err(StudyBuddyError::Conflict(format!("Username '{}' is already taken", username)));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(CreateUserRequest {
                username,
                password_hash,
                email,
                first_name: request.first_name,
                last_name: request.last_name,
                is_staff: false,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "New user registered");
        self.log_auth_event(user.id, "register", true, None);
        Ok(user)
    }

    /// Verify credentials and return the user's token.
    ///
    /// The first login creates the token; later logins return the same one.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let invalid = || StudyBuddyError::Authentication("Invalid credentials".to_string());

        let user = self.users.find_by_username(username.trim()).await?.ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash) {
            self.log_auth_event(user.id, "login", false, Some("wrong password"));
            return Err(invalid());
        }
        if !user.is_active {
            self.log_auth_event(user.id, "login", false, Some("inactive account"));
            return Err(StudyBuddyError::Authentication("Account is disabled".to_string()));
        }

        let token = self.token_for(user.id).await?;
        self.users.touch_last_login(user.id).await?;
        self.log_auth_event(user.id, "login", true, None);

        Ok(LoginResponse { token: token.key, user })
    }

    async fn token_for(&self, user_id: i64) -> Result<AuthToken> {
        if let Some(token) = self.tokens.find_by_user(user_id).await? {
            return Ok(token);
        }
        self.tokens.create(user_id, &generate_token(self.config.token_length)).await
    }

    /// Resolve a token to its active user
    pub async fn authenticate(&self, token: &str) -> Result<AuthContext> {
        let token = normalize_token(token);
        if token.is_empty() {
            return Err(StudyBuddyError::Authentication("Authentication credentials were not provided".to_string()));
        }

        let user = self
            .tokens
            .find_user_by_key(token)
            .await?
            .ok_or_else(|| StudyBuddyError::Authentication("Invalid token".to_string()))?;

        if !user.is_active {
            return Err(StudyBuddyError::Authentication("User inactive or deleted".to_string()));
        }

        Ok(AuthContext { user })
    }

    /// Reject callers who are not staff
    pub fn require_staff(&self, context: &AuthContext) -> Result<()> {
        if context.is_staff() {
            Ok(())
        } else {
            self.log_auth_event(context.user_id(), "staff_check", false, None);
            Err(StudyBuddyError::PermissionDenied("Staff access required".to_string()))
        }
    }

    /// Revoke a token
    pub async fn logout(&self, token: &str) -> Result<bool> {
        let removed = self.tokens.delete(normalize_token(token)).await?;
        debug!(removed = removed, "Logout");
        Ok(removed)
    }

    /// Log an authentication event
    pub fn log_auth_event(&self, user_id: i64, action: &str, success: bool, details: Option<&str>) {
        if success {
            info!(user_id = user_id, action = action, details = details, "Authentication event");
        } else {
            warn!(user_id = user_id, action = action, details = details, "Authentication failure");
        }
    }
}
