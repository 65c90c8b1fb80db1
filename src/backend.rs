//! Abstract auth-backend collaborator.
//!
//! The thin HTTP wrapper that actually talks to the backend lives outside
//! this crate. The session core depends only on this contract; test doubles
//! implement the same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::profile::{ProfileUpdate, UserProfile};

/// Opaque token pair issued by a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Data submitted for a new-account registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub secret: String,
}

/// The backend auth service consumed by the session core.
///
/// Tokens are opaque strings here; whatever credential the caller currently
/// holds authenticates `fetch_profile` and `update_profile`.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, identifier: &str, secret: &str) -> Result<TokenPair, BackendError>;

    async fn register(&self, registration: &Registration) -> Result<TokenPair, BackendError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, BackendError>;

    /// Remote token invalidation. Callers treat this as best-effort.
    async fn logout(&self, refresh_token: &str) -> Result<(), BackendError>;

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, BackendError>;
}

/// Errors surfaced by the backend collaborator.
#[derive(Debug, Clone)]
pub enum BackendError {
    /// The backend rejected the submitted credentials or registration data.
    /// Carries the user-facing message.
    Rejected(String),
    /// The caller's token was not accepted.
    Unauthorized,
    /// The backend could not be reached or answered abnormally.
    Unavailable(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Rejected(message) => write!(f, "{}", message),
            BackendError::Unauthorized => write!(f, "Not authorized"),
            BackendError::Unavailable(detail) => write!(f, "Backend unavailable: {}", detail),
        }
    }
}

impl std::error::Error for BackendError {}
