//! Session and tenant-selection core for the society admin console.
//!
//! Reconciles three independently arriving facts -- a persisted token pair, a
//! fetched user profile, and a previously stored society choice -- into one
//! consistent, race-free session state, and exposes that state to the
//! route-guarding logic that decides whether protected views render at all.

pub mod backend;
pub mod cleanup;
pub mod db;
pub mod profile;
pub mod session;

use std::sync::Arc;

use backend::AuthBackend;
use db::Database;
use session::Session;

/// Default access-token lifetime: 1 day.
pub const ACCESS_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Default refresh-token lifetime: 7 days.
pub const REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration for the session context.
pub struct SessionConfig {
    /// Durable storage for the credential pair and the society choice.
    pub db: Database,
    /// The backend auth service collaborator.
    pub backend: Arc<dyn AuthBackend>,
    /// TTL applied to freshly persisted access tokens.
    pub access_ttl_secs: u64,
    /// TTL applied to freshly persisted refresh tokens.
    pub refresh_ttl_secs: u64,
}

impl SessionConfig {
    /// Configuration with the default token lifetimes.
    pub fn new(db: Database, backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            db,
            backend,
            access_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_ttl_secs: REFRESH_TOKEN_TTL_SECS,
        }
    }
}

/// Create the session context for one running instance of the console.
///
/// The caller owns the returned `Session` and must run [`Session::boot`]
/// before dispatching user-initiated operations.
pub fn create_session(config: SessionConfig) -> Session {
    Session::new(config)
}

/// Run cleanup once and spawn the background scheduler.
/// Call this alongside `boot` at process start.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}
