#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;

use gatepost::backend::{AuthBackend, BackendError, Registration, TokenPair};
use gatepost::db::Database;
use gatepost::profile::{Membership, MembershipRole, TenantSummary, UserProfile};
use gatepost::session::Session;
use gatepost::{SessionConfig, create_session};

pub const SECRET: &str = "correct-horse";

/// In-memory stand-in for the backend auth service.
///
/// Implements the same collaborator contract the production HTTP wrapper
/// does; tests flip the failure flags to simulate backend behavior.
#[derive(Default)]
pub struct StubBackend {
    profile: Mutex<Option<UserProfile>>,
    fail_profile_fetch: AtomicBool,
    fail_logout: AtomicBool,
    login_delay: Mutex<Option<std::time::Duration>>,
    logout_delay: Mutex<Option<std::time::Duration>>,
    profile_fetch_delay: Mutex<Option<std::time::Duration>>,
    /// Refresh tokens handed to `logout`, in call order.
    pub logout_calls: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn new(profile: UserProfile) -> Arc<Self> {
        Arc::new(Self {
            profile: Mutex::new(Some(profile)),
            ..Self::default()
        })
    }

    pub fn without_profile() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Delay login responses, keeping the attempt in flight for a while.
    pub fn set_login_delay(&self, delay: std::time::Duration) {
        *self.login_delay.lock().unwrap() = Some(delay);
    }

    /// Delay remote logout, keeping the invalidation call in flight.
    pub fn set_logout_delay(&self, delay: std::time::Duration) {
        *self.logout_delay.lock().unwrap() = Some(delay);
    }

    /// Delay profile fetches, keeping the dependent fetch in flight.
    pub fn set_profile_fetch_delay(&self, delay: std::time::Duration) {
        *self.profile_fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_profile(&self, profile: UserProfile) {
        *self.profile.lock().unwrap() = Some(profile);
    }

    /// Make every profile fetch fail with a transient error.
    pub fn fail_profile_fetch(&self, fail: bool) {
        self.fail_profile_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make remote logout throw.
    pub fn fail_logout(&self, fail: bool) {
        self.fail_logout.store(fail, Ordering::SeqCst);
    }

    fn issue_pair() -> TokenPair {
        TokenPair {
            access_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[async_trait]
impl AuthBackend for StubBackend {
    async fn login(&self, _identifier: &str, secret: &str) -> Result<TokenPair, BackendError> {
        let delay = *self.login_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if secret == SECRET {
            Ok(Self::issue_pair())
        } else {
            Err(BackendError::Rejected(
                "Invalid identifier or secret".to_string(),
            ))
        }
    }

    async fn register(&self, _registration: &Registration) -> Result<TokenPair, BackendError> {
        Ok(Self::issue_pair())
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<UserProfile, BackendError> {
        let delay = *self.profile_fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_profile_fetch.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("connection refused".to_string()));
        }
        self.profile
            .lock()
            .unwrap()
            .clone()
            .ok_or(BackendError::Unauthorized)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), BackendError> {
        self.logout_calls
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        let delay = *self.logout_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("connection reset".to_string()));
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        _user_id: &str,
        update: &gatepost::profile::ProfileUpdate,
    ) -> Result<UserProfile, BackendError> {
        let mut guard = self.profile.lock().unwrap();
        let profile = guard.as_mut().ok_or(BackendError::Unauthorized)?;
        if let Some(name) = &update.name {
            profile.name = name.clone();
        }
        if let Some(phone) = &update.phone {
            profile.phone = phone.clone();
        }
        Ok(profile.clone())
    }
}

pub fn tenant_summary(name: &str) -> TenantSummary {
    TenantSummary {
        name: name.to_string(),
        address: "12 Lake View Road".to_string(),
        city: "Pune".to_string(),
        state: "MH".to_string(),
        pincode: "411001".to_string(),
        active: true,
    }
}

pub fn membership(tenant_id: &str) -> Membership {
    Membership {
        tenant_id: tenant_id.to_string(),
        tenant: tenant_summary(&format!("Society {}", tenant_id)),
        role: MembershipRole::Owner,
        unit: "B-404".to_string(),
        active: true,
        joined_at: "2024-03-01 10:00:00".to_string(),
    }
}

pub fn profile_with_memberships(tenant_ids: &[&str]) -> UserProfile {
    UserProfile {
        id: "user-1".to_string(),
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9800000000".to_string(),
        email_verified: true,
        phone_verified: false,
        memberships: tenant_ids.iter().map(|id| membership(id)).collect(),
    }
}

static TRACING: OnceLock<()> = OnceLock::new();

/// Route log output through the test harness once per binary.
fn init_tracing() {
    TRACING.get_or_init(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub async fn open_db() -> Database {
    init_tracing();
    Database::open(":memory:")
        .await
        .expect("Failed to open test database")
}

pub fn session_with(db: &Database, backend: &Arc<StubBackend>) -> Session {
    create_session(SessionConfig::new(
        db.clone(),
        backend.clone() as Arc<dyn AuthBackend>,
    ))
}

/// Persist a credential pair directly, as a prior session would have.
pub async fn seed_credential(db: &Database) -> TokenPair {
    let pair = TokenPair {
        access_token: uuid::Uuid::new_v4().to_string(),
        refresh_token: uuid::Uuid::new_v4().to_string(),
    };
    db.credentials()
        .set(
            &pair,
            gatepost::ACCESS_TOKEN_TTL_SECS,
            gatepost::REFRESH_TOKEN_TTL_SECS,
        )
        .await
        .expect("Failed to seed credential");
    pair
}
