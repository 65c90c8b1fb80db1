//! The session context object.
//!
//! Owns the durable stores, the backend collaborator, and the authoritative
//! in-memory state. Replaces the app-wide mutable singleton of the original
//! console: the composition root constructs one `Session` and passes it
//! around, and all transitions commit through it, one at a time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::backend::{AuthBackend, BackendError, Registration, TokenPair};
use crate::db::Database;
use crate::profile::ProfileUpdate;
use crate::{SessionConfig, session::resolver};

use super::errors::SessionError;
use super::guard::{RouteDecision, SessionProjection, decide};
use super::state::{SessionEvent, SessionState, TenantChoice, fold_tenant_choice};

/// The live session for one running instance of the console.
pub struct Session {
    db: Database,
    backend: Arc<dyn AuthBackend>,
    state: Mutex<SessionState>,
    /// Serializes login/registration attempts and the boot resolve. Held
    /// across the backend suspension points; a second attempt is rejected,
    /// never queued.
    in_flight: tokio::sync::Mutex<()>,
    /// Bumped whenever the session is cleared. A backend response tagged with
    /// an older epoch is stale and gets discarded.
    epoch: AtomicU64,
    booted: AtomicBool,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl Session {
    pub(crate) fn new(config: SessionConfig) -> Self {
        Self {
            db: config.db,
            backend: config.backend,
            state: Mutex::new(SessionState::new()),
            in_flight: tokio::sync::Mutex::new(()),
            epoch: AtomicU64::new(0),
            booted: AtomicBool::new(false),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    fn state_lock(&self) -> MutexGuard<'_, SessionState> {
        // The state lock is only ever held for a clone or a commit, never
        // across an await, so a poisoned guard still holds a complete state.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state_lock().clone()
    }

    /// The read-only surface handed to the view layer.
    pub fn projection(&self) -> SessionProjection {
        SessionProjection::of(&self.state_lock())
    }

    /// Route-guard decision for the current state.
    pub fn decide(&self) -> RouteDecision {
        decide(&self.state_lock())
    }

    /// Run the boot-time resolve. Must settle before any user-initiated
    /// operation is accepted; a second call is an error.
    pub async fn boot(&self) -> Result<SessionState, SessionError> {
        if self.booted.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyBooted);
        }
        let _guard = self.in_flight.lock().await;

        let resolved = match resolver::resolve(&self.db, &self.backend).await {
            Ok(state) => state,
            Err(err) => {
                // Leave the context bootable so the caller may retry.
                self.booted.store(false, Ordering::SeqCst);
                return Err(SessionError::Storage(err));
            }
        };

        let mut state = self.state_lock();
        *state = resolved;
        Ok(state.clone())
    }

    fn ensure_booted(&self) -> Result<(), SessionError> {
        if self.state_lock().loading {
            return Err(SessionError::BootPending);
        }
        Ok(())
    }

    /// Authenticate with an identifier/secret pair.
    ///
    /// Legal only from the logged-out and failed phases. A second call while
    /// an attempt is in flight is rejected with `AttemptInFlight`.
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<SessionState, SessionError> {
        self.ensure_booted()?;
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| SessionError::AttemptInFlight)?;

        let attempt_epoch = self.begin_attempt()?;
        let outcome = self.backend.login(identifier, secret).await;
        self.complete_attempt(attempt_epoch, outcome).await
    }

    /// Register a new account. Follows the same attempt lifecycle as `login`.
    pub async fn register(&self, registration: &Registration) -> Result<SessionState, SessionError> {
        self.ensure_booted()?;
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| SessionError::AttemptInFlight)?;

        let attempt_epoch = self.begin_attempt()?;
        let outcome = self.backend.register(registration).await;
        self.complete_attempt(attempt_epoch, outcome).await
    }

    fn attempt_stale(&self, attempt_epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) != attempt_epoch
    }

    /// Commit the transition into `Authenticating` and tag the attempt.
    fn begin_attempt(&self) -> Result<u64, SessionError> {
        let mut state = self.state_lock();
        let next = state.apply(SessionEvent::LoginRequested)?;
        *state = next;
        Ok(self.epoch.load(Ordering::SeqCst))
    }

    /// Shared tail of login and registration: persist the credential, run the
    /// dependent best-effort profile fetch, fold in the stored society
    /// choice, and commit -- unless a logout superseded the attempt meanwhile.
    async fn complete_attempt(
        &self,
        attempt_epoch: u64,
        outcome: Result<TokenPair, BackendError>,
    ) -> Result<SessionState, SessionError> {
        // A logout that ran while the backend call was in flight already
        // cleared the session; nothing from this attempt may touch the
        // stores or the state anymore.
        if self.attempt_stale(attempt_epoch) {
            info!("discarding authentication result from a superseded attempt");
            return Err(SessionError::AttemptSuperseded);
        }

        let pair = match outcome {
            Ok(pair) => pair,
            Err(err) => {
                warn!("authentication attempt failed: {}", err);
                let mut state = self.state_lock();
                let next = state.apply(SessionEvent::LoginFailed(err.to_string()))?;
                *state = next;
                return Ok(state.clone());
            }
        };

        // Last write wins: the new pair replaces whatever was stored.
        self.db
            .credentials()
            .set(&pair, self.access_ttl_secs, self.refresh_ttl_secs)
            .await?;

        // Dependent fetch; the attempt still advances when it fails.
        let profile = match self.backend.fetch_profile(&pair.access_token).await {
            Ok(profile) => Some(profile),
            Err(err) => {
                warn!("profile fetch after login failed, continuing without profile: {}", err);
                None
            }
        };

        let stored_choice = self.db.tenant_choice().get().await?;

        // A sole membership auto-resolves; persist that before committing,
        // like the boot resolver does, so the committed state and the stored
        // choice cannot part ways.
        if let Some(profile) = &profile {
            if let TenantChoice::Resolved(Some(id)) =
                fold_tenant_choice(profile, stored_choice.as_deref())
            {
                if stored_choice.as_deref() != Some(id.as_str()) {
                    self.db.tenant_choice().set(&id).await?;
                }
            }
        }

        {
            let mut state = self.state_lock();
            // Checked again under the lock: the dependent fetch and the store
            // writes were further suspension points.
            if !self.attempt_stale(attempt_epoch) {
                let next = state.apply(SessionEvent::LoginSucceeded {
                    credential: pair,
                    profile,
                    stored_choice,
                })?;
                *state = next;
                return Ok(state.clone());
            }
        }

        // A logout superseded the attempt mid-flight; a discarded result
        // must leave nothing behind in the stores either.
        info!("discarding authentication result from a superseded attempt");
        self.db.credentials().clear().await?;
        self.db.tenant_choice().clear().await?;
        Err(SessionError::AttemptSuperseded)
    }

    /// Log out. Local state always clears; the remote invalidation is
    /// best-effort and never blocks or delays it.
    pub async fn logout(&self) -> Result<SessionState, SessionError> {
        self.ensure_booted()?;

        let (cleared, refresh_token) = {
            let mut state = self.state_lock();
            let refresh_token = state
                .credential
                .as_ref()
                .and_then(|c| c.refresh_token.clone());
            // Anything still in flight is now stale.
            self.epoch.fetch_add(1, Ordering::SeqCst);
            let next = state.apply(SessionEvent::LogoutRequested)?;
            *state = next;
            (state.clone(), refresh_token)
        };

        // The stores clear together with the in-memory transition. Only then
        // does the remote invalidation fire: a re-login accepted while it is
        // still in flight must not have its fresh credential wiped by a
        // straggling clear.
        self.db.credentials().clear().await?;
        self.db.tenant_choice().clear().await?;

        if let Some(token) = refresh_token {
            if let Err(err) = self.backend.logout(&token).await {
                warn!("remote logout failed, local session already cleared: {}", err);
            }
        }

        Ok(cleared)
    }

    /// Select or switch the current society.
    ///
    /// Validates the id against the membership set before any mutation; the
    /// in-memory selection and the persisted choice move as one unit, so a
    /// failing store write leaves the in-memory state untouched.
    pub async fn switch_tenant(&self, tenant_id: &str) -> Result<SessionState, SessionError> {
        self.ensure_booted()?;

        let attempt_epoch = {
            let state = self.state_lock();
            // Validate against the live membership set before touching
            // either the store or the state; the result is discarded.
            state.apply(SessionEvent::TenantSelected(tenant_id.to_string()))?;
            self.epoch.load(Ordering::SeqCst)
        };

        self.db.tenant_choice().set(tenant_id).await?;

        {
            let mut state = self.state_lock();
            if !self.attempt_stale(attempt_epoch) {
                let next = state.apply(SessionEvent::TenantSelected(tenant_id.to_string()))?;
                *state = next;
                info!("switched to society {}", tenant_id);
                return Ok(state.clone());
            }
        }

        // A logout landed while the choice was being persisted; undo it.
        self.db.tenant_choice().clear().await?;
        Err(SessionError::AttemptSuperseded)
    }

    /// Re-fetch the profile with the live access token and replace the local
    /// copy wholesale.
    ///
    /// This is how a login that degraded past a failed profile fetch later
    /// recovers its profile (and, with it, the society resolution).
    pub async fn refresh_profile(&self) -> Result<SessionState, SessionError> {
        self.ensure_booted()?;

        let (attempt_epoch, access_token, selected) = {
            let state = self.state_lock();
            let access_token = state
                .credential
                .as_ref()
                .and_then(|c| c.access_token.clone())
                .ok_or(SessionError::CredentialMissing)?;
            (
                self.epoch.load(Ordering::SeqCst),
                access_token,
                state.selected_tenant.clone(),
            )
        };

        let profile = self
            .backend
            .fetch_profile(&access_token)
            .await
            .map_err(SessionError::Backend)?;

        // Persist an auto-resolved choice before committing, as the login
        // path does.
        if let TenantChoice::Resolved(Some(id)) = fold_tenant_choice(&profile, selected.as_deref())
        {
            if selected.as_deref() != Some(id.as_str()) {
                self.db.tenant_choice().set(&id).await?;
            }
        }

        {
            let mut state = self.state_lock();
            if !self.attempt_stale(attempt_epoch) {
                let next = state.apply(SessionEvent::ProfileReplaced(profile))?;
                *state = next;
                return Ok(state.clone());
            }
        }

        self.db.tenant_choice().clear().await?;
        Err(SessionError::AttemptSuperseded)
    }

    /// Push a partial profile update to the backend and replace the local
    /// profile wholesale with its response.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<SessionState, SessionError> {
        self.ensure_booted()?;

        let user_id = self
            .state_lock()
            .profile
            .as_ref()
            .map(|p| p.id.clone())
            .ok_or(SessionError::ProfileMissing)?;

        let profile = self
            .backend
            .update_profile(&user_id, update)
            .await
            .map_err(SessionError::Backend)?;

        let mut state = self.state_lock();
        let next = state.apply(SessionEvent::ProfileReplaced(profile))?;
        *state = next;
        Ok(state.clone())
    }
}
