//! The session state machine.
//!
//! Pure transition logic: applying an event either yields a complete new
//! state or an error, and an illegal phase/event pair is an immediate error
//! rather than a silently-ignored default case. All IO (stores, backend
//! calls) happens in the session context before events are applied.

use crate::backend::TokenPair;
use crate::db::Credential;
use crate::profile::UserProfile;

use super::errors::SessionError;

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No credential and no profile.
    Unauthenticated,
    /// A login or registration attempt is in flight.
    Authenticating,
    /// Logged in with more than one membership and no society chosen yet.
    PendingTenant,
    /// Logged in with the society question settled (possibly "no society").
    Resolved,
    /// An authentication attempt failed. Terminal for the attempt: the next
    /// login or registration starts fresh.
    Failed,
}

/// Outcome of folding a stored society choice into a fetched membership set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantChoice {
    /// A concrete society, or none at all for a membership-less user.
    Resolved(Option<String>),
    /// More than one membership and nothing stored to pick between them.
    Pending,
}

/// Reconcile a previously stored society choice with a freshly fetched
/// membership set.
///
/// A stored id that no longer appears among the memberships is treated as
/// absent. With no usable stored choice, a sole membership auto-resolves,
/// zero memberships resolve tenant-less, and anything more is pending.
pub fn fold_tenant_choice(profile: &UserProfile, stored: Option<&str>) -> TenantChoice {
    if let Some(id) = stored {
        if profile.has_membership(id) {
            return TenantChoice::Resolved(Some(id.to_string()));
        }
    }
    match profile.memberships.as_slice() {
        [] => TenantChoice::Resolved(None),
        [only] => TenantChoice::Resolved(Some(only.tenant_id.clone())),
        _ => TenantChoice::Pending,
    }
}

/// Discrete events driving the state machine.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A login or registration attempt started.
    LoginRequested,
    /// The attempt produced a credential; the dependent profile fetch either
    /// succeeded (`profile` present) or is being degraded past (`None`).
    LoginSucceeded {
        credential: TokenPair,
        profile: Option<UserProfile>,
        stored_choice: Option<String>,
    },
    /// The attempt failed with a user-facing message.
    LoginFailed(String),
    /// The user picked a society, first selection and later switch alike.
    TenantSelected(String),
    /// A successful fetch or update replaced the profile wholesale.
    ProfileReplaced(UserProfile),
    /// The user logged out.
    LogoutRequested,
}

impl SessionEvent {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            SessionEvent::LoginRequested => "LoginRequested",
            SessionEvent::LoginSucceeded { .. } => "LoginSucceeded",
            SessionEvent::LoginFailed(_) => "LoginFailed",
            SessionEvent::TenantSelected(_) => "TenantSelected",
            SessionEvent::ProfileReplaced(_) => "ProfileReplaced",
            SessionEvent::LogoutRequested => "LogoutRequested",
        }
    }
}

/// The authoritative in-memory session state.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub profile: Option<UserProfile>,
    pub credential: Option<Credential>,
    pub selected_tenant: Option<String>,
    pub last_error: Option<String>,
    /// True until the boot-time resolve settles.
    pub loading: bool,
}

impl SessionState {
    /// Fresh pre-boot state.
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            profile: None,
            credential: None,
            selected_tenant: None,
            last_error: None,
            loading: true,
        }
    }

    /// Settled logged-out state.
    pub fn unauthenticated() -> Self {
        Self {
            loading: false,
            ..Self::new()
        }
    }

    /// Apply one event, producing the next state.
    ///
    /// Pure: `self` is never mutated, so a validation failure (for example an
    /// unknown society id) leaves the caller's state untouched.
    pub fn apply(&self, event: SessionEvent) -> Result<SessionState, SessionError> {
        use SessionEvent::*;
        use SessionPhase::*;

        match (self.phase, event) {
            (Unauthenticated | Failed, LoginRequested) => Ok(Self {
                phase: Authenticating,
                profile: None,
                credential: None,
                selected_tenant: None,
                last_error: None,
                loading: false,
            }),

            (
                Authenticating,
                LoginSucceeded {
                    credential,
                    profile,
                    stored_choice,
                },
            ) => {
                // Degrade-not-fail: a missing profile still counts as logged
                // in; the society question stays unanswered until a later
                // successful fetch.
                let (phase, selected, profile) = match profile {
                    None => (Resolved, None, None),
                    Some(profile) => {
                        match fold_tenant_choice(&profile, stored_choice.as_deref()) {
                            TenantChoice::Resolved(selected) => (Resolved, selected, Some(profile)),
                            TenantChoice::Pending => (PendingTenant, None, Some(profile)),
                        }
                    }
                };
                Ok(Self {
                    phase,
                    profile,
                    credential: Some(Credential::from_pair(&credential)),
                    selected_tenant: selected,
                    last_error: None,
                    loading: false,
                })
            }

            (Authenticating, LoginFailed(message)) => Ok(Self {
                phase: Failed,
                profile: None,
                credential: None,
                selected_tenant: None,
                last_error: Some(message),
                loading: false,
            }),

            (PendingTenant | Resolved, TenantSelected(tenant_id)) => {
                let profile = self.profile.as_ref().ok_or(SessionError::ProfileMissing)?;
                if !profile.has_membership(&tenant_id) {
                    return Err(SessionError::InvalidTenant(tenant_id));
                }
                Ok(Self {
                    phase: Resolved,
                    selected_tenant: Some(tenant_id),
                    ..self.clone()
                })
            }

            (PendingTenant | Resolved, ProfileReplaced(profile)) => {
                // Re-fold against the new membership set: a selected society
                // that vanished from it is treated as never selected.
                let (phase, selected) =
                    match fold_tenant_choice(&profile, self.selected_tenant.as_deref()) {
                        TenantChoice::Resolved(selected) => (Resolved, selected),
                        TenantChoice::Pending => (PendingTenant, None),
                    };
                Ok(Self {
                    phase,
                    profile: Some(profile),
                    selected_tenant: selected,
                    ..self.clone()
                })
            }

            // Logging out is legal from anywhere and clears everything.
            (_, LogoutRequested) => Ok(Self::unauthenticated()),

            (phase, event) => Err(SessionError::IllegalEvent {
                phase,
                event: event.name(),
            }),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
