//! Session error types.

use crate::backend::BackendError;

use super::state::SessionPhase;

/// Errors surfaced by the session core.
#[derive(Debug)]
pub enum SessionError {
    /// The society id is not among the current user's memberships.
    InvalidTenant(String),
    /// The operation needs a loaded profile and there is none.
    ProfileMissing,
    /// The operation needs a live access token and there is none.
    CredentialMissing,
    /// A login or registration attempt is already in flight.
    AttemptInFlight,
    /// The attempt's result arrived after the session was cleared and was
    /// discarded.
    AttemptSuperseded,
    /// The boot-time resolve has not settled yet.
    BootPending,
    /// The boot-time resolve already ran.
    AlreadyBooted,
    /// The event is not legal in the current phase.
    IllegalEvent {
        phase: SessionPhase,
        event: &'static str,
    },
    /// The durable store failed.
    Storage(sqlx::Error),
    /// The backend collaborator failed.
    Backend(BackendError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidTenant(id) => {
                write!(f, "Society {} is not among the user's memberships", id)
            }
            SessionError::ProfileMissing => write!(f, "No user profile is loaded"),
            SessionError::CredentialMissing => write!(f, "No access token is available"),
            SessionError::AttemptInFlight => {
                write!(f, "Another authentication attempt is in flight")
            }
            SessionError::AttemptSuperseded => {
                write!(f, "Authentication result discarded: session was cleared meanwhile")
            }
            SessionError::BootPending => write!(f, "Session boot has not settled yet"),
            SessionError::AlreadyBooted => write!(f, "Session boot already ran"),
            SessionError::IllegalEvent { phase, event } => {
                write!(f, "Event {} is not legal in phase {:?}", event, phase)
            }
            SessionError::Storage(e) => write!(f, "Storage error: {}", e),
            SessionError::Backend(e) => write!(f, "Backend error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<sqlx::Error> for SessionError {
    fn from(e: sqlx::Error) -> Self {
        SessionError::Storage(e)
    }
}
