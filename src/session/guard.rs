//! Route-guard decision logic and the read-only view projection.
//!
//! "Is logged in" is a routing concern; "which society" is an overlay
//! concern. A session pending tenant selection therefore renders protected
//! content (with the picker overlaid) instead of bouncing the navigation.

use crate::profile::UserProfile;

use super::state::{SessionPhase, SessionState};

/// What the router should do with a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    RenderProtected,
    RedirectToLogin,
    /// Hold rendering until the in-flight resolution settles.
    Suspend,
}

/// Decide how to treat a protected route for the given state.
pub fn decide(state: &SessionState) -> RouteDecision {
    if state.loading {
        return RouteDecision::Suspend;
    }
    match state.phase {
        SessionPhase::Authenticating => RouteDecision::Suspend,
        SessionPhase::Unauthenticated | SessionPhase::Failed => RouteDecision::RedirectToLogin,
        SessionPhase::PendingTenant | SessionPhase::Resolved => RouteDecision::RenderProtected,
    }
}

/// Read-only surface handed to the view layer.
///
/// The view decides what to render from these flags but never decides
/// authentication truth itself.
#[derive(Debug, Clone)]
pub struct SessionProjection {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub needs_tenant_selection: bool,
    pub current_user: Option<UserProfile>,
}

impl SessionProjection {
    pub fn of(state: &SessionState) -> Self {
        Self {
            is_authenticated: matches!(
                state.phase,
                SessionPhase::PendingTenant | SessionPhase::Resolved
            ),
            is_loading: state.loading || state.phase == SessionPhase::Authenticating,
            needs_tenant_selection: state.phase == SessionPhase::PendingTenant,
            current_user: state.profile.clone(),
        }
    }
}
