//! Session state machine, boot-time resolver, and route guard.
//!
//! The machine itself is pure (`state`); the context (`context`) is the only
//! place transitions commit, and the guard (`guard`) turns the committed
//! state into a routing decision.

mod context;
mod errors;
mod guard;
mod resolver;
mod state;

pub use context::Session;
pub use errors::SessionError;
pub use guard::{RouteDecision, SessionProjection, decide};
pub use state::{SessionEvent, SessionPhase, SessionState, TenantChoice, fold_tenant_choice};
