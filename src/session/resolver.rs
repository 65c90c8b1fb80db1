//! Boot-time session reconciliation.
//!
//! Runs exactly once at process start and reconciles three independently
//! persisted facts into one settled state: the credential pair, a fresh
//! profile fetch, and the stored society choice. Failures here fall back to
//! logged-out silently; diagnostics go to the log, not the user.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::AuthBackend;
use crate::db::Database;

use super::state::{SessionPhase, SessionState, TenantChoice, fold_tenant_choice};

/// Produce the settled boot state.
///
/// Clears the credential store when the persisted credential turns out to be
/// unusable (expired access slot or a failing profile fetch) so the next boot
/// starts clean.
pub(crate) async fn resolve(
    db: &Database,
    backend: &Arc<dyn AuthBackend>,
) -> Result<SessionState, sqlx::Error> {
    let Some(credential) = db.credentials().get().await? else {
        info!("no persisted credential, starting logged out");
        return Ok(SessionState::unauthenticated());
    };

    let Some(access_token) = credential.access_token.clone() else {
        // The access slot expired out from under us. The core has no refresh
        // flow, so the remaining refresh token cannot be redeemed here.
        warn!("persisted access token expired, clearing credential store");
        db.credentials().clear().await?;
        return Ok(SessionState::unauthenticated());
    };

    let profile = match backend.fetch_profile(&access_token).await {
        Ok(profile) => profile,
        Err(err) => {
            // Conservative policy: any fetch failure at boot is treated as an
            // invalid credential. Surfacing logged-out is simpler and safer
            // than guessing staleness.
            warn!("boot profile fetch failed, clearing credential: {}", err);
            db.credentials().clear().await?;
            return Ok(SessionState::unauthenticated());
        }
    };

    let stored = db.tenant_choice().get().await?;
    let state = match fold_tenant_choice(&profile, stored.as_deref()) {
        TenantChoice::Resolved(selected) => {
            if let Some(id) = &selected {
                if stored.as_deref() != Some(id.as_str()) {
                    info!("auto-selected sole society {}", id);
                    db.tenant_choice().set(id).await?;
                }
            }
            SessionState {
                phase: SessionPhase::Resolved,
                profile: Some(profile),
                credential: Some(credential),
                selected_tenant: selected,
                last_error: None,
                loading: false,
            }
        }
        TenantChoice::Pending => SessionState {
            phase: SessionPhase::PendingTenant,
            profile: Some(profile),
            credential: Some(credential),
            selected_tenant: None,
            last_error: None,
            loading: false,
        },
    };

    Ok(state)
}
