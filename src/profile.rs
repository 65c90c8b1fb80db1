//! User profile and membership snapshots fetched from the backend.
//!
//! Memberships are immutable snapshots; the session core never mutates them,
//! it only replaces the whole profile after a successful fetch or update.

use serde::{Deserialize, Serialize};

/// Membership category within a society.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    Owner,
    Tenant,
    Admin,
    Manager,
}

/// Denormalized society attributes carried on each membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSummary {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub active: bool,
}

/// One user's membership in one society.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub tenant_id: String,
    pub tenant: TenantSummary,
    pub role: MembershipRole,
    /// Unit/block locator within the society, e.g. "B-404".
    pub unit: String,
    pub active: bool,
    pub joined_at: String,
}

/// Identity attributes plus the set of memberships the user holds.
///
/// Beyond membership lookups the contact attributes are pass-through: the
/// session core carries them for the view layer without interpreting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub memberships: Vec<Membership>,
}

impl UserProfile {
    /// Look up a membership by society id.
    pub fn membership(&self, tenant_id: &str) -> Option<&Membership> {
        self.memberships.iter().find(|m| m.tenant_id == tenant_id)
    }

    /// Whether the user holds a membership in the given society.
    ///
    /// Single validation source for both the first tenant selection and
    /// later switches.
    pub fn has_membership(&self, tenant_id: &str) -> bool {
        self.membership(tenant_id).is_some()
    }

    /// The only membership, when the user has exactly one.
    pub fn sole_membership(&self) -> Option<&Membership> {
        match self.memberships.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// Partial profile update sent to the backend; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
