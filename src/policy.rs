// Capability-set access control. Route handlers resolve a session into an
// Actor; services check capabilities against an injected policy instead of
// matching on role strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Account tiers known to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Global operator administration
    SuperAdmin,
    /// Per-organization read access
    OrgViewer,
    /// Read-only government auditor, not scoped to one organization
    Auditor,
}

/// Discrete things an actor may be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewPlants,
    ManagePlants,
    ViewWorkOrders,
    ManageWorkOrders,
    ManageVendors,
    TriggerSync,
}

/// An authenticated caller. `org_id` is `None` for globally-scoped accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub org_id: Option<Uuid>,
}

impl Actor {
    /// Whether this actor may touch data belonging to `org_id`.
    /// Org-scoped actors see only their own organization.
    pub fn can_access_org(&self, org_id: Uuid) -> bool {
        match self.org_id {
            Some(own) => own == org_id,
            None => true,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("actor {actor} lacks capability {capability:?}")]
    Denied { actor: Uuid, capability: Capability },
    #[error("actor {actor} may not access organization {org_id}")]
    WrongOrganization { actor: Uuid, org_id: Uuid },
}

/// Injected permission check. Implementations must be cheap; services call
/// this on every mutating operation.
pub trait AccessPolicy: Send + Sync {
    fn allows(&self, actor: &Actor, capability: Capability) -> bool;

    fn require(&self, actor: &Actor, capability: Capability) -> Result<(), PolicyError> {
        if self.allows(actor, capability) {
            Ok(())
        } else {
            Err(PolicyError::Denied {
                actor: actor.id,
                capability,
            })
        }
    }
}

/// Static role-to-capability table matching the three account tiers
#[derive(Debug, Default, Clone, Copy)]
pub struct RolePolicy;

impl RolePolicy {
    fn capabilities(role: Role) -> &'static [Capability] {
        use Capability::*;
        match role {
            Role::SuperAdmin => &[
                ViewPlants,
                ManagePlants,
                ViewWorkOrders,
                ManageWorkOrders,
                ManageVendors,
                TriggerSync,
            ],
            Role::OrgViewer => &[ViewPlants, ViewWorkOrders],
            Role::Auditor => &[ViewPlants, ViewWorkOrders],
        }
    }
}

impl AccessPolicy for RolePolicy {
    fn allows(&self, actor: &Actor, capability: Capability) -> bool {
        Self::capabilities(actor.role).contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, org_id: Option<Uuid>) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            org_id,
        }
    }

    #[test]
    fn test_super_admin_has_every_capability() {
        let policy = RolePolicy;
        let admin = actor(Role::SuperAdmin, None);
        for capability in [
            Capability::ViewPlants,
            Capability::ManagePlants,
            Capability::ViewWorkOrders,
            Capability::ManageWorkOrders,
            Capability::ManageVendors,
            Capability::TriggerSync,
        ] {
            assert!(policy.allows(&admin, capability));
        }
    }

    #[test]
    fn test_viewer_and_auditor_are_read_only() {
        let policy = RolePolicy;
        for role in [Role::OrgViewer, Role::Auditor] {
            let a = actor(role, Some(Uuid::new_v4()));
            assert!(policy.allows(&a, Capability::ViewPlants));
            assert!(policy.allows(&a, Capability::ViewWorkOrders));
            assert!(!policy.allows(&a, Capability::ManagePlants));
            assert!(!policy.allows(&a, Capability::ManageWorkOrders));
            assert!(!policy.allows(&a, Capability::TriggerSync));
        }
    }

    #[test]
    fn test_require_reports_the_capability() {
        let policy = RolePolicy;
        let viewer = actor(Role::OrgViewer, Some(Uuid::new_v4()));
        let err = policy
            .require(&viewer, Capability::TriggerSync)
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::Denied {
                actor: viewer.id,
                capability: Capability::TriggerSync,
            }
        );
    }

    #[test]
    fn test_org_scoping() {
        let org = Uuid::new_v4();
        let other = Uuid::new_v4();

        let scoped = actor(Role::OrgViewer, Some(org));
        assert!(scoped.can_access_org(org));
        assert!(!scoped.can_access_org(other));

        // Global accounts (admin, auditor) see every organization
        let global = actor(Role::Auditor, None);
        assert!(global.can_access_org(org));
        assert!(global.can_access_org(other));
    }
}
