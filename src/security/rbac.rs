//! Role-based authorization backed by the contract's `x-strut-rbac-roles`.
//!
//! ```yaml
//! x-strut-rbac-roles:
//!   admin:
//!     permissions: [pets:read, pets:write]
//!   viewer:
//!     permissions: [pets:read]
//!     attributes: [readonly]
//! ```
//!
//! Authentication handlers attach the caller's roles to
//! [`RequestContext::roles`]; [`RbacAuthorizer`] then grants an operation when
//! every permission it requires is granted by at least one of those roles.
//!
//! Role `attributes` are conditions on a role's grants. They are checked only
//! when the authorizer has an attribute check
//! ([`RbacAuthorizer::with_attribute_check`]); a role then grants its
//! permissions for a request only if every one of its attributes holds.
//! Without a check, attributes are informational.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::AuthorizationProvider;
use crate::context::RequestContext;
use crate::spec::{Contract, RoleSpec};

/// Role table read from the contract.
#[derive(Debug, Clone, Default)]
pub struct ContractRoles {
    roles: BTreeMap<String, RoleSpec>,
}

impl ContractRoles {
    #[must_use]
    pub fn from_contract(contract: &Contract) -> Self {
        Self {
            roles: contract.rbac_roles.clone().unwrap_or_default(),
        }
    }

    /// Permissions granted by `role`; empty for unknown roles.
    #[must_use]
    pub fn permissions(&self, role: &str) -> &[String] {
        self.roles
            .get(role)
            .map(|r| r.permissions.as_slice())
            .unwrap_or(&[])
    }

    /// Attributes attached to `role`; empty for unknown roles.
    #[must_use]
    pub fn attributes(&self, role: &str) -> &[String] {
        self.roles
            .get(role)
            .map(|r| r.attributes.as_slice())
            .unwrap_or(&[])
    }

    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Decides whether a role attribute holds for the current request.
pub type AttributeCheck = Arc<dyn Fn(&RequestContext, &str) -> bool + Send + Sync>;

/// [`AuthorizationProvider`] over a [`ContractRoles`] table.
#[derive(Clone, Default)]
pub struct RbacAuthorizer {
    roles: ContractRoles,
    attribute_check: Option<AttributeCheck>,
}

impl fmt::Debug for RbacAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RbacAuthorizer")
            .field("roles", &self.roles)
            .field("attribute_check", &self.attribute_check.is_some())
            .finish()
    }
}

impl RbacAuthorizer {
    #[must_use]
    pub fn new(roles: ContractRoles) -> Self {
        Self {
            roles,
            attribute_check: None,
        }
    }

    #[must_use]
    pub fn from_contract(contract: &Contract) -> Self {
        Self::new(ContractRoles::from_contract(contract))
    }

    /// Make role attributes conditions on the role's grants.
    #[must_use]
    pub fn with_attribute_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&RequestContext, &str) -> bool + Send + Sync + 'static,
    {
        self.attribute_check = Some(Arc::new(check));
        self
    }

    #[must_use]
    pub fn roles(&self) -> &ContractRoles {
        &self.roles
    }

    fn role_applies(&self, ctx: &RequestContext, role: &str) -> bool {
        match &self.attribute_check {
            Some(check) => self
                .roles
                .attributes(role)
                .iter()
                .all(|attribute| check(ctx, attribute)),
            None => true,
        }
    }

    fn grants(&self, ctx: &RequestContext, permission: &str) -> bool {
        ctx.roles.iter().any(|role| {
            self.roles.permissions(role).iter().any(|p| p == permission)
                && self.role_applies(ctx, role)
        })
    }
}

impl AuthorizationProvider for RbacAuthorizer {
    fn check(&self, ctx: &RequestContext, permissions: &[String]) -> anyhow::Result<bool> {
        let missing = permissions
            .iter()
            .find(|p| !self.grants(ctx, p));
        if let Some(permission) = missing {
            debug!(
                roles = ?ctx.roles,
                permission = %permission,
                "No role grants permission"
            );
            return Ok(false);
        }
        Ok(true)
    }
}
