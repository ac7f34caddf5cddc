//! # Security Module
//!
//! Authentication and authorization for dispatched operations.
//!
//! ## Overview
//!
//! Each operation's effective security requirements come from its own
//! `security` list, else the contract's, else none (public). Every scheme
//! named by a requirement is resolved through `securityDefinitions`; the
//! credential is read from the declared header or query parameter and passed
//! to the [`SecurityHandler`] registered under the scheme's name.
//!
//! Once authentication passes, an optional [`AuthorizationProvider`] checks the
//! operation's `x-strut-permissions`. No declared permissions means access is
//! granted.
//!
//! ## Example
//!
//! ```rust
//! use strutrouter::context::RequestContext;
//! use strutrouter::security::SecurityHandler;
//!
//! let handler = |ctx: &mut RequestContext, key: Option<&str>| -> anyhow::Result<bool> {
//!     if key == Some("secret") {
//!         ctx.roles.push("admin".to_string());
//!         return Ok(true);
//!     }
//!     Ok(false)
//! };
//!
//! let mut ctx = RequestContext::new(http::Method::GET, "/");
//! assert!(handler.authenticate(&mut ctx, Some("secret")).unwrap());
//! assert_eq!(ctx.roles, vec!["admin".to_string()]);
//! ```

mod api_key;
pub mod rbac;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::context::RequestContext;
use crate::spec::{SecurityRequirement, SecurityScheme};

pub use rbac::{AttributeCheck, ContractRoles, RbacAuthorizer};

/// Authenticates a request for one named security scheme.
///
/// `credential` is the value found at the scheme's declared location, or
/// `None` when the request carries none. Handlers may attach caller
/// information (such as [`RequestContext::roles`]) to the context.
pub trait SecurityHandler: Send + Sync {
    fn authenticate(&self, ctx: &mut RequestContext, credential: Option<&str>) -> anyhow::Result<bool>;
}

impl<F> SecurityHandler for F
where
    F: Fn(&mut RequestContext, Option<&str>) -> anyhow::Result<bool> + Send + Sync,
{
    fn authenticate(&self, ctx: &mut RequestContext, credential: Option<&str>) -> anyhow::Result<bool> {
        self(ctx, credential)
    }
}

/// Decides whether an authenticated caller holds the required permissions.
pub trait AuthorizationProvider: Send + Sync {
    fn check(&self, ctx: &RequestContext, permissions: &[String]) -> anyhow::Result<bool>;
}

impl<F> AuthorizationProvider for F
where
    F: Fn(&RequestContext, &[String]) -> anyhow::Result<bool> + Send + Sync,
{
    fn check(&self, ctx: &RequestContext, permissions: &[String]) -> anyhow::Result<bool> {
        self(ctx, permissions)
    }
}

/// Registered security handlers keyed by scheme name.
pub type SecurityHandlers = HashMap<String, Arc<dyn SecurityHandler>>;

/// Result of evaluating an operation's security.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityOutcome {
    Allowed,
    AuthenticationFailed,
    PermissionDenied,
}

impl SecurityOutcome {
    /// Code reported to the caller for a rejected request.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            SecurityOutcome::Allowed => None,
            SecurityOutcome::AuthenticationFailed => Some("AUTH_FAILED"),
            SecurityOutcome::PermissionDenied => Some("NO_PERMISSION"),
        }
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, SecurityOutcome::Allowed)
    }
}

/// Security evaluation failures that are server faults, not caller faults.
#[derive(Debug)]
pub enum SecurityError {
    /// The operation relies on a scheme type other than `apiKey`.
    UnsupportedScheme { scheme: String, kind: String },
    /// A requirement names a scheme missing from `securityDefinitions`.
    UndefinedScheme { scheme: String },
    /// No handler is registered for a scheme in use.
    MissingHandler { scheme: String },
    /// A handler or the authorization provider failed.
    Collaborator(anyhow::Error),
}

impl fmt::Display for SecurityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityError::UnsupportedScheme { scheme, kind } => {
                write!(f, "Security scheme '{scheme}' has unsupported type '{kind}'")
            }
            SecurityError::UndefinedScheme { scheme } => {
                write!(f, "Security scheme '{scheme}' is not defined")
            }
            SecurityError::MissingHandler { scheme } => {
                write!(f, "No security handler registered for scheme '{scheme}'")
            }
            SecurityError::Collaborator(e) => write!(f, "Security check failed: {e}"),
        }
    }
}

impl std::error::Error for SecurityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SecurityError::Collaborator(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl SecurityScheme {
    /// Read this scheme's credential from the request.
    ///
    /// Errors with the scheme type when it cannot be resolved.
    pub fn resolve_credential<'a>(&self, ctx: &'a RequestContext) -> Result<Option<&'a str>, &str> {
        match self {
            SecurityScheme::ApiKey(api_key) => Ok(api_key.resolve_credential(ctx)),
            SecurityScheme::Unsupported { kind } => Err(kind.as_str()),
        }
    }
}

/// Run the authentication handlers for `requirements`.
///
/// Every scheme of every requirement must accept; the first rejection stops
/// evaluation.
pub fn authenticate(
    ctx: &mut RequestContext,
    requirements: &[SecurityRequirement],
    definitions: &BTreeMap<String, SecurityScheme>,
    handlers: &SecurityHandlers,
) -> Result<bool, SecurityError> {
    for requirement in requirements {
        for scheme_name in requirement.keys() {
            let scheme = definitions
                .get(scheme_name)
                .ok_or_else(|| SecurityError::UndefinedScheme {
                    scheme: scheme_name.clone(),
                })?;
            let credential = scheme
                .resolve_credential(ctx)
                .map_err(|kind| SecurityError::UnsupportedScheme {
                    scheme: scheme_name.clone(),
                    kind: kind.to_string(),
                })?
                .map(str::to_owned);
            let handler = handlers
                .get(scheme_name)
                .ok_or_else(|| SecurityError::MissingHandler {
                    scheme: scheme_name.clone(),
                })?;

            let accepted = handler
                .authenticate(ctx, credential.as_deref())
                .map_err(SecurityError::Collaborator)?;
            debug!(scheme = %scheme_name, accepted, "Security handler evaluated");
            if !accepted {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Evaluate authentication, then authorization when a provider is given.
pub fn evaluate(
    ctx: &mut RequestContext,
    requirements: &[SecurityRequirement],
    permissions: &[String],
    definitions: &BTreeMap<String, SecurityScheme>,
    handlers: &SecurityHandlers,
    authorizer: Option<&dyn AuthorizationProvider>,
) -> Result<SecurityOutcome, SecurityError> {
    if !authenticate(ctx, requirements, definitions, handlers)? {
        return Ok(SecurityOutcome::AuthenticationFailed);
    }

    let Some(authorizer) = authorizer else {
        return Ok(SecurityOutcome::Allowed);
    };
    if permissions.is_empty() {
        return Ok(SecurityOutcome::Allowed);
    }

    let granted = authorizer
        .check(ctx, permissions)
        .map_err(SecurityError::Collaborator)?;
    debug!(?permissions, granted, "Authorization evaluated");
    Ok(if granted {
        SecurityOutcome::Allowed
    } else {
        SecurityOutcome::PermissionDenied
    })
}
