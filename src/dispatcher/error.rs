use http::{Method, StatusCode};
use serde_json::{json, Value};
use std::fmt;

use crate::coerce::CoerceError;
use crate::context::RequestContext;
use crate::models::ModelError;
use crate::schema::ValidationErrors;
use crate::security::{SecurityError, SecurityOutcome};

/// Why a matched request did not reach a successful handler invocation.
#[derive(Debug)]
pub enum DispatchError {
    /// The path matched but declares no operation for this method.
    MethodNotAllowed { method: Method, allowed: Vec<Method> },
    /// Authentication or authorization rejected the caller.
    Unauthorized(SecurityOutcome),
    /// Path parameters or body failed their schema.
    Validation(ValidationErrors),
    /// A model binding found no entity.
    EntityNotFound { entity: String, key: Value },
    /// The operation relies on a security scheme type that is not supported.
    UnsupportedScheme { scheme: String, kind: String },
    /// Input normalization failed.
    Coerce(CoerceError),
    /// The operation handler panicked.
    HandlerPanic { operation_id: String, message: String },
    /// Any other failure from a collaborator.
    Unexpected(anyhow::Error),
}

impl DispatchError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DispatchError::Validation(_) => StatusCode::BAD_REQUEST,
            DispatchError::EntityNotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::UnsupportedScheme { .. }
            | DispatchError::Coerce(_)
            | DispatchError::HandlerPanic { .. }
            | DispatchError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code included in the error body.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            DispatchError::Unauthorized(outcome) => outcome.code().unwrap_or("UNAUTHORIZED"),
            DispatchError::Validation(_) => "VALIDATION_FAILED",
            DispatchError::EntityNotFound { .. } => "NOT_FOUND",
            DispatchError::UnsupportedScheme { .. } => "UNSUPPORTED_SCHEME",
            DispatchError::Coerce(_) | DispatchError::HandlerPanic { .. } | DispatchError::Unexpected(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// Security outcome for 401s.
    #[must_use]
    pub fn outcome(&self) -> Option<SecurityOutcome> {
        match self {
            DispatchError::Unauthorized(outcome) => Some(*outcome),
            _ => None,
        }
    }

    /// Translate into a JSON error response on `ctx`.
    ///
    /// Server-side details never reach the body; validation failures are
    /// listed only when `expose_validation_errors` is set.
    pub fn write_to(&self, ctx: &mut RequestContext, expose_validation_errors: bool) {
        let status = self.status();
        let mut body = json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "code": self.code(),
        });
        match self {
            DispatchError::MethodNotAllowed { allowed, .. } => {
                body["allowed"] = allowed.iter().map(|m| Value::from(m.as_str())).collect();
            }
            DispatchError::Validation(errors) if expose_validation_errors => {
                body["details"] = json!(errors);
            }
            _ => {}
        }
        ctx.content_type = Some("application/json".to_string());
        ctx.respond(status, body);
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::MethodNotAllowed { method, .. } => {
                write!(f, "Method {method} not allowed")
            }
            DispatchError::Unauthorized(outcome) => {
                write!(f, "Unauthorized ({})", outcome.code().unwrap_or("UNAUTHORIZED"))
            }
            DispatchError::Validation(errors) => write!(f, "Validation failed: {errors}"),
            DispatchError::EntityNotFound { entity, key } => write!(f, "{entity} {key} not found"),
            DispatchError::UnsupportedScheme { scheme, kind } => {
                write!(f, "Security scheme '{scheme}' has unsupported type '{kind}'")
            }
            DispatchError::Coerce(e) => write!(f, "{e}"),
            DispatchError::HandlerPanic {
                operation_id,
                message,
            } => write!(f, "Handler '{operation_id}' panicked: {message}"),
            DispatchError::Unexpected(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Coerce(e) => Some(e),
            DispatchError::Unexpected(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<SecurityError> for DispatchError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::UnsupportedScheme { scheme, kind } => {
                DispatchError::UnsupportedScheme { scheme, kind }
            }
            SecurityError::Collaborator(e) => DispatchError::Unexpected(e),
            other => DispatchError::Unexpected(anyhow::Error::new(other)),
        }
    }
}

impl From<ModelError> for DispatchError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound { entity, key } => DispatchError::EntityNotFound { entity, key },
            ModelError::Finder(e) => DispatchError::Unexpected(e),
            other => DispatchError::Unexpected(anyhow::Error::new(other)),
        }
    }
}

impl From<CoerceError> for DispatchError {
    fn from(err: CoerceError) -> Self {
        DispatchError::Coerce(err)
    }
}
