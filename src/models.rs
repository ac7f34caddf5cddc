//! Entity preloading for parameters carrying an `x-strut-model` binding.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::context::RequestContext;
use crate::spec::{ParameterLocation, ParameterSpec};

/// Looks up one entity type by key.
pub trait Finder: Send + Sync {
    /// `Ok(None)` means the entity does not exist.
    fn find_by_id(&self, key: &Value) -> anyhow::Result<Option<Value>>;
}

impl<F> Finder for F
where
    F: Fn(&Value) -> anyhow::Result<Option<Value>> + Send + Sync,
{
    fn find_by_id(&self, key: &Value) -> anyhow::Result<Option<Value>> {
        self(key)
    }
}

/// Registered finders keyed by entity type.
pub type Finders = HashMap<String, Arc<dyn Finder>>;

#[derive(Debug)]
pub enum ModelError {
    /// The finder returned no entity for the key.
    NotFound { entity: String, key: Value },
    /// No finder is registered for the entity type.
    MissingFinder { entity: String },
    /// The finder itself failed.
    Finder(anyhow::Error),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NotFound { entity, key } => write!(f, "{entity} {key} not found"),
            ModelError::MissingFinder { entity } => {
                write!(f, "No finder registered for entity type '{entity}'")
            }
            ModelError::Finder(e) => write!(f, "Finder failed: {e}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Finder(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Lookup key for a bound parameter: the raw path capture for `in: path`,
/// the input field for `in: formData|body`, otherwise null.
#[must_use]
pub fn model_key(param: &ParameterSpec, ctx: &RequestContext) -> Value {
    match param.location {
        ParameterLocation::Path => ctx
            .params
            .get(&param.name)
            .map_or(Value::Null, |v| Value::String(v.clone())),
        ParameterLocation::FormData | ParameterLocation::Body => ctx
            .field(&param.name)
            .map_or(Value::Null, |v| v.to_json()),
        ParameterLocation::Query | ParameterLocation::Header => Value::Null,
    }
}

/// Resolve every model binding in declaration order.
///
/// Stops at the first entity that cannot be found.
pub fn resolve_models(
    params: &[ParameterSpec],
    ctx: &RequestContext,
    finders: &Finders,
) -> Result<HashMap<String, Value>, ModelError> {
    let mut models = HashMap::new();

    for param in params {
        let Some(binding) = &param.model else {
            continue;
        };
        let finder = finders
            .get(&binding.entity)
            .ok_or_else(|| ModelError::MissingFinder {
                entity: binding.entity.clone(),
            })?;

        let key = model_key(param, ctx);
        let entity = finder.find_by_id(&key).map_err(ModelError::Finder)?;
        let Some(entity) = entity else {
            debug!(entity = %binding.entity, key = %key, "Model not found");
            return Err(ModelError::NotFound {
                entity: binding.entity.clone(),
                key,
            });
        };
        models.insert(binding.name.clone(), entity);
    }

    Ok(models)
}
