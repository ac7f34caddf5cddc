use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::models::{Finder, Finders};
use crate::runtime_config::RuntimeConfig;
use crate::security::{AuthorizationProvider, SecurityHandler, SecurityHandlers};
use crate::spec::{
    contract_issues, effective_security, operation_location, Contract, SecurityScheme,
};
use crate::validator::{fail_if_issues, CompileError, ValidationIssue};

/// The application code bound to one `operationId`.
///
/// A handler responds by writing `status`/`body` on the context. Returning an
/// error turns the request into a 500.
pub trait OperationHandler: Send + Sync {
    fn handle(&self, ctx: &mut RequestContext) -> anyhow::Result<()>;
}

impl<F> OperationHandler for F
where
    F: Fn(&mut RequestContext) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, ctx: &mut RequestContext) -> anyhow::Result<()> {
        self(ctx)
    }
}

/// Everything the dispatcher needs besides the contract.
///
/// Assembled once through [`DispatcherConfig::builder`] and never changed
/// afterwards.
#[derive(Clone)]
pub struct DispatcherConfig {
    operations: HashMap<String, Arc<dyn OperationHandler>>,
    security_handlers: SecurityHandlers,
    authorizer: Option<Arc<dyn AuthorizationProvider>>,
    finders: Finders,
    expose_validation_errors: bool,
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> BTreeSet<&str> {
    map.keys().map(String::as_str).collect()
}

impl fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("operations", &sorted_keys(&self.operations))
            .field("security_handlers", &sorted_keys(&self.security_handlers))
            .field("authorizer", &self.authorizer.is_some())
            .field("finders", &sorted_keys(&self.finders))
            .field("expose_validation_errors", &self.expose_validation_errors)
            .finish()
    }
}

impl DispatcherConfig {
    /// Start a builder. Validation-detail exposure defaults from
    /// [`RuntimeConfig::from_env`].
    #[must_use]
    pub fn builder() -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::new(&RuntimeConfig::from_env())
    }

    #[must_use]
    pub fn operation(&self, operation_id: &str) -> Option<&Arc<dyn OperationHandler>> {
        self.operations.get(operation_id)
    }

    #[must_use]
    pub fn security_handlers(&self) -> &SecurityHandlers {
        &self.security_handlers
    }

    #[must_use]
    pub fn authorizer(&self) -> Option<&dyn AuthorizationProvider> {
        self.authorizer.as_deref()
    }

    #[must_use]
    pub fn finders(&self) -> &Finders {
        &self.finders
    }

    #[must_use]
    pub fn expose_validation_errors(&self) -> bool {
        self.expose_validation_errors
    }
}

pub struct DispatcherConfigBuilder {
    config: DispatcherConfig,
}

impl DispatcherConfigBuilder {
    #[must_use]
    pub fn new(runtime: &RuntimeConfig) -> Self {
        Self {
            config: DispatcherConfig {
                operations: HashMap::new(),
                security_handlers: HashMap::new(),
                authorizer: None,
                finders: HashMap::new(),
                expose_validation_errors: runtime.expose_validation_errors,
            },
        }
    }

    /// Bind a handler to an `operationId`. A later binding replaces an earlier one.
    #[must_use]
    pub fn operation(
        mut self,
        operation_id: impl Into<String>,
        handler: impl OperationHandler + 'static,
    ) -> Self {
        self.config
            .operations
            .insert(operation_id.into(), Arc::new(handler));
        self
    }

    /// Register the authentication handler for a `securityDefinitions` entry.
    #[must_use]
    pub fn security_handler(
        mut self,
        scheme: impl Into<String>,
        handler: impl SecurityHandler + 'static,
    ) -> Self {
        self.config
            .security_handlers
            .insert(scheme.into(), Arc::new(handler));
        self
    }

    #[must_use]
    pub fn authorizer(mut self, provider: impl AuthorizationProvider + 'static) -> Self {
        self.config.authorizer = Some(Arc::new(provider));
        self
    }

    /// Register the finder for an `x-strut-model` entity type.
    #[must_use]
    pub fn finder(mut self, entity: impl Into<String>, finder: impl Finder + 'static) -> Self {
        self.config.finders.insert(entity.into(), Arc::new(finder));
        self
    }

    #[must_use]
    pub fn expose_validation_errors(mut self, expose: bool) -> Self {
        self.config.expose_validation_errors = expose;
        self
    }

    #[must_use]
    pub fn build(self) -> DispatcherConfig {
        self.config
    }
}

/// Every problem that would make `contract` undispatchable with `config`.
pub fn verification_issues(contract: &Contract, config: &DispatcherConfig) -> Vec<ValidationIssue> {
    let mut issues = contract_issues(contract);

    for (template, method, op) in contract.operations() {
        let location = operation_location(method, template);

        if let Some(id) = op.operation_id.as_deref().filter(|id| !id.is_empty()) {
            if config.operation(id).is_none() {
                issues.push(ValidationIssue::new(
                    &location,
                    "MissingHandler",
                    format!("No handler registered for operation '{id}'"),
                ));
            }
        }

        let schemes: BTreeSet<&String> = effective_security(op, contract)
            .iter()
            .flat_map(|req| req.keys())
            .collect();
        for scheme in schemes {
            let is_api_key = matches!(
                contract.security_definitions.get(scheme),
                Some(SecurityScheme::ApiKey(_))
            );
            if is_api_key && !config.security_handlers().contains_key(scheme) {
                issues.push(ValidationIssue::new(
                    &location,
                    "MissingSecurityHandler",
                    format!("No security handler registered for scheme '{scheme}'"),
                ));
            }
        }

        for (param, binding) in op.model_bindings() {
            if !config.finders().contains_key(&binding.entity) {
                issues.push(ValidationIssue::new(
                    &location,
                    "MissingFinder",
                    format!(
                        "Parameter '{}' binds model type '{}' which has no registered finder",
                        param.name, binding.entity
                    ),
                ));
            }
        }
    }

    issues
}

/// Fail with one aggregate error listing every verification issue.
pub fn verify_contract(contract: &Contract, config: &DispatcherConfig) -> Result<(), CompileError> {
    fail_if_issues(verification_issues(contract, config))
}
