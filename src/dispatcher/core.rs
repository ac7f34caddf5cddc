//! Dispatcher core - the per-request pipeline.
//!
//! Every stage either advances or ends the request:
//! match → authenticate/authorize → validate → configure → resolve models →
//! coerce → invoke.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::{Method, StatusCode};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

use super::config::{verify_contract, DispatcherConfig, OperationHandler};
use super::error::DispatchError;
use crate::coerce::coerce_fields;
use crate::context::RequestContext;
use crate::models::resolve_models;
use crate::router::Router;
use crate::schema::{compile_body, compile_path, BodyValidator, PathValidator};
use crate::security;
use crate::spec::{
    effective_permissions, effective_security, full_template, http_method, negotiated_type,
    operation_location, Contract, OperationSpec, SecurityRequirement,
};
use crate::validator::{CompileError, ValidationIssue};

/// One operation with everything resolved at compile time.
pub struct CompiledOperation {
    pub operation_id: String,
    pub method: Method,
    /// Operation as declared, with path-level parameters merged in.
    pub spec: OperationSpec,
    pub security: Vec<SecurityRequirement>,
    pub permissions: Vec<String>,
    pub content_type: Option<String>,
    handler: Arc<dyn OperationHandler>,
    path_validator: PathValidator,
    body_validator: BodyValidator,
}

impl std::fmt::Debug for CompiledOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledOperation")
            .field("operation_id", &self.operation_id)
            .field("method", &self.method)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// A trie leaf: one path template and its operations.
#[derive(Debug)]
pub struct CompiledRoute {
    pub template: String,
    operations: Vec<CompiledOperation>,
}

impl CompiledRoute {
    #[must_use]
    pub fn operation(&self, method: &Method) -> Option<&CompiledOperation> {
        self.operations.iter().find(|op| op.method == *method)
    }

    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        self.operations.iter().map(|op| op.method.clone()).collect()
    }

    pub fn operations(&self) -> impl Iterator<Item = &CompiledOperation> {
        self.operations.iter()
    }
}

/// What the dispatcher did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A response has been written to the context.
    Handled,
    /// The path is not part of the contract; pass the request on.
    Forward,
}

/// The compiled contract plus the pipeline that serves it.
///
/// Immutable after [`OperationDispatcher::compile`]; share it freely across
/// threads.
pub struct OperationDispatcher {
    router: Router<CompiledRoute>,
    route_table: Vec<(String, Vec<Method>)>,
    contract: Contract,
    config: DispatcherConfig,
}

impl std::fmt::Debug for OperationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDispatcher")
            .field("routes", &self.router.templates())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn compile_operation(
    contract: &Contract,
    config: &DispatcherConfig,
    template: &str,
    verb: &str,
    op: &OperationSpec,
) -> Result<CompiledOperation, CompileError> {
    let location = operation_location(verb, template);
    let method = http_method(verb).ok_or_else(|| {
        CompileError::Verification(vec![ValidationIssue::new(
            &location,
            "InvalidMethod",
            format!("'{verb}' is not an HTTP method"),
        )])
    })?;

    // verification has already run; these only fail if it was skipped
    let operation_id = op.operation_id.clone().unwrap_or_default();
    let handler = config.operation(&operation_id).cloned().ok_or_else(|| {
        CompileError::Verification(vec![ValidationIssue::new(
            &location,
            "MissingHandler",
            format!("No handler registered for operation '{operation_id}'"),
        )])
    })?;

    let path_validator = compile_path(&location, &op.parameters)?;
    let body_validator = compile_body(&location, &op.parameters, &contract.definitions)?;

    Ok(CompiledOperation {
        operation_id,
        method,
        security: effective_security(op, contract).to_vec(),
        permissions: effective_permissions(op, contract).to_vec(),
        content_type: negotiated_type(op, contract).map(str::to_string),
        spec: op.clone(),
        handler,
        path_validator,
        body_validator,
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl OperationDispatcher {
    /// Verify the contract against `config`, then build the trie and compile
    /// every operation's validators.
    pub fn compile(contract: Contract, config: DispatcherConfig) -> Result<Self, CompileError> {
        verify_contract(&contract, &config)?;

        let mut routes = Vec::with_capacity(contract.paths.len());
        let mut route_table: Vec<(String, Vec<Method>)> = Vec::with_capacity(contract.paths.len());
        let mut operation_count = 0usize;
        for (template, item) in &contract.paths {
            if item.operations.is_empty() {
                continue;
            }
            let operations = item
                .operations
                .iter()
                .map(|(verb, op)| compile_operation(&contract, &config, template, verb, op))
                .collect::<Result<Vec<_>, _>>()?;
            operation_count += operations.len();

            let full = full_template(contract.base_path.as_deref(), template);
            route_table.push((full.clone(), operations.iter().map(|o| o.method.clone()).collect()));
            routes.push((
                full.clone(),
                CompiledRoute {
                    template: full,
                    operations,
                },
            ));
        }

        let router = Router::build(routes)?;
        info!(
            operations = operation_count,
            routes = router.templates().len(),
            "Dispatcher compiled"
        );

        Ok(Self {
            router,
            route_table,
            contract,
            config,
        })
    }

    #[must_use]
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    #[must_use]
    pub fn router(&self) -> &Router<CompiledRoute> {
        &self.router
    }

    /// Route table as `(template, methods)`, sorted by template.
    #[must_use]
    pub fn routes(&self) -> &[(String, Vec<Method>)] {
        &self.route_table
    }

    /// Run the pipeline for one request.
    ///
    /// `Ok(Dispatch::Forward)` means the path is not in the contract and the
    /// context is untouched.
    pub fn dispatch(&self, ctx: &mut RequestContext) -> Result<Dispatch, DispatchError> {
        let span = info_span!(
            "dispatch",
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path
        );
        let _enter = span.enter();

        // 1. match
        let Some(matched) = self.router.route(&ctx.path) else {
            return Ok(Dispatch::Forward);
        };
        let route = Arc::clone(&matched.route);
        let Some(op) = route.operation(&ctx.method) else {
            return Err(DispatchError::MethodNotAllowed {
                method: ctx.method.clone(),
                allowed: route.methods(),
            });
        };
        debug!(
            template = %route.template,
            operation_id = %op.operation_id,
            "Route matched"
        );

        // 2. authenticate / authorize
        let outcome = security::evaluate(
            ctx,
            &op.security,
            &op.permissions,
            &self.contract.security_definitions,
            self.config.security_handlers(),
            self.config.authorizer(),
        )?;
        if !outcome.is_allowed() {
            return Err(DispatchError::Unauthorized(outcome));
        }

        // 3. validate
        let path_values = op
            .path_validator
            .validate(
                matched
                    .path_params
                    .iter()
                    .map(|(k, v)| (k.as_ref(), v.as_str())),
            )
            .map_err(DispatchError::Validation)?;
        if !op.body_validator.is_always_valid() {
            op.body_validator
                .validate(&ctx.body_for_validation())
                .map_err(DispatchError::Validation)?;
        }

        // 4. configure
        ctx.content_type.clone_from(&op.content_type);
        ctx.params = matched.path_params_map();
        ctx.path_values = path_values;

        // 5. resolve models
        ctx.models = resolve_models(&op.spec.parameters, ctx, self.config.finders())?;

        // 6. coerce
        coerce_fields(&op.spec.parameters, &mut ctx.fields)?;

        // 7. invoke
        let start = Instant::now();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            op.handler.handle(ctx)
        }));
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(DispatchError::Unexpected(e)),
            Err(panic) => {
                return Err(DispatchError::HandlerPanic {
                    operation_id: op.operation_id.clone(),
                    message: panic_message(panic.as_ref()),
                })
            }
        }

        if ctx.status.is_none() {
            ctx.status = Some(if ctx.body.is_some() {
                StatusCode::OK
            } else {
                StatusCode::NO_CONTENT
            });
        }
        debug!(
            operation_id = %op.operation_id,
            status = ctx.status.map(|s| s.as_u16()),
            execution_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
            "Handler execution complete"
        );

        Ok(Dispatch::Handled)
    }

    /// Host-facing entry point: like [`dispatch`](Self::dispatch), but every
    /// failure is written to the context as an error response.
    pub fn handle(&self, ctx: &mut RequestContext) -> Dispatch {
        match self.dispatch(ctx) {
            Ok(dispatch) => dispatch,
            Err(err) => {
                let status = err.status();
                if status.is_server_error() {
                    error!(
                        request_id = %ctx.request_id,
                        method = %ctx.method,
                        path = %ctx.path,
                        status = status.as_u16(),
                        error = %err,
                        "Request failed"
                    );
                } else {
                    warn!(
                        request_id = %ctx.request_id,
                        method = %ctx.method,
                        path = %ctx.path,
                        status = status.as_u16(),
                        code = err.code(),
                        "Request rejected"
                    );
                }
                err.write_to(ctx, self.config.expose_validation_errors());
                Dispatch::Handled
            }
        }
    }
}
