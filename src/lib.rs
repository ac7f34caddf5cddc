//! # strutrouter
//!
//! **strutrouter** is a contract-driven request dispatcher. An API contract
//! (Swagger 2 style: `paths`, `parameters`, `securityDefinitions`, plus a few
//! `x-strut-*` extensions) is compiled once into a route trie, and every
//! incoming request is run through a fixed pipeline before the application
//! handler bound to its `operationId` sees it.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Contract model, loading from YAML/JSON and contract-level checks
//! - **[`router`]** - Prefix trie over path templates
//! - **[`dispatcher`]** - Compilation, verification and the per-request pipeline
//! - **[`security`]** - API-key authentication and role-based authorization
//! - **[`schema`]** - Compiled path and body validators
//! - **[`models`]** - Preloading entities named by `x-strut-model` parameters
//! - **[`coerce`]** - Date/time and JSON normalization of input fields
//! - **[`context`]** - The per-request [`RequestContext`]
//! - **[`validator`]** - Verification issues and compile errors
//! - **[`logging`]** / **[`runtime_config`]** - Environment-driven setup
//! - **[`cli`]** - `routes` and `check` commands
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host
//!     participant Dispatcher as OperationDispatcher
//!     participant Trie as Router
//!     participant Security
//!     participant Schema as Validators
//!     participant Finders
//!     participant Handler
//!
//!     Host->>Dispatcher: handle(&mut ctx)
//!     Dispatcher->>Trie: route(path)
//!     alt not in contract
//!         Dispatcher-->>Host: Dispatch::Forward
//!     end
//!     Dispatcher->>Security: authenticate + authorize
//!     Dispatcher->>Schema: path params, then body
//!     Dispatcher->>Finders: x-strut-model lookups
//!     Dispatcher->>Dispatcher: coerce dates / JSON
//!     Dispatcher->>Handler: handle(&mut ctx)
//!     Dispatcher-->>Host: Dispatch::Handled (status + body on ctx)
//! ```
//!
//! Failures end the request with a JSON error body: `405` for an undeclared
//! method, `401` for rejected credentials or missing permissions, `400` for
//! schema violations, `404` for missing model entities and `500` for
//! everything else.
//!
//! ## Quick Start
//!
//! ```rust
//! use strutrouter::{Contract, Dispatch, DispatcherConfig, OperationDispatcher, RequestContext};
//!
//! let contract = Contract::from_yaml_str(r#"
//! securityDefinitions:
//!   key: { type: apiKey, in: header, name: X-Api-Key }
//! paths:
//!   /greet/{name}:
//!     get:
//!       operationId: greet
//!       security: [ { key: [] } ]
//!       parameters:
//!         - { name: name, in: path, type: string, required: true }
//! "#).unwrap();
//!
//! let config = DispatcherConfig::builder()
//!     .security_handler("key", |_: &mut RequestContext, key: Option<&str>| -> anyhow::Result<bool> {
//!         Ok(key == Some("secret"))
//!     })
//!     .operation("greet", |ctx: &mut RequestContext| -> anyhow::Result<()> {
//!         let name = ctx.params["name"].clone();
//!         ctx.body = Some(serde_json::json!({ "hello": name }));
//!         Ok(())
//!     })
//!     .build();
//!
//! let dispatcher = OperationDispatcher::compile(contract, config).unwrap();
//!
//! let mut ctx = RequestContext::new(http::Method::GET, "/greet/ada")
//!     .with_header("X-Api-Key", "secret");
//! assert_eq!(dispatcher.handle(&mut ctx), Dispatch::Handled);
//! assert_eq!(ctx.status, Some(http::StatusCode::OK));
//!
//! let mut ctx = RequestContext::new(http::Method::GET, "/greet/ada");
//! dispatcher.handle(&mut ctx);
//! assert_eq!(ctx.status, Some(http::StatusCode::UNAUTHORIZED));
//! ```
//!
//! ## Contract Extensions
//!
//! | Extension | Where | Meaning |
//! |-----------|-------|---------|
//! | `x-strut-model: { type, name }` | parameter | Load the entity with this parameter's value as key |
//! | `x-strut-schema` | `format: json` parameter | Merge the parsed object's keys into the fields |
//! | `x-strut-permissions` | contract / operation | Permissions the caller's roles must grant |
//! | `x-strut-rbac-roles` | contract | Role table for [`RbacAuthorizer`] |
//!
//! ## Environment
//!
//! | Variable | Default | |
//! |----------|---------|---|
//! | `STRUT_ENV` | `development` | `production` hides validation details |
//! | `STRUT_EXPOSE_VALIDATION_ERRORS` | per `STRUT_ENV` | Explicit override |
//! | `STRUT_LOG_LEVEL` | `info` | |
//! | `STRUT_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `STRUT_LOG_TARGET_FILTER` | none | Extra `EnvFilter` directives |
//! | `STRUT_LOG_INCLUDE_LOCATION` | `false` | File/line in log records |

pub mod cli;
pub mod coerce;
pub mod context;
pub mod dispatcher;
pub mod ids;
pub mod logging;
pub mod models;
pub mod router;
pub mod runtime_config;
pub mod schema;
pub mod security;
pub mod spec;
pub mod validator;

pub use context::{FieldValue, Fields, RequestContext};
pub use dispatcher::{
    Dispatch, DispatchError, DispatcherConfig, LazyDispatcher, OperationDispatcher,
    OperationHandler,
};
pub use models::Finder;
pub use security::{AuthorizationProvider, RbacAuthorizer, SecurityHandler, SecurityOutcome};
pub use spec::{load_contract, Contract};
pub use validator::{CompileError, ValidationIssue};
