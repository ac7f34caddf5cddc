//! # Dispatcher Module
//!
//! Turns a [`Contract`](crate::spec::Contract) plus a
//! [`DispatcherConfig`] into an [`OperationDispatcher`] and runs requests
//! through it.
//!
//! ## Request Flow
//!
//! 1. **Match**: the path is looked up in the route trie. No match means the
//!    request is not ours ([`Dispatch::Forward`]); a match without an
//!    operation for the method is a `405`.
//! 2. **Authenticate/authorize**: security handlers for every required
//!    scheme, then the optional authorization provider. Rejection is a `401`
//!    carrying `AUTH_FAILED` or `NO_PERMISSION`.
//! 3. **Validate**: path parameters are coerced and checked, then the body
//!    schema. Failure is a `400`.
//! 4. **Configure**: response media type and path parameters are set on the
//!    context.
//! 5. **Resolve models**: `x-strut-model` parameters are loaded through
//!    their finders. A miss is a `404`.
//! 6. **Coerce**: dates and JSON strings are normalized.
//! 7. **Invoke**: the operation handler runs. Without a body or status the
//!    response defaults to `204`.
//!
//! ## Example
//!
//! ```rust
//! use strutrouter::context::RequestContext;
//! use strutrouter::dispatcher::{Dispatch, DispatcherConfig, OperationDispatcher};
//! use strutrouter::spec::Contract;
//!
//! let contract = Contract::from_yaml_str(r#"
//! paths:
//!   /pets/{id}:
//!     get:
//!       operationId: getPet
//!       parameters:
//!         - { name: id, in: path, type: integer, required: true }
//! "#).unwrap();
//!
//! let config = DispatcherConfig::builder()
//!     .operation("getPet", |ctx: &mut RequestContext| -> anyhow::Result<()> {
//!         ctx.body = Some(serde_json::json!({ "id": ctx.path_values["id"] }));
//!         Ok(())
//!     })
//!     .build();
//!
//! let dispatcher = OperationDispatcher::compile(contract, config).unwrap();
//!
//! let mut ctx = RequestContext::new(http::Method::GET, "/pets/7");
//! assert_eq!(dispatcher.handle(&mut ctx), Dispatch::Handled);
//! assert_eq!(ctx.body, Some(serde_json::json!({ "id": 7 })));
//!
//! let mut ctx = RequestContext::new(http::Method::GET, "/owners");
//! assert_eq!(dispatcher.handle(&mut ctx), Dispatch::Forward);
//! ```

mod config;
mod core;
mod error;
mod lazy;

pub use config::{
    verification_issues, verify_contract, DispatcherConfig, DispatcherConfigBuilder,
    OperationHandler,
};
pub use core::{CompiledOperation, CompiledRoute, Dispatch, OperationDispatcher};
pub use error::DispatchError;
pub use lazy::LazyDispatcher;
