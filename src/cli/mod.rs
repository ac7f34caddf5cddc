//! # CLI Module
//!
//! Command-line tools for inspecting a contract before deploying it.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the route table the dispatcher would build:
//!
//! ```bash
//! strutrouter routes --contract api.yaml
//! strutrouter routes --contract api.yaml --json
//! ```
//!
//! ### `check`
//!
//! Report every contract problem that does not depend on application code:
//! missing operationIds, undefined security schemes, ambiguous path templates
//! and schemas that do not compile. Exits non-zero when any are found.
//!
//! ```bash
//! strutrouter check --contract api.yaml
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! strutrouter::cli::run_cli()?;
//! ```

mod commands;


pub use commands::{check_contract, route_rows, run_cli, Cli, Commands, RouteRow};
