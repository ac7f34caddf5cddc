//! # Router Module
//!
//! Path matching for contract templates.
//!
//! ## Architecture
//!
//! 1. **Compilation**: at startup every contract path template (e.g.
//!    `/pets/{id}`) is inserted into a prefix trie whose parameter segments
//!    capture one path segment each. Templates that differ only in parameter
//!    names are rejected as ambiguous.
//!
//! 2. **Matching**: for each request the trie is walked segment by segment.
//!    Literal segments take precedence over parameter captures at the same
//!    depth. A path without a matching terminal node is "not ours" and is left
//!    to the surrounding HTTP layer.
//!
//! ## Example
//!
//! ```rust
//! use strutrouter::router::Router;
//!
//! let router = Router::build(vec![
//!     ("/items/{id}".to_string(), "get_item"),
//!     ("/items/special".to_string(), "special"),
//! ])
//! .unwrap();
//!
//! let m = router.route("/items/42").unwrap();
//! assert_eq!(*m.route, "get_item");
//! assert_eq!(m.get_path_param("id"), Some("42"));
//! assert_eq!(*router.route("/items/special").unwrap().route, "special");
//! ```

mod core;
mod radix;
#[cfg(test)]
mod tests;

pub use core::{find_param, ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use radix::RouteTrie;
