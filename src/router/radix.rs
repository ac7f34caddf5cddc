//! Prefix tree for contract path templates.
//!
//! Each node represents one path segment:
//! - Static segments (e.g. `users`) match exactly
//! - Parameter segments (e.g. `{id}`) match any single non-empty segment
//! - A node that ends a template carries the route value
//!
//! Static children are always tried before parameter children at the same
//! depth, so `/items/special` wins over `/items/{id}`. When a static branch
//! dead-ends, matching backtracks into the parameter branches.
//!
//! Lookup is O(k) in the number of path segments for the common case, not
//! O(n) in the number of routes.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use super::core::ParamVec;
use crate::validator::CompileError;

struct RadixNode<T> {
    /// The path segment this node represents (without leading /)
    segment: Cow<'static, str>,
    /// Parameter name if this is a parameter node (`{id}` -> `id`)
    param_name: Option<Arc<str>>,
    /// Route value when a template ends here
    value: Option<T>,
    children: Vec<RadixNode<T>>,
    /// Several parameter children are allowed so that `/users/{id}/posts` and
    /// `/users/{user_id}/comments` each keep their own parameter name.
    param_children: Vec<RadixNode<T>>,
}

impl<T> RadixNode<T> {
    fn new(segment: Cow<'static, str>) -> Self {
        Self {
            segment,
            param_name: None,
            value: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(param_name: &str) -> Self {
        Self {
            segment: Cow::Borrowed(""),
            param_name: Some(Arc::from(param_name)),
            value: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    /// Walk (creating as needed) to the node for `segments`.
    fn node_for(&mut self, segments: &[&str]) -> &mut RadixNode<T> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self;
        };

        if let Some(param_name) = param_segment(segment) {
            let idx = match self
                .param_children
                .iter()
                .position(|c| c.param_name.as_deref() == Some(param_name))
            {
                Some(idx) => idx,
                None => {
                    self.param_children.push(RadixNode::new_param(param_name));
                    self.param_children.len() - 1
                }
            };
            return self.param_children[idx].node_for(remaining);
        }

        let idx = match self.children.iter().position(|c| c.segment == *segment) {
            Some(idx) => idx,
            None => {
                self.children
                    .push(RadixNode::new(Cow::Owned((*segment).to_string())));
                self.children.len() - 1
            }
        };
        self.children[idx].node_for(remaining)
    }

    fn search<'a>(&'a self, segments: &[&str], params: &mut ParamVec) -> Option<&'a T> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.value.as_ref();
        };

        // Exact literal match wins over parameter capture
        for child in &self.children {
            if child.segment == *segment {
                if let Some(found) = child.search(remaining, params) {
                    return Some(found);
                }
            }
        }

        for param_child in &self.param_children {
            if let Some(ref name) = param_child.param_name {
                params.push((Arc::clone(name), (*segment).to_string()));
                if let Some(found) = param_child.search(remaining, params) {
                    return Some(found);
                }
                // Backtrack
                params.pop();
            }
        }

        None
    }

    fn len(&self) -> usize {
        usize::from(self.value.is_some())
            + self.children.iter().map(RadixNode::len).sum::<usize>()
            + self.param_children.iter().map(RadixNode::len).sum::<usize>()
    }
}

/// `{id}` -> `Some("id")`
fn param_segment(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|s| !s.is_empty())
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Template with parameter names erased: `/items/{id}` -> `/items/{}`.
pub(crate) fn normalize_template(template: &str) -> String {
    let mut normalized = String::with_capacity(template.len());
    for segment in split_segments(template) {
        normalized.push('/');
        if param_segment(segment).is_some() {
            normalized.push_str("{}");
        } else {
            normalized.push_str(segment);
        }
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Path trie mapping contract templates to route values.
pub struct RouteTrie<T> {
    root: RadixNode<T>,
    /// normalized template -> original template, for ambiguity detection
    templates: HashMap<String, String>,
}

impl<T> Default for RouteTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTrie<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RadixNode::new(Cow::Borrowed("")),
            templates: HashMap::new(),
        }
    }

    /// Insert a template. Fails when another template already normalizes to
    /// the same trie path (e.g. `/items/{id}` and `/items/{key}`).
    pub fn insert(&mut self, template: &str, value: T) -> Result<(), CompileError> {
        let normalized = normalize_template(template);
        if let Some(first) = self.templates.get(&normalized) {
            return Err(CompileError::DuplicateRoute {
                first: first.clone(),
                second: template.to_string(),
            });
        }
        self.templates.insert(normalized, template.to_string());

        let segments = split_segments(template);
        self.root.node_for(&segments).value = Some(value);
        Ok(())
    }

    /// Match a concrete request path, returning the route value and the
    /// extracted path parameters.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&T, ParamVec)> {
        let segments = split_segments(path);
        let mut params = ParamVec::new();
        let found = self.root.search(&segments, &mut params)?;
        Some((found, params))
    }

    /// Number of templates stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(templates: &[&str]) -> RouteTrie<String> {
        let mut trie = RouteTrie::new();
        for t in templates {
            trie.insert(t, t.to_string()).unwrap();
        }
        trie
    }

    fn param<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_simple_route() {
        let t = trie(&["/health"]);
        let (value, params) = t.match_path("/health").unwrap();
        assert_eq!(value, "/health");
        assert!(params.is_empty());
    }

    #[test]
    fn test_root_route() {
        let t = trie(&["/", "/a"]);
        assert_eq!(t.match_path("/").unwrap().0, "/");
        assert_eq!(t.match_path("").unwrap().0, "/");
    }

    #[test]
    fn test_multiple_parameters() {
        let t = trie(&["/users/{user_id}/posts/{post_id}"]);
        let (value, params) = t.match_path("/users/123/posts/456").unwrap();
        assert_eq!(value, "/users/{user_id}/posts/{post_id}");
        assert_eq!(param(&params, "user_id"), Some("123"));
        assert_eq!(param(&params, "post_id"), Some("456"));
    }

    #[test]
    fn test_literal_beats_parameter() {
        let t = trie(&["/items/{id}", "/items/special"]);
        let (value, params) = t.match_path("/items/special").unwrap();
        assert_eq!(value, "/items/special");
        assert!(params.is_empty());

        let (value, params) = t.match_path("/items/other").unwrap();
        assert_eq!(value, "/items/{id}");
        assert_eq!(param(&params, "id"), Some("other"));
    }

    #[test]
    fn test_backtracks_from_dead_static_branch() {
        let t = trie(&["/items/special/edit", "/items/{id}"]);
        let (value, params) = t.match_path("/items/special").unwrap();
        assert_eq!(value, "/items/{id}");
        assert_eq!(param(&params, "id"), Some("special"));
    }

    #[test]
    fn test_different_param_names_same_position() {
        let t = trie(&["/users/{user_id}/posts", "/users/{id}/comments"]);

        let (value, params) = t.match_path("/users/123/posts").unwrap();
        assert_eq!(value, "/users/{user_id}/posts");
        assert_eq!(param(&params, "user_id"), Some("123"));
        assert!(param(&params, "id").is_none());

        let (value, params) = t.match_path("/users/456/comments").unwrap();
        assert_eq!(value, "/users/{id}/comments");
        assert_eq!(param(&params, "id"), Some("456"));
        assert!(param(&params, "user_id").is_none());
    }

    #[test]
    fn test_intermediate_node_does_not_match() {
        let t = trie(&["/users/{id}/posts"]);
        assert!(t.match_path("/users/1").is_none());
        assert!(t.match_path("/users").is_none());
        assert!(t.match_path("/users/1/posts/2").is_none());
    }

    #[test]
    fn test_duplicate_templates_rejected() {
        let mut t = RouteTrie::new();
        t.insert("/items/{id}", 1).unwrap();
        let err = t.insert("/items/{key}", 2).unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateRoute {
                first: "/items/{id}".to_string(),
                second: "/items/{key}".to_string(),
            }
        );
        assert!(t.insert("/items/{id}/", 3).is_err());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_normalize_template() {
        assert_eq!(normalize_template("/a/{b}/c/"), "/a/{}/c");
        assert_eq!(normalize_template("/"), "/");
    }
}
