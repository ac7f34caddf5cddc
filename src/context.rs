//! Per-request scratch space shared between the host and the dispatch pipeline.
//!
//! The host fills in the request side (`method`, `path`, `headers`, `query`,
//! `fields`, `raw_body`); the pipeline writes the response side (`content_type`,
//! `params`, `models`, `status`, `body`). A context belongs to exactly one
//! request and is never shared.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use http::{Method, StatusCode};
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::ids::RequestId;
use crate::router::{find_param, ParamVec};

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage; names are matched case-insensitively.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// An input field, either as received or after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Json(Value),
    Timestamp(DateTime<FixedOffset>),
}

impl FieldValue {
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FieldValue::Json(v) => Some(v),
            FieldValue::Timestamp(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            FieldValue::Timestamp(ts) => Some(ts),
            FieldValue::Json(_) => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Json(Value::Null))
    }

    /// JSON rendering; timestamps become RFC 3339 strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Json(v) => v.clone(),
            FieldValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Json(v)
    }
}

/// Parsed body/form fields keyed by name.
pub type Fields = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
    pub headers: HeaderVec,
    pub query: ParamVec,
    /// Parsed body or form fields.
    pub fields: Fields,
    /// The parsed JSON body as received, whatever its shape. Body validation
    /// checks this when present and falls back to `fields` for form input.
    pub raw_body: Option<Value>,
    /// Roles of the authenticated caller, attached by security handlers and
    /// consumed by the RBAC authorizer.
    pub roles: Vec<String>,

    /// Negotiated response media type.
    pub content_type: Option<String>,
    /// Raw path parameters as extracted from the URL.
    pub params: HashMap<String, String>,
    /// Path parameters coerced to their declared types.
    pub path_values: Map<String, Value>,
    /// Entities preloaded through model bindings, keyed by binding name.
    pub models: HashMap<String, Value>,
    pub status: Option<StatusCode>,
    pub body: Option<Value>,
}

impl RequestContext {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            headers: HeaderVec::new(),
            query: ParamVec::new(),
            fields: Fields::new(),
            raw_body: None,
            roles: Vec::new(),
            content_type: None,
            params: HashMap::new(),
            path_values: Map::new(),
            models: HashMap::new(),
            status: None,
            body: None,
        }
    }

    /// Add a header. An `x-request-id` carrying a ULID becomes the request id.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case("x-request-id") {
            self.request_id = RequestId::from_header_or_new(Some(&value));
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), FieldValue::Json(value));
        self
    }

    /// Attach a parsed JSON body. An object body also becomes the field set.
    #[must_use]
    pub fn with_json_body(mut self, body: Value) -> Self {
        if let Value::Object(map) = &body {
            self.fields = map
                .iter()
                .map(|(k, v)| (k.clone(), FieldValue::Json(v.clone())))
                .collect();
        }
        self.raw_body = Some(body);
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn get_query(&self, name: &str) -> Option<&str> {
        find_param(&self.query, name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// The field set as one JSON object.
    #[must_use]
    pub fn fields_as_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// The value body validation checks: the raw JSON body, or the field set
    /// when the host supplied form input only.
    #[must_use]
    pub fn body_for_validation(&self) -> Value {
        match &self.raw_body {
            Some(body) => body.clone(),
            None => self.fields_as_json(),
        }
    }

    /// Set a JSON response.
    pub fn respond(&mut self, status: StatusCode, body: Value) {
        self.status = Some(status);
        self.body = Some(body);
    }
}
