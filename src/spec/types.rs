use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// HTTP verbs that are treated as operations inside a path item.
pub const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A security requirement: scheme name → scopes.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// The parsed API contract.
///
/// Immutable once handed to the dispatcher. Only the parts the dispatcher
/// consumes are modelled; everything else in the document is ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Contract {
    #[serde(rename = "basePath", default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(rename = "securityDefinitions", default)]
    pub security_definitions: BTreeMap<String, SecurityScheme>,
    /// Named schemas referenced as `#/definitions/<name>`.
    #[serde(default)]
    pub definitions: BTreeMap<String, Value>,
    /// Contract-wide permissions, used when an operation declares none.
    #[serde(rename = "x-strut-permissions", default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(rename = "x-strut-rbac-roles", default, skip_serializing_if = "Option::is_none")]
    pub rbac_roles: Option<BTreeMap<String, RoleSpec>>,
}

impl Contract {
    /// Parse a contract from YAML text.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Build a contract from an already parsed JSON value.
    pub fn from_json_value(value: Value) -> anyhow::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Iterate `(template, method, operation)` in deterministic order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &str, &OperationSpec)> {
        self.paths.iter().flat_map(|(template, item)| {
            item.operations
                .iter()
                .map(move |(method, op)| (template.as_str(), method.as_str(), op))
        })
    }
}

/// One path template's operations, keyed by lower-case HTTP verb.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PathItem {
    pub operations: BTreeMap<String, OperationSpec>,
}

impl<'de> Deserialize<'de> for PathItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;

        let shared: Vec<ParameterSpec> = match raw.get("parameters") {
            Some(v) => serde_json::from_value(v.clone()).map_err(serde::de::Error::custom)?,
            None => Vec::new(),
        };

        let mut operations = BTreeMap::new();
        for (key, value) in raw {
            let verb = key.to_ascii_lowercase();
            if !METHODS.contains(&verb.as_str()) {
                continue;
            }
            let mut op: OperationSpec =
                serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            for param in &shared {
                let overridden = op
                    .parameters
                    .iter()
                    .any(|p| p.name == param.name && p.location == param.location);
                if !overridden {
                    op.parameters.push(param.clone());
                }
            }
            operations.insert(verb, op);
        }

        Ok(PathItem { operations })
    }
}

/// One HTTP-method entry under a path.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OperationSpec {
    #[serde(rename = "operationId", default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produces: Option<Vec<String>>,
    #[serde(rename = "x-strut-permissions", default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl OperationSpec {
    /// Parameters with a model binding, in declaration order.
    pub fn model_bindings(&self) -> impl Iterator<Item = (&ParameterSpec, &ModelBinding)> {
        self.parameters
            .iter()
            .filter_map(|p| p.model.as_ref().map(|m| (p, m)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Path,
    Query,
    FormData,
    Body,
    Header,
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::FormData => write!(f, "formData"),
            ParameterLocation::Body => write!(f, "body"),
            ParameterLocation::Header => write!(f, "header"),
        }
    }
}

/// A declared operation parameter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Body schema (only meaningful for `in: body`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(rename = "x-strut-model", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelBinding>,
    #[serde(rename = "x-strut-schema", default, skip_serializing_if = "Option::is_none")]
    pub inline_schema: Option<Value>,
    /// Remaining keywords (`enum`, `minimum`, `pattern`, `description`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParameterSpec {
    /// Whether a parsed JSON value should be merged into the input set.
    pub fn expands_inline(&self) -> bool {
        match &self.inline_schema {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(_) => true,
        }
    }
}

/// `x-strut-model`: the parameter identifies an entity to preload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelBinding {
    /// Entity type, used to select the finder.
    #[serde(rename = "type")]
    pub entity: String,
    /// Key under which the entity is exposed in `ctx.models`.
    pub name: String,
}

/// Role table entry from `x-strut-rbac-roles`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoleSpec {
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeyScheme {
    #[serde(rename = "in")]
    pub location: ApiKeyLocation,
    pub name: String,
}

/// A `securityDefinitions` entry.
///
/// Only `apiKey` is supported; every other declared `type` is kept as
/// [`SecurityScheme::Unsupported`] so that the request fails with a server
/// error when an operation actually relies on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SecurityScheme {
    ApiKey(ApiKeyScheme),
    Unsupported { kind: String },
}

impl SecurityScheme {
    pub fn kind(&self) -> &str {
        match self {
            SecurityScheme::ApiKey(_) => "apiKey",
            SecurityScheme::Unsupported { kind } => kind,
        }
    }
}

#[derive(Deserialize)]
struct RawSecurityScheme {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "in", default)]
    location: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl<'de> Deserialize<'de> for SecurityScheme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawSecurityScheme::deserialize(deserializer)?;
        if raw.kind != "apiKey" {
            return Ok(SecurityScheme::Unsupported { kind: raw.kind });
        }
        let location = match raw.location.as_deref() {
            Some("header") => ApiKeyLocation::Header,
            Some("query") => ApiKeyLocation::Query,
            other => {
                return Err(serde::de::Error::custom(format!(
                    "apiKey scheme must be located in header or query, got {other:?}"
                )))
            }
        };
        let name = raw
            .name
            .ok_or_else(|| serde::de::Error::custom("apiKey scheme is missing `name`"))?;
        Ok(SecurityScheme::ApiKey(ApiKeyScheme { location, name }))
    }
}
