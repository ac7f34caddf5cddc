//! Compiled parameter and body validators.
//!
//! Two validators are compiled per operation. The path validator checks the
//! captured path parameters after coercing them from strings to their
//! declared types. The body validator checks the `in: body` parameter's
//! schema. Neither keeps state between calls: every invocation returns its
//! own [`ValidationErrors`], so one compiled validator can serve any number of
//! concurrent requests.
//!
//! Query, header and formData parameters are not validated here.

use jsonschema::{Draft, Validator};
use serde::Serialize;
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::spec::{ParameterLocation, ParameterSpec};
use crate::validator::CompileError;

/// Parameter keywords copied into the generated path schema.
const CONSTRAINT_KEYWORDS: [&str; 14] = [
    "enum",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "pattern",
    "items",
    "minItems",
    "maxItems",
    "uniqueItems",
    "default",
];

/// One failed schema check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub message: String,
}

/// Every failure reported by a single validation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn collect(validator: &Validator, instance: &Value) -> Self {
        ValidationErrors(
            validator
                .iter_errors(instance)
                .map(|e| FieldError {
                    message: e.to_string(),
                })
                .collect(),
        )
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Declared scalar type a raw path segment is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Integer,
    Number,
    Boolean,
    Text,
}

impl Scalar {
    fn from_type(param_type: Option<&str>) -> Self {
        match param_type {
            Some("integer") => Scalar::Integer,
            Some("number") => Scalar::Number,
            Some("boolean") => Scalar::Boolean,
            _ => Scalar::Text,
        }
    }

    /// Convert a raw segment; values that don't parse stay strings so the
    /// schema reports the type mismatch.
    fn coerce(self, raw: &str) -> Value {
        match self {
            Scalar::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            Scalar::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string())),
            Scalar::Boolean => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(raw.to_string()),
            },
            Scalar::Text => Value::String(raw.to_string()),
        }
    }
}

/// Validator for the captured path parameters of one operation.
pub struct PathValidator {
    fields: Vec<(String, Scalar)>,
    compiled: Option<Validator>,
}

impl fmt::Debug for PathValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathValidator")
            .field("fields", &self.fields)
            .field("compiled", &self.compiled.is_some())
            .finish()
    }
}

impl PathValidator {
    /// A validator that accepts anything and coerces nothing.
    #[must_use]
    pub fn always_valid() -> Self {
        Self {
            fields: Vec::new(),
            compiled: None,
        }
    }

    /// Coerce and validate `(name, raw)` pairs.
    ///
    /// Returns the coerced values keyed by name. Undeclared parameters are
    /// passed through as strings.
    pub fn validate<'a, I>(&self, params: I) -> Result<Map<String, Value>, ValidationErrors>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut values = Map::new();
        for (name, raw) in params {
            let scalar = self
                .fields
                .iter()
                .find(|(field, _)| field == name)
                .map_or(Scalar::Text, |(_, s)| *s);
            values.insert(name.to_string(), scalar.coerce(raw));
        }

        let Some(compiled) = &self.compiled else {
            return Ok(values);
        };
        let instance = Value::Object(values);
        let errors = ValidationErrors::collect(compiled, &instance);
        if !errors.is_empty() {
            return Err(errors);
        }
        match instance {
            Value::Object(values) => Ok(values),
            _ => Ok(Map::new()),
        }
    }
}

/// Validator for the request body of one operation.
pub struct BodyValidator {
    compiled: Option<Validator>,
}

impl fmt::Debug for BodyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyValidator")
            .field("compiled", &self.compiled.is_some())
            .finish()
    }
}

impl BodyValidator {
    #[must_use]
    pub fn always_valid() -> Self {
        Self { compiled: None }
    }

    /// True when no body schema was declared.
    #[must_use]
    pub fn is_always_valid(&self) -> bool {
        self.compiled.is_none()
    }

    pub fn validate(&self, body: &Value) -> Result<(), ValidationErrors> {
        let Some(compiled) = &self.compiled else {
            return Ok(());
        };
        let errors = ValidationErrors::collect(compiled, body);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Contract schemas follow Swagger 2, i.e. JSON Schema draft 4.
fn build(location: &str, schema: &Value) -> Result<Validator, CompileError> {
    jsonschema::options()
        .with_draft(Draft::Draft4)
        .build(schema)
        .map_err(|e| CompileError::InvalidSchema {
            location: location.to_string(),
            reason: e.to_string(),
        })
}

/// Build the path validator from the `in: path` parameters.
///
/// `location` only labels compile errors.
pub fn compile_path(location: &str, params: &[ParameterSpec]) -> Result<PathValidator, CompileError> {
    let path_params: Vec<&ParameterSpec> = params
        .iter()
        .filter(|p| p.location == ParameterLocation::Path)
        .collect();
    if path_params.is_empty() {
        return Ok(PathValidator::always_valid());
    }

    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut fields = Vec::with_capacity(path_params.len());

    for param in path_params {
        let mut prop = Map::new();
        if let Some(t) = &param.param_type {
            prop.insert("type".to_string(), Value::String(t.clone()));
        }
        if let Some(f) = &param.format {
            prop.insert("format".to_string(), Value::String(f.clone()));
        }
        for keyword in CONSTRAINT_KEYWORDS {
            if let Some(v) = param.extra.get(keyword) {
                prop.insert(keyword.to_string(), v.clone());
            }
        }
        properties.insert(param.name.clone(), Value::Object(prop));
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
        fields.push((
            param.name.clone(),
            Scalar::from_type(param.param_type.as_deref()),
        ));
    }

    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }

    Ok(PathValidator {
        fields,
        compiled: Some(build(location, &schema)?),
    })
}

/// Build the body validator from the `in: body` parameter's schema, if any.
///
/// `definitions` are the contract's shared schemas. Local
/// `#/definitions/<name>` references in the body schema resolve against them,
/// including self-referential ones.
pub fn compile_body(
    location: &str,
    params: &[ParameterSpec],
    definitions: &BTreeMap<String, Value>,
) -> Result<BodyValidator, CompileError> {
    let schema = params
        .iter()
        .find(|p| p.location == ParameterLocation::Body)
        .and_then(|p| p.schema.as_ref());

    match schema {
        Some(schema) => Ok(BodyValidator {
            compiled: Some(build(location, &with_definitions(schema, definitions))?),
        }),
        None => Ok(BodyValidator::always_valid()),
    }
}

/// Root the body schema in a document carrying `definitions`.
///
/// Draft 4 ignores keywords next to `$ref`, so the body schema sits under
/// `allOf` rather than beside the definitions.
fn with_definitions(schema: &Value, definitions: &BTreeMap<String, Value>) -> Value {
    if definitions.is_empty() {
        return schema.clone();
    }
    json!({ "definitions": definitions, "allOf": [schema] })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(yaml: &str) -> Vec<ParameterSpec> {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn no_definitions() -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    #[test]
    fn test_no_path_params_always_valid() {
        let v = compile_path("GET /x", &params("- { name: q, in: query, type: integer }")).unwrap();
        let out = v.validate([("anything", "goes")]).unwrap();
        assert_eq!(out["anything"], "goes");
    }

    #[test]
    fn test_path_params_coerced() {
        let v = compile_path(
            "GET /pets/{id}",
            &params(
                r#"
- { name: id, in: path, type: integer, required: true, minimum: 1 }
- { name: ratio, in: path, type: number }
- { name: flag, in: path, type: boolean }
- { name: slug, in: path, type: string }
"#,
            ),
        )
        .unwrap();

        let out = v
            .validate([("id", "42"), ("ratio", "0.5"), ("flag", "true"), ("slug", "7")])
            .unwrap();
        assert_eq!(out["id"], json!(42));
        assert_eq!(out["ratio"], json!(0.5));
        assert_eq!(out["flag"], json!(true));
        assert_eq!(out["slug"], json!("7"));
    }

    #[test]
    fn test_path_params_rejected() {
        let v = compile_path(
            "GET /pets/{id}",
            &params("- { name: id, in: path, type: integer, required: true, minimum: 1 }"),
        )
        .unwrap();

        assert!(v.validate([("id", "abc")]).is_err());
        let errors = v.validate([("id", "0")]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(v.validate(std::iter::empty::<(&str, &str)>()).is_err());
    }

    #[test]
    fn test_draft4_exclusive_minimum() {
        let v = compile_path(
            "GET /n/{n}",
            &params("- { name: n, in: path, type: integer, minimum: 0, exclusiveMinimum: true }"),
        )
        .unwrap();
        assert!(v.validate([("n", "0")]).is_err());
        assert!(v.validate([("n", "1")]).is_ok());
    }

    #[test]
    fn test_body_validation() {
        let v = compile_body(
            "POST /pets",
            &params(
                r#"
- name: pet
  in: body
  schema:
    type: object
    required: [name]
    properties:
      name: { type: string }
      age: { type: integer }
"#,
            ),
            &no_definitions(),
        )
        .unwrap();

        assert!(v.validate(&json!({"name": "rex", "age": 2})).is_ok());
        let errors = v.validate(&json!({"age": "old"})).unwrap_err();
        assert_eq!(errors.len(), 2);
        let rendered = serde_json::to_value(&errors).unwrap();
        assert!(rendered[0]["message"].is_string());
    }

    #[test]
    fn test_body_absent_always_valid() {
        let v = compile_body(
            "GET /x",
            &params("- { name: id, in: path, type: string }"),
            &no_definitions(),
        )
        .unwrap();
        assert!(v.validate(&json!("anything")).is_ok());
    }

    #[test]
    fn test_invalid_schema_is_compile_error() {
        let err = compile_body(
            "POST /x",
            &params("- { name: b, in: body, schema: { type: 12 } }"),
            &no_definitions(),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidSchema { ref location, .. } if location == "POST /x"));
    }

    #[test]
    fn test_body_refs_resolve_against_definitions() {
        let definitions: BTreeMap<String, Value> = serde_yaml::from_str(
            r##"
Node:
  type: object
  required: [name]
  properties:
    name: { type: string }
    children:
      type: array
      items: { $ref: "#/definitions/Node" }
"##,
        )
        .unwrap();
        let v = compile_body(
            "POST /tree",
            &params(r##"- { name: root, in: body, schema: { $ref: "#/definitions/Node" } }"##),
            &definitions,
        )
        .unwrap();

        let tree = json!({"name": "a", "children": [{"name": "b", "children": [{"name": "c"}]}]});
        assert!(v.validate(&tree).is_ok());
        let broken = json!({"name": "a", "children": [{"children": []}]});
        assert_eq!(v.validate(&broken).unwrap_err().len(), 1);
        assert!(v.validate(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_unknown_ref_is_compile_error() {
        let err = compile_body(
            "POST /x",
            &params(r##"- { name: b, in: body, schema: { $ref: "#/definitions/Nope" } }"##),
            &no_definitions(),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidSchema { .. }));
    }

    #[test]
    fn test_concurrent_calls_keep_their_own_errors() {
        let v = std::sync::Arc::new(
            compile_body(
                "POST /x",
                &params("- { name: b, in: body, schema: { type: object, required: [a] } }"),
                &no_definitions(),
            )
            .unwrap(),
        );
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let v = std::sync::Arc::clone(&v);
                std::thread::spawn(move || {
                    let body = if i % 2 == 0 { json!({"a": 1}) } else { json!({}) };
                    (i, v.validate(&body).is_ok())
                })
            })
            .collect();
        for h in handles {
            let (i, ok) = h.join().unwrap();
            assert_eq!(ok, i % 2 == 0);
        }
    }
}
