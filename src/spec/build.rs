use super::types::{Contract, OperationSpec, SecurityRequirement};
use crate::validator::ValidationIssue;
use http::Method;

/// Human-readable location of an operation, e.g. `GET /pets/{id}`.
pub fn operation_location(method: &str, template: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), template)
}

/// Parse a lower-case contract verb into an [`http::Method`].
pub fn http_method(verb: &str) -> Option<Method> {
    Method::from_bytes(verb.to_ascii_uppercase().as_bytes()).ok()
}

/// Prefix a path template with the contract's `basePath`.
pub fn full_template(base_path: Option<&str>, template: &str) -> String {
    match base_path.map(|b| b.trim_end_matches('/')) {
        Some(base) if !base.is_empty() => format!("{base}{template}"),
        _ => template.to_string(),
    }
}

/// Operation-level requirements, else contract-level, else none (public).
pub fn effective_security<'a>(
    op: &'a OperationSpec,
    contract: &'a Contract,
) -> &'a [SecurityRequirement] {
    op.security
        .as_deref()
        .or(contract.security.as_deref())
        .unwrap_or(&[])
}

/// Operation-level permissions, else contract-wide ones.
pub fn effective_permissions<'a>(op: &'a OperationSpec, contract: &'a Contract) -> &'a [String] {
    op.permissions
        .as_deref()
        .or(contract.permissions.as_deref())
        .unwrap_or(&[])
}

/// Response media type: first of the operation's `produces`, else the contract's.
pub fn negotiated_type<'a>(op: &'a OperationSpec, contract: &'a Contract) -> Option<&'a str> {
    op.produces
        .as_ref()
        .and_then(|p| p.first())
        .or_else(|| contract.produces.first())
        .map(String::as_str)
}

/// Problems detectable from the contract alone, independent of what the
/// application registered.
pub fn contract_issues(contract: &Contract) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (template, method, op) in contract.operations() {
        let location = operation_location(method, template);

        match op.operation_id.as_deref() {
            Some(id) if !id.is_empty() => {}
            _ => issues.push(ValidationIssue::new(
                &location,
                "MissingOperationId",
                "No operationId declared",
            )),
        }

        for requirement in effective_security(op, contract) {
            for scheme in requirement.keys() {
                if !contract.security_definitions.contains_key(scheme) {
                    issues.push(ValidationIssue::new(
                        &location,
                        "UndefinedSecurityScheme",
                        format!("Security scheme '{scheme}' is not declared in securityDefinitions"),
                    ));
                }
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> Contract {
        Contract::from_yaml_str(
            r#"
basePath: /api/
produces: [application/json]
security:
  - key: []
securityDefinitions:
  key: { type: apiKey, in: header, name: X-Key }
paths:
  /open:
    get:
      operationId: open
      security: []
      produces: [text/plain]
  /closed:
    get:
      operationId: closed
  /broken:
    post:
      security:
        - ghost: []
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_effective_values() {
        let c = contract();
        let open = &c.paths["/open"].operations["get"];
        let closed = &c.paths["/closed"].operations["get"];
        assert!(effective_security(open, &c).is_empty());
        assert_eq!(effective_security(closed, &c).len(), 1);
        assert_eq!(negotiated_type(open, &c), Some("text/plain"));
        assert_eq!(negotiated_type(closed, &c), Some("application/json"));
        assert_eq!(full_template(c.base_path.as_deref(), "/open"), "/api/open");
        assert_eq!(full_template(None, "/open"), "/open");
    }

    #[test]
    fn test_contract_issues() {
        let issues = contract_issues(&contract());
        let kinds: Vec<&str> = issues.iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, vec!["MissingOperationId", "UndefinedSecurityScheme"]);
        assert!(issues.iter().all(|i| i.location == "POST /broken"));
    }

    #[test]
    fn test_http_method() {
        assert_eq!(http_method("get"), Some(Method::GET));
        assert_eq!(http_method("patch"), Some(Method::PATCH));
    }
}
