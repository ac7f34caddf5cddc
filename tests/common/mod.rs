#![allow(dead_code)]

use serde_json::{json, Value};
use strutrouter::{
    Contract, DispatcherConfig, FieldValue, OperationDispatcher, RbacAuthorizer, RequestContext,
};

pub const PETSTORE: &str = r##"
basePath: /api
produces: [application/json]
securityDefinitions:
  apiKey: { type: apiKey, in: header, name: X-Api-Key }
  oauth: { type: oauth2, flow: implicit, authorizationUrl: "https://auth.example.com" }
x-strut-rbac-roles:
  reader:
    permissions: [pets:read]
  admin:
    permissions: [pets:read, pets:write]
    attributes: [superuser]
definitions:
  NewPet:
    type: object
    required: [name]
    properties:
      name: { type: string, minLength: 1 }
      age: { type: integer, minimum: 0 }
paths:
  /pets:
    get:
      operationId: listPets
    post:
      operationId: addPet
      security: [ { apiKey: [] } ]
      x-strut-permissions: [pets:write]
      parameters:
        - name: pet
          in: body
          schema: { $ref: "#/definitions/NewPet" }
  /pets/{petId}:
    parameters:
      - name: petId
        in: path
        type: integer
        required: true
        minimum: 1
        x-strut-model: { type: Pet, name: pet }
    get:
      operationId: getPet
      security: [ { apiKey: [] } ]
      x-strut-permissions: [pets:read]
    delete:
      operationId: deletePet
      security: [ { apiKey: [] } ]
      x-strut-permissions: [pets:write]
  /pets/{petId}/visits:
    post:
      operationId: addVisit
      parameters:
        - { name: petId, in: path, type: integer, required: true }
        - { name: when, in: formData, type: string, format: date-time }
        - { name: meta, in: formData, type: string, format: json, x-strut-schema: { type: object } }
        - { name: tags, in: formData, type: string, format: json }
  /legacy:
    get:
      operationId: legacy
      security: [ { oauth: [] } ]
  /boom:
    get:
      operationId: boom
"##;

pub fn petstore_contract() -> Contract {
    Contract::from_yaml_str(PETSTORE).unwrap()
}

/// `reader-key` and `admin-key` authenticate with the matching role.
pub fn api_key(ctx: &mut RequestContext, key: Option<&str>) -> anyhow::Result<bool> {
    let role = match key {
        Some("reader-key") => "reader",
        Some("admin-key") => "admin",
        _ => return Ok(false),
    };
    ctx.roles.push(role.to_string());
    Ok(true)
}

pub fn find_pet(key: &Value) -> anyhow::Result<Option<Value>> {
    Ok(match key.as_str() {
        Some("1") => Some(json!({"id": 1, "name": "rex"})),
        Some("2") => Some(json!({"id": 2, "name": "fido"})),
        _ => None,
    })
}

fn add_pet(ctx: &mut RequestContext) -> anyhow::Result<()> {
    let body = ctx.fields_as_json();
    ctx.respond(http::StatusCode::CREATED, body);
    Ok(())
}

fn add_visit(ctx: &mut RequestContext) -> anyhow::Result<()> {
    let when = ctx
        .field("when")
        .and_then(FieldValue::as_timestamp)
        .map(|ts| ts.timestamp_millis());
    ctx.body = Some(json!({
        "petId": ctx.path_values["petId"],
        "when": when,
        "fields": ctx.fields_as_json(),
    }));
    Ok(())
}

fn noop(_: &mut RequestContext) -> anyhow::Result<()> {
    Ok(())
}

fn boom(_: &mut RequestContext) -> anyhow::Result<()> {
    panic!("kaboom")
}

/// Handlers for every petstore operation, with validation details exposed.
pub fn petstore_config() -> DispatcherConfig {
    DispatcherConfig::builder()
        .security_handler("apiKey", api_key)
        .authorizer(RbacAuthorizer::from_contract(&petstore_contract()))
        .finder("Pet", find_pet)
        .operation("listPets", |ctx: &mut RequestContext| -> anyhow::Result<()> {
            ctx.body = Some(json!([{"id": 1, "name": "rex"}, {"id": 2, "name": "fido"}]));
            Ok(())
        })
        .operation("addPet", add_pet)
        .operation("getPet", |ctx: &mut RequestContext| -> anyhow::Result<()> {
            ctx.body = ctx.models.get("pet").cloned();
            Ok(())
        })
        .operation("deletePet", noop)
        .operation("addVisit", add_visit)
        .operation("legacy", noop)
        .operation("boom", boom)
        .expose_validation_errors(true)
        .build()
}

pub fn petstore() -> OperationDispatcher {
    OperationDispatcher::compile(petstore_contract(), petstore_config()).unwrap()
}

/// Write `content` to a temporary file with the given extension.
pub fn temp_contract(content: &str, ext: &str) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut file = tempfile::Builder::new()
        .prefix("strut_contract_")
        .suffix(&format!(".{ext}"))
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}
