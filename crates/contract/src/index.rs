//! The contract index: one [`EndpointContract`] per declared (endpoint, verb).
//!
//! Built either from an OpenAPI document ([`ContractIndex::from_json`]) or by
//! hand through the [`EndpointContract`] builder methods. All OpenAPI corner
//! cases (parameter merging, optional bodies, status key spellings) are
//! resolved here so callers only see [`ArgShape`] and [`ResponseShape`].

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ContractError;
use crate::http::{StatusKey, Verb};
use crate::shape::{ArgShape, BodyShape, PathShape, ResponseShape};
use crate::spec::{OpenApiSpec, Operation, Parameter, Schema};
use crate::template::placeholders;

/// Everything the hooks need to know about one (endpoint, verb) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointContract {
    /// Endpoint template, e.g. `/items/{id}`.
    pub endpoint: String,
    /// Operation verb.
    pub verb: Verb,
    /// `operationId`, when the contract gives one.
    pub operation_id: Option<String>,
    /// Members a call carries.
    pub args: ArgShape,
    /// Success and error payload schemas.
    pub responses: ResponseShape,
}

impl EndpointContract {
    /// A contract taking only optional query parameters and declaring no responses.
    pub fn new(endpoint: impl Into<String>, verb: Verb) -> Self {
        Self {
            endpoint: endpoint.into(),
            verb,
            operation_id: None,
            args: ArgShape::empty(),
            responses: ResponseShape::default(),
        }
    }

    /// Declare a query parameter name.
    pub fn with_query_param(mut self, name: impl Into<String>) -> Self {
        self.args.query.push(name.into());
        self
    }

    /// Declare required path parameters. An empty list leaves the shape at `NoPath`.
    pub fn with_path_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.args.path = if names.is_empty() {
            PathShape::NoPath
        } else {
            PathShape::WithPath { names }
        };
        self
    }

    /// Declare a required request body with an optional JSON schema.
    pub fn with_body(mut self, schema: Option<Schema>) -> Self {
        self.args.body = BodyShape::WithBody { schema };
        self
    }

    /// Declare the JSON schema returned under `status`.
    pub fn with_response(mut self, status: impl Into<StatusKey>, schema: Schema) -> Self {
        self.responses.insert(status.into(), schema);
        self
    }

    /// Check that the supplied members match the declared argument shape.
    ///
    /// `path` is the path-parameter member, if the caller supplied one, and
    /// `has_body` tells whether a body member is present.
    pub fn check_args(
        &self,
        path: Option<&Map<String, Value>>,
        has_body: bool,
    ) -> Result<(), ContractError> {
        match (&self.args.path, path) {
            (PathShape::NoPath, Some(_)) => {
                return Err(ContractError::UnexpectedPathParams {
                    endpoint: self.endpoint.clone(),
                    verb: self.verb,
                });
            }
            (PathShape::WithPath { names }, supplied) => {
                let missing: Vec<String> = names
                    .iter()
                    .filter(|name| supplied.is_none_or(|map| !map.contains_key(*name)))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    return Err(ContractError::MissingPathParams {
                        endpoint: self.endpoint.clone(),
                        verb: self.verb,
                        missing,
                    });
                }
            }
            (PathShape::NoPath, None) => {}
        }

        match (self.args.requires_body(), has_body) {
            (true, false) => Err(ContractError::MissingBody {
                endpoint: self.endpoint.clone(),
                verb: self.verb,
            }),
            (false, true) => Err(ContractError::UnexpectedBody {
                endpoint: self.endpoint.clone(),
                verb: self.verb,
            }),
            _ => Ok(()),
        }
    }
}

/// Static description of every declared endpoint and verb.
#[derive(Debug, Clone, Default)]
pub struct ContractIndex {
    endpoints: BTreeMap<(String, Verb), EndpointContract>,
}

impl ContractIndex {
    /// An empty index, to be filled with [`ContractIndex::insert`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an OpenAPI JSON document and index its operations.
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        let spec = OpenApiSpec::from_json(json)?;
        Self::from_spec(&spec)
    }

    /// Index every operation of a parsed OpenAPI document.
    pub fn from_spec(spec: &OpenApiSpec) -> Result<Self, ContractError> {
        let mut index = Self::new();

        for (path, item) in &spec.paths {
            let path_params = item.parameters.as_deref();
            for verb in Verb::ALL {
                if let Some(op) = item.operation(verb) {
                    index.insert(normalize_operation(path, verb, op, path_params)?);
                }
            }
        }

        debug!(operations = index.len(), "Indexed contract operations.");
        Ok(index)
    }

    /// Add or replace the contract for its (endpoint, verb) pair.
    pub fn insert(&mut self, contract: EndpointContract) -> Option<EndpointContract> {
        self.endpoints
            .insert((contract.endpoint.clone(), contract.verb), contract)
    }

    /// The contract for a pair, if declared.
    pub fn get(&self, endpoint: &str, verb: Verb) -> Option<&EndpointContract> {
        self.endpoints.get(&(endpoint.to_string(), verb))
    }

    /// The contract for a pair, or [`ContractError::UnknownEndpoint`].
    pub fn lookup(&self, endpoint: &str, verb: Verb) -> Result<&EndpointContract, ContractError> {
        self.get(endpoint, verb)
            .ok_or_else(|| ContractError::UnknownEndpoint {
                endpoint: endpoint.to_string(),
                verb,
            })
    }

    /// Contracts ordered by endpoint, then verb.
    pub fn iter(&self) -> impl Iterator<Item = &EndpointContract> {
        self.endpoints.values()
    }

    /// Number of declared pairs.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether no pair is declared.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Normalize an operation into its contract.
fn normalize_operation(
    endpoint: &str,
    verb: Verb,
    op: &Operation,
    path_params: Option<&[Parameter]>,
) -> Result<EndpointContract, ContractError> {
    let params = merge_params(endpoint, verb, op, path_params)?;

    let query = params
        .iter()
        .filter(|p| p.location == "query")
        .map(|p| p.name.clone())
        .collect();

    let path_names: Vec<String> = params
        .iter()
        .filter(|p| p.location == "path" && p.required)
        .map(|p| p.name.clone())
        .collect();

    let template_names = placeholders(endpoint);
    for name in &path_names {
        if !template_names.contains(&name.as_str()) {
            warn!(
                endpoint,
                %verb,
                param = %name,
                "Path parameter has no placeholder in the endpoint template."
            );
        }
    }

    let path = if path_names.is_empty() {
        PathShape::NoPath
    } else {
        PathShape::WithPath { names: path_names }
    };

    // Optional bodies are not part of the argument shape.
    let body = match &op.request_body {
        Some(body) if body.required => BodyShape::WithBody {
            schema: body.json_schema().cloned(),
        },
        _ => BodyShape::NoBody,
    };

    let mut responses = ResponseShape::default();
    for (key, response) in &op.responses {
        let Ok(status) = key.parse::<StatusKey>() else {
            warn!(
                endpoint,
                %verb,
                status = %key,
                "Skipping response with an unrecognised status key."
            );
            continue;
        };
        if let Some(schema) = response.json_schema() {
            responses.insert(status, schema.clone());
        }
    }

    Ok(EndpointContract {
        endpoint: endpoint.to_string(),
        verb,
        operation_id: op.operation_id.clone(),
        args: ArgShape { query, path, body },
        responses,
    })
}

/// Check for duplicate parameter names within a list
fn check_duplicate_params(
    endpoint: &str,
    verb: Verb,
    params: &[Parameter],
    level: &'static str,
) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for p in params {
        if p.location == "cookie" {
            continue;
        }
        if !seen.insert((&p.name, &p.location)) {
            return Err(ContractError::DuplicateParameter {
                endpoint: endpoint.to_string(),
                verb,
                level,
                name: p.name.clone(),
            });
        }
    }
    Ok(())
}

/// Merge path-level and operation-level parameters; operation-level wins by name and location.
fn merge_params(
    endpoint: &str,
    verb: Verb,
    op: &Operation,
    path_params: Option<&[Parameter]>,
) -> Result<Vec<Parameter>, ContractError> {
    let mut fields: Vec<Parameter> = Vec::new();

    if let Some(pp) = path_params {
        check_duplicate_params(endpoint, verb, pp, "path-level")?;
        fields.extend(pp.iter().filter(|p| p.location != "cookie").cloned());
    }

    if let Some(op_params) = &op.parameters {
        check_duplicate_params(endpoint, verb, op_params, "operation-level")?;
        for p in op_params {
            if p.location == "cookie" {
                continue;
            }
            fields.retain(|f| f.name != p.name || f.location != p.location);
            fields.push(p.clone());
        }
    }

    Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_CONTRACT_JSON: &str = r##"{
  "openapi": "3.1.0",
  "info": { "title": "Widgets", "version": "1.0.0" },
  "paths": {
    "/widgets": {
      "parameters": [{ "name": "verbose", "in": "query", "required": false, "schema": { "type": "boolean" } }],
      "get": {
        "operationId": "listWidgets",
        "parameters": [
          { "name": "limit", "in": "query", "required": false, "schema": { "type": "integer" } },
          { "name": "verbose", "in": "query", "required": false, "schema": { "type": "boolean" } },
          { "name": "session", "in": "cookie", "required": false, "schema": { "type": "string" } }
        ],
        "responses": {
          "200": { "description": "OK", "content": { "application/json": { "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Widget" } } } } }
        }
      },
      "post": {
        "operationId": "createWidget",
        "requestBody": { "required": true, "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CreateWidget" } } } },
        "responses": {
          "201": { "description": "Created", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Widget" } } } },
          "400": { "description": "Bad", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ValidationError" } } } },
          "409": { "description": "Conflict", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Conflict" } } } },
          "teapot": { "description": "Ignored" }
        }
      }
    },
    "/widgets/{id}": {
      "parameters": [{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }],
      "get": {
        "operationId": "getWidget",
        "responses": {
          "200": { "description": "OK", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Widget" } } } },
          "404": { "description": "Missing", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/NotFound" } } } }
        }
      },
      "patch": {
        "operationId": "patchWidget",
        "requestBody": { "required": false, "content": { "application/json": { "schema": { "$ref": "#/components/schemas/PatchWidget" } } } },
        "responses": {
          "200": { "description": "OK", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Widget" } } } }
        }
      },
      "delete": {
        "operationId": "deleteWidget",
        "responses": { "204": { "description": "Deleted" } }
      }
    }
  }
}"##;

    fn index() -> ContractIndex {
        ContractIndex::from_json(TEST_CONTRACT_JSON).unwrap()
    }

    #[test]
    fn test_indexes_every_operation() {
        let index = index();
        assert_eq!(index.len(), 5);
        let pairs: Vec<_> = index.iter().map(|c| (c.endpoint.as_str(), c.verb)).collect();
        assert_eq!(
            pairs,
            [
                ("/widgets", Verb::Get),
                ("/widgets", Verb::Post),
                ("/widgets/{id}", Verb::Get),
                ("/widgets/{id}", Verb::Delete),
                ("/widgets/{id}", Verb::Patch),
            ]
        );
        assert_eq!(
            index.get("/widgets", Verb::Get).unwrap().operation_id.as_deref(),
            Some("listWidgets")
        );
    }

    #[test]
    fn test_query_only_shape() {
        let index = index();
        let list = index.lookup("/widgets", Verb::Get).unwrap();
        assert_eq!(list.args.path, PathShape::NoPath);
        assert_eq!(list.args.body, BodyShape::NoBody);
        // Operation-level "verbose" replaces the path-level one; cookies are dropped.
        assert_eq!(list.args.query, ["limit", "verbose"]);
        assert_eq!(list.responses.success_label(), "array<Widget>");
        assert!(list.responses.errors_untyped());
    }

    #[test]
    fn test_body_and_error_union() {
        let index = index();
        let create = index.lookup("/widgets", Verb::Post).unwrap();
        assert_eq!(
            create.args.body,
            BodyShape::WithBody {
                schema: Some(Schema::named("CreateWidget"))
            }
        );
        assert_eq!(create.responses.success_label(), "Widget");
        assert_eq!(create.responses.error_label(), "ValidationError | Conflict");
        assert!(create.responses.error_schema(500).is_none());
    }

    #[test]
    fn test_path_level_params_are_required() {
        let index = index();
        let get = index.lookup("/widgets/{id}", Verb::Get).unwrap();
        assert_eq!(get.args.path_names(), ["id".to_string()]);
        assert_eq!(get.responses.error_schema(404).unwrap().label(), "NotFound");
        assert!(get.responses.error_schema(410).is_none());
    }

    #[test]
    fn test_optional_body_is_not_part_of_the_shape() {
        let index = index();
        let patch = index.lookup("/widgets/{id}", Verb::Patch).unwrap();
        assert_eq!(patch.args.body, BodyShape::NoBody);
    }

    #[test]
    fn test_status_without_content_is_dropped() {
        let index = index();
        let delete = index.lookup("/widgets/{id}", Verb::Delete).unwrap();
        assert!(delete.responses.success.is_empty());
        assert_eq!(delete.responses.success_label(), "never");
        assert_eq!(delete.responses.error_label(), "unknown");
    }

    #[test]
    fn test_unknown_endpoint() {
        let index = index();
        let err = index.lookup("/gadgets", Verb::Get).unwrap_err();
        assert_eq!(
            err,
            ContractError::UnknownEndpoint {
                endpoint: "/gadgets".into(),
                verb: Verb::Get
            }
        );
        assert!(index.lookup("/widgets", Verb::Put).is_err());
    }

    #[test]
    fn test_duplicate_param_names() {
        let json = r#"{
  "paths": {
    "/items": {
      "get": {
        "parameters": [
          { "name": "limit", "in": "query" },
          { "name": "limit", "in": "query" }
        ],
        "responses": {}
      }
    }
  }
}"#;
        let err = ContractIndex::from_json(json).unwrap_err();
        assert!(
            matches!(
                &err,
                ContractError::DuplicateParameter { name, level, .. }
                    if name == "limit" && *level == "operation-level"
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_same_name_in_path_and_query() {
        let json = r#"{
  "paths": {
    "/items/{id}": {
      "get": {
        "parameters": [
          { "name": "id", "in": "path", "required": true },
          { "name": "id", "in": "query" }
        ],
        "responses": {}
      }
    }
  }
}"#;
        let index = ContractIndex::from_json(json).unwrap();
        let contract = index.get("/items/{id}", Verb::Get).unwrap();
        assert_eq!(contract.args.path_names(), ["id"]);
        assert_eq!(contract.args.query, ["id"]);
    }

    #[test]
    fn test_operation_query_param_keeps_path_level_path_param() {
        let json = r#"{
  "paths": {
    "/items/{id}": {
      "parameters": [{ "name": "id", "in": "path", "required": true }],
      "get": {
        "parameters": [{ "name": "id", "in": "query" }],
        "responses": {}
      }
    }
  }
}"#;
        let index = ContractIndex::from_json(json).unwrap();
        let contract = index.get("/items/{id}", Verb::Get).unwrap();
        assert_eq!(contract.args.path_names(), ["id"]);
        assert_eq!(contract.args.query, ["id"]);
    }

    #[test]
    fn test_operation_param_overrides_same_location() {
        let json = r#"{
  "paths": {
    "/items/{id}": {
      "parameters": [{ "name": "id", "in": "path", "required": true }],
      "delete": {
        "parameters": [{ "name": "id", "in": "path", "required": false }],
        "responses": {}
      }
    }
  }
}"#;
        let index = ContractIndex::from_json(json).unwrap();
        let contract = index.get("/items/{id}", Verb::Delete).unwrap();
        assert!(contract.args.path_names().is_empty());
    }

    #[test]
    fn test_numeric_and_string_status_builders_agree() {
        let numeric = EndpointContract::new("/items", Verb::Get)
            .with_response(200_u16, Schema::named("Item"))
            .with_response(404_u16, Schema::named("NotFound"));
        let textual = EndpointContract::new("/items", Verb::Get)
            .with_response("200".parse::<StatusKey>().unwrap(), Schema::named("Item"))
            .with_response("404".parse::<StatusKey>().unwrap(), Schema::named("NotFound"));
        assert_eq!(numeric, textual);
    }

    #[test]
    fn test_check_args() {
        let contract = EndpointContract::new("/items/{id}", Verb::Put)
            .with_path_params(["id"])
            .with_body(None);

        let mut path = Map::new();
        path.insert("id".into(), json!(42));
        assert!(contract.check_args(Some(&path), true).is_ok());

        assert_eq!(
            contract.check_args(None, true).unwrap_err(),
            ContractError::MissingPathParams {
                endpoint: "/items/{id}".into(),
                verb: Verb::Put,
                missing: vec!["id".into()],
            }
        );
        assert!(matches!(
            contract.check_args(Some(&Map::new()), true),
            Err(ContractError::MissingPathParams { .. })
        ));
        assert!(matches!(
            contract.check_args(Some(&path), false),
            Err(ContractError::MissingBody { .. })
        ));

        let plain = EndpointContract::new("/items", Verb::Get);
        assert!(plain.check_args(None, false).is_ok());
        assert!(matches!(
            plain.check_args(Some(&path), false),
            Err(ContractError::UnexpectedPathParams { .. })
        ));
        assert!(matches!(
            plain.check_args(None, true),
            Err(ContractError::UnexpectedBody { .. })
        ));
    }

    #[test]
    fn test_manual_index() {
        let mut index = ContractIndex::new();
        assert!(index.is_empty());
        index.insert(EndpointContract::new("/items", Verb::Get).with_query_param("q"));
        let replaced = index.insert(EndpointContract::new("/items", Verb::Get));
        assert!(replaced.is_some());
        assert_eq!(index.len(), 1);
        assert!(index.get("/items", Verb::Get).unwrap().args.query.is_empty());
    }
}
