//! OpenAPI document structs for serde deserialization.
//!
//! Only the subset the contract index reads is modelled: paths, operations
//! per verb, parameters, request bodies and per-status response content.
//! Unknown fields are ignored.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::ContractError;
use crate::http::Verb;

/// Media type whose schema drives argument and response shapes.
pub const JSON_CONTENT: &str = "application/json";

/// Root OpenAPI document.
#[derive(Debug, Deserialize)]
pub struct OpenApiSpec {
    /// Path items keyed by endpoint template.
    #[serde(default)]
    pub paths: HashMap<String, PathItem>,
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Default, Deserialize)]
pub struct PathItem {
    /// `get` operation.
    pub get: Option<Operation>,
    /// `post` operation.
    pub post: Option<Operation>,
    /// `put` operation.
    pub put: Option<Operation>,
    /// `patch` operation.
    pub patch: Option<Operation>,
    /// `delete` operation.
    pub delete: Option<Operation>,
    /// Path-level parameters shared by all operations.
    pub parameters: Option<Vec<Parameter>>,
}

impl PathItem {
    /// The operation declared for `verb`, if any.
    pub fn operation(&self, verb: Verb) -> Option<&Operation> {
        match verb {
            Verb::Get => self.get.as_ref(),
            Verb::Post => self.post.as_ref(),
            Verb::Put => self.put.as_ref(),
            Verb::Patch => self.patch.as_ref(),
            Verb::Delete => self.delete.as_ref(),
        }
    }
}

/// A single operation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// `operationId`
    pub operation_id: Option<String>,
    /// One-line summary.
    pub summary: Option<String>,
    /// Operation-level parameters.
    pub parameters: Option<Vec<Parameter>>,
    /// `requestBody`
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status key as written.
    #[serde(default)]
    pub responses: HashMap<String, Response>,
}

/// A parameter (query, path, header or cookie).
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// `in`: `query`, `path`, `header` or `cookie`.
    #[serde(rename = "in")]
    pub location: String,
    /// Absent means optional.
    #[serde(default)]
    pub required: bool,
    /// Value schema.
    pub schema: Option<Schema>,
}

/// A request body definition.
#[derive(Debug, Deserialize)]
pub struct RequestBody {
    /// Absent means optional.
    #[serde(default)]
    pub required: bool,
    /// Content keyed by media type.
    pub content: Option<HashMap<String, MediaType>>,
}

/// A response definition.
#[derive(Debug, Deserialize)]
pub struct Response {
    /// Response description.
    pub description: Option<String>,
    /// Content keyed by media type.
    pub content: Option<HashMap<String, MediaType>>,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Deserialize)]
pub struct MediaType {
    /// Content schema.
    pub schema: Option<Schema>,
}

/// The slice of JSON Schema needed to name a payload type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Schema {
    /// `type`
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    /// `$ref`
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    /// Element schema of an array.
    pub items: Option<Box<Schema>>,

    /// `anyOf`
    #[serde(rename = "anyOf")]
    pub any_of: Option<Vec<Schema>>,

    /// `oneOf`
    #[serde(rename = "oneOf")]
    pub one_of: Option<Vec<Schema>>,

    /// OpenAPI 3.0 nullable flag (3.1 uses type arrays instead).
    pub nullable: Option<bool>,
}

/// Schema type can be a single type or an array of types (for nullable).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// `"type": "string"`
    Single(String),
    /// `"type": ["string", "null"]`
    Multiple(Vec<String>),
}

impl OpenApiSpec {
    /// Parse an OpenAPI document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        serde_json::from_str(json).map_err(|e| ContractError::Parse(e.to_string()))
    }
}

impl RequestBody {
    /// Schema of the JSON content, if the body declares one.
    pub fn json_schema(&self) -> Option<&Schema> {
        self.content
            .as_ref()
            .and_then(|content| content.get(JSON_CONTENT))
            .and_then(|media| media.schema.as_ref())
    }
}

impl Response {
    /// Schema of the JSON content, if the response declares one.
    pub fn json_schema(&self) -> Option<&Schema> {
        self.content
            .as_ref()
            .and_then(|content| content.get(JSON_CONTENT))
            .and_then(|media| media.schema.as_ref())
    }
}

impl Schema {
    /// Schema referring to a component by name.
    pub fn named(name: &str) -> Self {
        Self {
            ref_path: Some(format!("#/components/schemas/{name}")),
            ..Self::unknown()
        }
    }

    /// Schema of a single primitive JSON type.
    pub fn of_type(ty: &str) -> Self {
        Self {
            schema_type: Some(SchemaType::Single(ty.to_string())),
            ..Self::unknown()
        }
    }

    /// Schema with no constraints.
    pub fn unknown() -> Self {
        Self {
            schema_type: None,
            ref_path: None,
            items: None,
            any_of: None,
            one_of: None,
            nullable: None,
        }
    }

    /// Check if this schema is nullable (contains null in anyOf, type array, or nullable flag).
    pub fn is_nullable(&self) -> bool {
        if self.nullable == Some(true) {
            return true;
        }

        if let Some(any_of) = &self.any_of
            && any_of
                .iter()
                .any(|s| matches!(&s.schema_type, Some(SchemaType::Single(t)) if t == "null"))
        {
            return true;
        }

        matches!(
            &self.schema_type,
            Some(SchemaType::Multiple(types)) if types.iter().any(|t| t == "null")
        )
    }

    /// Short human-readable type name, e.g. `Widget`, `array<string>`, `Item | null`.
    pub fn label(&self) -> String {
        if let Some(ref_path) = &self.ref_path {
            return ref_to_type_name(ref_path).to_string();
        }

        if let Some(variants) = self.any_of.as_ref().or(self.one_of.as_ref()) {
            return variants
                .iter()
                .map(Schema::label)
                .collect::<Vec<_>>()
                .join(" | ");
        }

        let base = match &self.schema_type {
            Some(SchemaType::Single(t)) => self.type_label(t),
            Some(SchemaType::Multiple(types)) => types
                .iter()
                .filter(|t| *t != "null")
                .map(|t| self.type_label(t))
                .collect::<Vec<_>>()
                .join(" | "),
            None => "unknown".to_string(),
        };

        if self.is_nullable() {
            format!("{base} | null")
        } else {
            base
        }
    }

    fn type_label(&self, ty: &str) -> String {
        match ty {
            "array" => {
                let item = self
                    .items
                    .as_ref()
                    .map_or_else(|| "unknown".to_string(), |items| items.label());
                format!("array<{item}>")
            }
            other => other.to_string(),
        }
    }
}

/// Extract type name from a `$ref` path.
fn ref_to_type_name(ref_path: &str) -> &str {
    ref_path
        .strip_prefix("#/components/schemas/")
        .unwrap_or(ref_path)
}
