//! Argument and response shapes derived for one (endpoint, verb) pair.

use std::collections::BTreeMap;

use crate::http::StatusKey;
use crate::spec::Schema;

/// Whether callers must supply path parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum PathShape {
    /// The endpoint declares no required path parameters; the member is omitted.
    NoPath,
    /// The member is required and must carry every listed name.
    WithPath {
        /// Required names, in declaration order.
        names: Vec<String>,
    },
}

/// Whether callers must supply a request body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyShape {
    /// No required body; the member is omitted.
    NoBody,
    /// The member is required. `schema` is the JSON content schema, if any.
    WithBody {
        /// JSON content schema.
        schema: Option<Schema>,
    },
}

/// The members a call must (or may) carry.
///
/// The query member is always optional; `query` only lists the declared
/// names for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgShape {
    /// Declared query parameter names.
    pub query: Vec<String>,
    /// Path member shape.
    pub path: PathShape,
    /// Body member shape.
    pub body: BodyShape,
}

impl ArgShape {
    /// Shape of an operation that takes nothing but optional query parameters.
    pub fn empty() -> Self {
        Self {
            query: Vec::new(),
            path: PathShape::NoPath,
            body: BodyShape::NoBody,
        }
    }

    /// Required path parameter names (empty for [`PathShape::NoPath`]).
    pub fn path_names(&self) -> &[String] {
        match &self.path {
            PathShape::NoPath => &[],
            PathShape::WithPath { names } => names,
        }
    }

    /// Whether the body member is required.
    pub fn requires_body(&self) -> bool {
        matches!(self.body, BodyShape::WithBody { .. })
    }
}

/// Declared responses split into success and error statuses.
///
/// Only statuses carrying JSON content are kept; a status without a JSON
/// schema contributes nothing to either side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseShape {
    /// Schemas of success statuses.
    pub success: BTreeMap<StatusKey, Schema>,
    /// Schemas of every other declared status.
    pub errors: BTreeMap<StatusKey, Schema>,
}

impl ResponseShape {
    /// Record the JSON schema of a response, routing it by status class.
    pub fn insert(&mut self, status: StatusKey, schema: Schema) {
        if status.is_success() {
            self.success.insert(status, schema);
        } else {
            self.errors.insert(status, schema);
        }
    }

    /// Schema for a successful `status`: the exact code first, then `2XX`.
    pub fn success_schema(&self, status: u16) -> Option<&Schema> {
        self.success
            .get(&StatusKey::Code(status))
            .or_else(|| self.success.get(&StatusKey::Range(2)))
    }

    /// Schema declared for a failed `status`.
    ///
    /// Lookup order is the exact code, then its class wildcard (`4XX`), then
    /// `default`. A status declared under none of them has no typed payload.
    pub fn error_schema(&self, status: u16) -> Option<&Schema> {
        let class = StatusKey::Range((status / 100) as u8);
        self.errors
            .get(&StatusKey::Code(status))
            .or_else(|| self.errors.get(&class))
            .or_else(|| self.errors.get(&StatusKey::Default))
    }

    /// Whether error payloads are untyped because no error status is declared.
    pub fn errors_untyped(&self) -> bool {
        self.errors.is_empty()
    }

    /// The success type as a union label, or `never` when nothing is declared.
    pub fn success_label(&self) -> String {
        union_label(self.success.values())
    }

    /// The error type as a union label, or `unknown` when nothing is declared.
    pub fn error_label(&self) -> String {
        if self.errors_untyped() {
            "unknown".to_string()
        } else {
            union_label(self.errors.values())
        }
    }
}

fn union_label<'a>(schemas: impl Iterator<Item = &'a Schema>) -> String {
    let mut labels: Vec<String> = Vec::new();
    for label in schemas.map(Schema::label) {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    if labels.is_empty() {
        "never".to_string()
    } else {
        labels.join(" | ")
    }
}
