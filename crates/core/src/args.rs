//! Call arguments as JSON values.
//!
//! Both hook flavours reduce their arguments to [`ArgValues`] before building
//! keys and URLs: typed endpoints through [`crate::CallArgs::values`], dynamic
//! calls by constructing it directly.

use serde_json::{Map, Value};

/// The present members of a call, in declaration order.
///
/// `None` means the member is absent, which is distinct from a member
/// holding JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgValues {
    /// Query parameters.
    pub query: Option<Value>,
    /// Path parameters by name.
    pub path: Option<Map<String, Value>>,
    /// Request payload.
    pub body: Option<Value>,
}

impl ArgValues {
    /// No members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query member.
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Set the whole path member.
    pub fn with_path(mut self, path: Map<String, Value>) -> Self {
        self.path = Some(path);
        self
    }

    /// Add one path parameter, creating the path member if needed.
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.path
            .get_or_insert_with(Map::new)
            .insert(name.into(), value.into());
        self
    }

    /// Set the body member.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_params_accumulate() {
        let args = ArgValues::new()
            .with_path_param("org", "acme")
            .with_path_param("id", 7);
        let path = args.path.as_ref().map(|p| p.len());
        assert_eq!(path, Some(2));
        assert_eq!(args.path.unwrap()["id"], json!(7));
    }

    #[test]
    fn test_absent_and_null_body_differ() {
        let absent = ArgValues::new();
        let null = ArgValues::new().with_body(Value::Null);
        assert_ne!(absent, null);
    }
}
