//! Cache keys.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use serde_json::Value;

use crate::args::ArgValues;

/// `[endpoint, query?, path?, body?]`: the identity of a read.
///
/// Equality is structural, so two calls with equal arguments share a key.
/// Hashing walks the same structure and visits object entries in key order,
/// so it agrees with equality whatever order the map keeps its entries in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<Value>);

impl CacheKey {
    /// The endpoint identifier, always the first element.
    pub fn endpoint(&self) -> &str {
        self.0.first().and_then(Value::as_str).unwrap_or_default()
    }

    /// Every element, endpoint first.
    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    /// Number of elements, endpoint included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Keys always carry their endpoint, so this is false for built keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for part in &self.0 {
            hash_value(part, state);
        }
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0_u8.hash(state),
        Value::Bool(b) => {
            1_u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2_u8.hash(state);
            n.to_string().hash(state);
        }
        Value::String(s) => {
            3_u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4_u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            5_u8.hash(state);
            map.len().hash(state);
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by_key(|(k, _)| *k);
            for (k, v) in entries {
                k.hash(state);
                hash_value(v, state);
            }
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Array(self.0.clone()))
    }
}

/// Build the cache key of a read on `endpoint`.
///
/// Present members follow the endpoint in the order query, path, body.
pub fn build_key(endpoint: &str, args: &ArgValues) -> CacheKey {
    let mut parts = Vec::with_capacity(4);
    parts.push(Value::String(endpoint.to_string()));
    if let Some(query) = &args.query {
        parts.push(query.clone());
    }
    if let Some(path) = &args.path {
        parts.push(Value::Object(path.clone()));
    }
    if let Some(body) = &args.body {
        parts.push(body.clone());
    }
    CacheKey(parts)
}
