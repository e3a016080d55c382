//! URL templating for endpoint identifiers.

use serde_json::{Map, Value};
use tracing::{debug, warn};
use typed_hooks_contract::placeholders;

/// Substitute path parameters into an endpoint template.
///
/// Without a path member the template is returned unchanged. Otherwise each
/// `(name, value)` entry replaces the first `{name}` in the template only;
/// repeated placeholders keep their later occurrences. Values are inserted
/// without escaping. Placeholders left over are kept as literal text.
pub fn build_url(template: &str, path: Option<&Map<String, Value>>) -> String {
    let Some(path) = path else {
        return template.to_string();
    };

    let mut url = template.to_string();
    for (name, value) in path {
        let placeholder = format!("{{{name}}}");
        if !url.contains(&placeholder) {
            debug!(template, param = %name, "Path parameter has no placeholder in the template.");
            continue;
        }
        url = url.replacen(&placeholder, &path_value_string(value), 1);
    }

    let unresolved = placeholders(&url);
    if !unresolved.is_empty() {
        warn!(template, %url, ?unresolved, "URL still contains unresolved placeholders.");
    }
    url
}

/// String form of a path parameter value: strings verbatim, anything else as JSON text.
pub fn path_value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
