//! Endpoint template parsing.

/// Names of the `{name}` placeholders in `template`, in order of appearance.
///
/// Repeated placeholders are listed once per occurrence. An unterminated
/// `{` ends the scan.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        names.push(&after[..end]);
        rest = &after[end + 1..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert!(placeholders("/items").is_empty());
        assert_eq!(placeholders("/items/{id}"), ["id"]);
        assert_eq!(
            placeholders("/orgs/{org}/items/{item_id}/{org}"),
            ["org", "item_id", "org"]
        );
        assert_eq!(placeholders("/broken/{id"), Vec::<&str>::new());
    }
}
