/// Returns `true` for JSON media types.
///
/// Matches `application/json`, `text/json` and any `+json` structured
/// syntax suffix. Parameters and case are ignored.
///
/// # Examples
///
/// ```
/// use pulith_http::core::is_json_mime_type;
///
/// assert!(is_json_mime_type("application/json; charset=utf-8"));
/// assert!(is_json_mime_type("application/problem+json"));
/// assert!(!is_json_mime_type("text/plain"));
/// ```
pub fn is_json_mime_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.split_once('/') {
        Some(("application" | "text", "json")) => true,
        Some((_, subtype)) => subtype.ends_with("+json"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_types() {
        assert!(is_json_mime_type("application/json"));
        assert!(is_json_mime_type("TEXT/JSON"));
        assert!(is_json_mime_type("  application/json ;charset=UTF-8"));
    }

    #[test]
    fn suffixed_json_types() {
        assert!(is_json_mime_type("application/vnd.api+json"));
        assert!(is_json_mime_type("application/ld+json; profile=x"));
    }

    #[test]
    fn non_json_types() {
        assert!(!is_json_mime_type(""));
        assert!(!is_json_mime_type("json"));
        assert!(!is_json_mime_type("application/x-www-form-urlencoded"));
        assert!(!is_json_mime_type("text/jsonish"));
        assert!(!is_json_mime_type("image/json-like"));
    }
}
