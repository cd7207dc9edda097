use crate::data::Headers;
use crate::data::headers::CONTENT_TYPE;

/// Credential-bearing headers that never follow a redirect to another origin.
pub const SENSITIVE_HEADERS: [&str; 4] =
    ["authorization", "cookie", "proxy-authorization", "www-authenticate"];

/// Returns `true` if the HTTP status code indicates a followable redirect.
///
/// # Examples
///
/// ```
/// use pulith_http::core::is_redirect;
///
/// assert!(is_redirect(301));
/// assert!(is_redirect(308));
/// assert!(!is_redirect(304));
/// ```
pub fn is_redirect(status: u16) -> bool { matches!(status, 301 | 302 | 303 | 307 | 308) }

/// Method to use for the next hop, and whether the body must be resent.
///
/// 301, 302 and 303 switch non-`HEAD` requests to `GET` without a body;
/// 307 and 308 repeat the original method and body.
pub fn redirect_method(status: u16, method: &str) -> (String, bool) {
    match status {
        307 | 308 => (method.to_string(), true),
        _ if method == "HEAD" => (method.to_string(), false),
        _ => ("GET".to_string(), false),
    }
}

/// Drop headers that must not survive a redirect hop.
///
/// Credentials are removed when the hop leaves the origin; the content type is
/// removed when the hop no longer carries a body.
pub fn strip_redirect_headers(headers: &mut Headers, cross_origin: bool, body_dropped: bool) {
    if cross_origin {
        for name in SENSITIVE_HEADERS {
            headers.remove_all(name);
        }
    }
    if body_dropped {
        headers.remove_all(CONTENT_TYPE);
    }
}
