//! Request body encoding.

use serde_json::{Map, Value};
use url::form_urlencoded::byte_serialize;

use super::mime::is_json_mime_type;
use crate::data::{RequestData, RequestOptions};
use crate::error::Result;

/// Media type of form-encoded request bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const LEFT_BRACKET: &str = "%5B";
const RIGHT_BRACKET: &str = "%5D";

fn encode_component(input: &str) -> String { byte_serialize(input.as_bytes()).collect() }

/// Encode a structured value as `application/x-www-form-urlencoded` using
/// bracket notation.
///
/// - `k=v` for scalars
/// - `k[]=item` per sequence element, in order
/// - `k[sub]=…` for nested maps, at any depth
/// - `k[i]` when a sequence element is itself a map or sequence
/// - a bare `k` for `null`
///
/// Components use `application/x-www-form-urlencoded` escaping: a space becomes
/// `+`, and only ASCII alphanumerics and `*-._` are left as-is, so `*` stays
/// literal while `~` is escaped to `%7E`.
///
/// # Examples
///
/// ```
/// use pulith_http::core::encode_form;
/// use serde_json::json;
///
/// let map = json!({"q": "a b", "tags": ["x", "y"]});
/// assert_eq!(
///     encode_form(map.as_object().unwrap()),
///     "q=a+b&tags%5B%5D=x&tags%5B%5D=y"
/// );
/// ```
pub fn encode_form(map: &Map<String, Value>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in map {
        push_pairs(&mut pairs, encode_component(key), value);
    }
    pairs.join("&")
}

fn push_pairs(pairs: &mut Vec<String>, path: String, value: &Value) {
    match value {
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                let index = if item.is_object() || item.is_array() {
                    idx.to_string()
                } else {
                    String::new()
                };
                push_pairs(pairs, format!("{path}{LEFT_BRACKET}{index}{RIGHT_BRACKET}"), item);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let key = encode_component(key);
                push_pairs(pairs, format!("{path}{LEFT_BRACKET}{key}{RIGHT_BRACKET}"), item);
            }
        }
        Value::Null => pairs.push(path),
        Value::String(text) => pairs.push(format!("{path}={}", encode_component(text))),
        scalar => pairs.push(format!("{path}={}", encode_component(&scalar.to_string()))),
    }
}

/// Turn the request payload into wire-ready text.
///
/// Text passes through, a JSON content type serialises with `serde_json`,
/// maps are form encoded, and bytes fall back to their lossy UTF-8 form.
pub fn encode_request(options: &RequestOptions) -> Result<String> {
    let Some(data) = &options.data else {
        return Ok(String::new());
    };
    let json = options.effective_content_type().is_some_and(is_json_mime_type);

    Ok(match data {
        RequestData::Text(text) => text.clone(),
        RequestData::Map(map) if json => serde_json::to_string(map)?,
        RequestData::Bytes(bytes) if json => serde_json::to_string(&bytes[..])?,
        RequestData::Map(map) => encode_form(map),
        RequestData::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    })
}

/// Content type implied by the payload when none is declared.
///
/// A map payload without a declared content type is form encoded, so it
/// implies [`FORM_CONTENT_TYPE`]. Everything else implies nothing.
pub fn implied_content_type(options: &RequestOptions) -> Option<&'static str> {
    match options.data {
        Some(RequestData::Map(_)) if options.effective_content_type().is_none() => {
            Some(FORM_CONTENT_TYPE)
        }
        _ => None,
    }
}
