//! Pure transformations: request encoding, media type checks and redirect
//! rules. Nothing here performs I/O.

mod encode;
mod mime;
mod redirect;

pub use encode::{FORM_CONTENT_TYPE, encode_form, encode_request, implied_content_type};
pub use mime::is_json_mime_type;
pub use redirect::{SENSITIVE_HEADERS, is_redirect, redirect_method, strip_redirect_headers};
