use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::{Map, Value};

use super::cancel::CancelToken;
use super::headers::{CONTENT_TYPE, Headers};
use super::response::ResponseBody;
use crate::error::BoxError;

/// Progress callback: `(bytes so far, expected total)`.
///
/// The total is `None` when the length is not known up front.
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Custom response decoder, given the drained buffer, the request and the
/// already consumed envelope.
pub type ResponseDecoder = Arc<
    dyn Fn(&[u8], &RequestOptions, &ResponseBody) -> std::result::Result<String, BoxError>
        + Send
        + Sync,
>;

/// Custom JSON decode function.
pub type JsonDecoder = Arc<dyn Fn(&str) -> std::result::Result<Value, BoxError> + Send + Sync>;

/// Methods that carry a request body.
pub const BODY_METHODS: [&str; 4] = ["POST", "PUT", "PATCH", "DELETE"];

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestData {
    Text(String),
    Bytes(Bytes),
    /// Keyed structured value; key order is preserved.
    Map(Map<String, Value>),
}

impl From<String> for RequestData {
    fn from(text: String) -> Self { RequestData::Text(text) }
}

impl From<&str> for RequestData {
    fn from(text: &str) -> Self { RequestData::Text(text.to_string()) }
}

impl From<Bytes> for RequestData {
    fn from(bytes: Bytes) -> Self { RequestData::Bytes(bytes) }
}

impl From<Vec<u8>> for RequestData {
    fn from(bytes: Vec<u8>) -> Self { RequestData::Bytes(bytes.into()) }
}

impl From<Map<String, Value>> for RequestData {
    fn from(map: Map<String, Value>) -> Self { RequestData::Map(map) }
}

/// How the drained response is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// The envelope is returned undrained; the caller owns the stream.
    Stream,
    /// UTF-8 text.
    Plain,
    /// Parsed JSON when the response declares a JSON media type, text otherwise.
    #[default]
    Json,
    Bytes,
}

/// Per-request options.
///
/// Built by the caller and only read by the core.
///
/// # Examples
///
/// ```
/// use pulith_http::{RequestOptions, ResponseType};
/// use std::time::Duration;
///
/// let options = RequestOptions::post("https://example.com/items")
///     .header("Accept", "application/json")
///     .content_type("application/json")
///     .data(r#"{"name":"pulith"}"#)
///     .response_type(ResponseType::Json)
///     .receive_timeout(Duration::from_secs(5));
/// assert_eq!(options.method, "POST");
/// ```
#[derive(Clone)]
pub struct RequestOptions {
    pub method:              String,
    pub url:                 String,
    pub headers:             Headers,
    pub data:                Option<RequestData>,
    /// Declared content type. Falls back to the `content-type` header.
    pub content_type:        Option<String>,
    pub response_type:       ResponseType,
    /// Zero disables the timeout.
    pub send_timeout:        Duration,
    /// Zero disables the timeout.
    pub receive_timeout:     Duration,
    pub on_send_progress:    Option<ProgressCallback>,
    pub on_receive_progress: Option<ProgressCallback>,
    pub response_decoder:    Option<ResponseDecoder>,
    pub json_decoder:        Option<JsonDecoder>,
    pub cancel_token:        Option<CancelToken>,
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("data", &self.data)
            .field("content_type", &self.content_type)
            .field("response_type", &self.response_type)
            .field("send_timeout", &self.send_timeout)
            .field("receive_timeout", &self.receive_timeout)
            .field("on_send_progress", &self.on_send_progress.as_ref().map(|_| "{ ... }"))
            .field("on_receive_progress", &self.on_receive_progress.as_ref().map(|_| "{ ... }"))
            .field("response_decoder", &self.response_decoder.as_ref().map(|_| "{ ... }"))
            .field("json_decoder", &self.json_decoder.as_ref().map(|_| "{ ... }"))
            .field("cancel_token", &self.cancel_token)
            .finish()
    }
}

impl Default for RequestOptions {
    fn default() -> Self { Self::new("GET", "") }
}

impl RequestOptions {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method:              method.into().to_ascii_uppercase(),
            url:                 url.into(),
            headers:             Headers::new(),
            data:                None,
            content_type:        None,
            response_type:       ResponseType::default(),
            send_timeout:        Duration::ZERO,
            receive_timeout:     Duration::ZERO,
            on_send_progress:    None,
            on_receive_progress: None,
            response_decoder:    None,
            json_decoder:        None,
            cancel_token:        None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self { Self::new("GET", url) }

    pub fn post(url: impl Into<String>) -> Self { Self::new("POST", url) }

    pub fn put(url: impl Into<String>) -> Self { Self::new("PUT", url) }

    pub fn delete(url: impl Into<String>) -> Self { Self::new("DELETE", url) }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn data(mut self, data: impl Into<RequestData>) -> Self {
        self.data = Some(data.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    #[must_use]
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    #[must_use]
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    #[must_use]
    pub fn on_send_progress(mut self, callback: impl Fn(u64, Option<u64>) + Send + Sync + 'static) -> Self {
        self.on_send_progress = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_receive_progress(
        mut self,
        callback: impl Fn(u64, Option<u64>) + Send + Sync + 'static,
    ) -> Self {
        self.on_receive_progress = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn response_decoder<F>(mut self, decoder: F) -> Self
    where
        F: Fn(&[u8], &RequestOptions, &ResponseBody) -> std::result::Result<String, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.response_decoder = Some(Arc::new(decoder));
        self
    }

    #[must_use]
    pub fn json_decoder(
        mut self,
        decoder: impl Fn(&str) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.json_decoder = Some(Arc::new(decoder));
        self
    }

    #[must_use]
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Declared content type, or the `content-type` header.
    pub fn effective_content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .or_else(|| self.headers.get(CONTENT_TYPE).and_then(|v| v.first()).map(String::as_str))
    }

    pub fn is_body_method(&self) -> bool { BODY_METHODS.contains(&self.method.as_str()) }
}
