use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use futures_util::stream;

use super::headers::Headers;
use crate::error::Result;

/// A boxed stream type for HTTP bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Lazy body bytes. Mid-stream transport failures surface as items.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Chunk size used when an in-memory blob is exposed as a stream.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Split a complete buffer into a finite stream of `CHUNK_SIZE` slices.
///
/// Slices share the original allocation.
pub fn chunked(bytes: Bytes) -> ByteStream {
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + CHUNK_SIZE).min(bytes.len())))
        .collect();
    Box::pin(stream::iter(chunks.into_iter().map(Ok)))
}

/// One followed redirect hop, as reported by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRecord {
    pub url:         String,
    pub status_code: u16,
    pub method:      String,
}

impl RedirectRecord {
    pub fn new(url: impl Into<String>, status_code: u16, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code,
            method: method.into(),
        }
    }
}

enum BodyState {
    Unconsumed(ByteStream),
    Consumed,
}

/// Response envelope produced by an adapter.
///
/// The body stream can be taken exactly once; afterwards the envelope is
/// marked consumed and [`take_stream`](Self::take_stream) returns `None`.
pub struct ResponseBody {
    pub status_code:    u16,
    pub status_message: Option<String>,
    pub headers:        Headers,
    pub redirects:      Vec<RedirectRecord>,
    pub is_redirect:    bool,
    /// Adapter-specific metadata.
    pub extra:          HashMap<String, serde_json::Value>,
    body:               BodyState,
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody")
            .field("status_code", &self.status_code)
            .field("status_message", &self.status_message)
            .field("headers", &self.headers)
            .field("redirects", &self.redirects)
            .field("is_redirect", &self.is_redirect)
            .field("extra", &self.extra)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

impl ResponseBody {
    pub fn new(stream: ByteStream, status_code: u16) -> Self {
        Self {
            status_code,
            status_message: None,
            headers: Headers::new(),
            redirects: Vec::new(),
            is_redirect: false,
            extra: HashMap::new(),
            body: BodyState::Unconsumed(stream),
        }
    }

    /// Envelope over a complete text body.
    pub fn from_string(text: impl Into<String>, status_code: u16) -> Self {
        let text: String = text.into();
        Self::from_bytes(text, status_code)
    }

    /// Envelope over a complete binary body.
    pub fn from_bytes(bytes: impl Into<Bytes>, status_code: u16) -> Self {
        Self::new(chunked(bytes.into()), status_code)
    }

    #[must_use]
    pub fn with_status_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Append a redirect hop and mark the response as redirected.
    #[must_use]
    pub fn with_redirect(mut self, record: RedirectRecord) -> Self {
        self.redirects.push(record);
        self.is_redirect = true;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Take the body stream, leaving the envelope consumed.
    pub fn take_stream(&mut self) -> Option<ByteStream> {
        match std::mem::replace(&mut self.body, BodyState::Consumed) {
            BodyState::Unconsumed(stream) => Some(stream),
            BodyState::Consumed => None,
        }
    }

    pub fn is_consumed(&self) -> bool { matches!(self.body, BodyState::Consumed) }
}

/// Caller-visible result of response decoding.
#[derive(Debug)]
pub enum ResponseData {
    /// Undrained envelope; the caller consumes the stream.
    Stream(ResponseBody),
    Text(String),
    Json(serde_json::Value),
    Bytes(Bytes),
}

impl ResponseData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseData::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_stream(self) -> Option<ResponseBody> {
        match self {
            ResponseData::Stream(body) => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    async fn collect(stream: ByteStream) -> Vec<Bytes> {
        stream.map(|chunk| chunk.unwrap()).collect().await
    }

    #[tokio::test]
    async fn blob_is_chunked_not_per_byte() {
        let data = vec![7u8; CHUNK_SIZE * 2 + 10];
        let mut response = ResponseBody::from_bytes(data.clone(), 200);
        let chunks = collect(response.take_stream().unwrap()).await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), CHUNK_SIZE);
        assert_eq!(chunks[2].len(), 10);
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn empty_blob_yields_no_chunks() {
        let mut response = ResponseBody::from_string("", 204);
        assert!(collect(response.take_stream().unwrap()).await.is_empty());
    }

    #[test]
    fn stream_is_taken_once() {
        let mut response = ResponseBody::from_string("hello", 200);
        assert!(!response.is_consumed());
        assert!(response.take_stream().is_some());
        assert!(response.is_consumed());
        assert!(response.take_stream().is_none());
    }

    #[test]
    fn redirect_sets_flag() {
        let response = ResponseBody::from_string("", 200)
            .with_redirect(RedirectRecord::new("https://example.com/b", 302, "GET"));
        assert!(response.is_redirect);
        assert_eq!(response.redirects[0].status_code, 302);
    }
}
