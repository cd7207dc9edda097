use std::borrow::Cow;

use bytes::Bytes;
use futures_util::TryStreamExt;
use tracing::debug;

use super::adapter::HttpClientAdapter;
use super::transformer::{DefaultTransformer, Transformer};
use crate::core::implied_content_type;
use crate::data::response::chunked;
use crate::data::{ByteStream, ProgressCallback, RequestData, RequestOptions, ResponseData};
use crate::error::{Error, Result};

/// Runs one request end to end: encode, send through the adapter, decode.
///
/// Requests share nothing but the adapter, so one dispatcher can serve
/// concurrent requests.
pub struct Dispatcher<A: HttpClientAdapter, T: Transformer = DefaultTransformer> {
    adapter:     A,
    transformer: T,
}

impl<A: HttpClientAdapter> Dispatcher<A> {
    pub fn new(adapter: A) -> Self { Self::with_transformer(adapter, DefaultTransformer) }
}

impl<A: HttpClientAdapter, T: Transformer> Dispatcher<A, T> {
    pub fn with_transformer(adapter: A, transformer: T) -> Self { Self { adapter, transformer } }

    pub fn adapter(&self) -> &A { &self.adapter }

    pub fn transformer(&self) -> &T { &self.transformer }

    /// Execute a request and decode its response according to
    /// [`RequestOptions::response_type`].
    ///
    /// A form-encoded map payload with no declared content type is sent as
    /// `application/x-www-form-urlencoded`.
    pub async fn fetch(&self, options: &RequestOptions) -> Result<ResponseData> {
        if let Some(token) = &options.cancel_token
            && token.is_cancelled()
        {
            return Err(Error::Cancelled(token.reason().unwrap_or("cancelled").to_string()));
        }

        let options: Cow<'_, RequestOptions> = match implied_content_type(options) {
            Some(content_type) if options.is_body_method() => {
                Cow::Owned(options.clone().content_type(content_type))
            }
            _ => Cow::Borrowed(options),
        };
        let options = options.as_ref();

        debug!(method = %options.method, url = %options.url, "dispatching request");
        let body = self.request_body(options)?;
        let response = self
            .adapter
            .fetch(options, body, options.cancel_token.clone())
            .await?;
        debug!(
            status = response.status_code,
            redirects = response.redirects.len(),
            "response received"
        );

        self.transformer.transform_response(options, response).await
    }

    /// Lazy request body, present only for body-carrying methods with a
    /// payload. Binary payloads are sent as-is.
    pub fn request_body(&self, options: &RequestOptions) -> Result<Option<ByteStream>> {
        if !options.is_body_method() {
            return Ok(None);
        }
        let Some(data) = &options.data else {
            return Ok(None);
        };

        let bytes = match data {
            RequestData::Bytes(bytes) => bytes.clone(),
            _ => Bytes::from(self.transformer.transform_request(options)?),
        };
        let total = bytes.len() as u64;
        Ok(Some(track_send_progress(
            chunked(bytes),
            total,
            options.on_send_progress.clone(),
        )))
    }

    pub async fn close(&self, force: bool) { self.adapter.close(force).await }
}

/// Report send progress as the adapter polls the body.
fn track_send_progress(
    stream: ByteStream,
    total: u64,
    callback: Option<ProgressCallback>,
) -> ByteStream {
    let Some(callback) = callback else {
        return stream;
    };
    let mut sent = 0u64;
    Box::pin(stream.inspect_ok(move |chunk| {
        sent += chunk.len() as u64;
        callback(sent, Some(total));
    }))
}
