use std::future::{Future, pending};
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use futures_util::{StreamExt, stream};
use tracing::{debug, trace};

use crate::core::{encode_request, is_json_mime_type};
use crate::data::{ByteStream, RequestOptions, ResponseBody, ResponseData, ResponseType};
use crate::error::{Error, Result};

/// Request encoder and response decoder.
pub trait Transformer: Send + Sync {
    /// Turn the request payload into wire-ready text.
    fn transform_request(&self, options: &RequestOptions) -> Result<String>;

    /// Turn an adapter response into the caller-visible result.
    fn transform_response(
        &self,
        options: &RequestOptions,
        response: ResponseBody,
    ) -> impl Future<Output = Result<ResponseData>> + Send;
}

/// Standard transformer: form/JSON request encoding, and a drain that races
/// the receive timeout and the cancellation signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransformer;

impl Transformer for DefaultTransformer {
    fn transform_request(&self, options: &RequestOptions) -> Result<String> {
        encode_request(options)
    }

    async fn transform_response(
        &self,
        options: &RequestOptions,
        mut response: ResponseBody,
    ) -> Result<ResponseData> {
        if options.response_type == ResponseType::Stream {
            return Ok(ResponseData::Stream(response));
        }

        let total = response.headers.content_length();
        let stream = response
            .take_stream()
            .unwrap_or_else(|| Box::pin(stream::empty()));
        let buffer = drain(stream, options, total).await?;

        if options.response_type == ResponseType::Bytes {
            return Ok(ResponseData::Bytes(buffer));
        }

        let text = match &options.response_decoder {
            Some(decoder) => decoder(&buffer, options, &response).map_err(Error::Decode)?,
            None => String::from_utf8_lossy(&buffer).into_owned(),
        };

        let json_body = response.headers.content_type().is_some_and(is_json_mime_type);
        if !text.is_empty() && options.response_type == ResponseType::Json && json_body {
            let value = match &options.json_decoder {
                Some(decode) => decode(&text).map_err(Error::Decode)?,
                None => serde_json::from_str(&text)?,
            };
            return Ok(ResponseData::Json(value));
        }

        Ok(ResponseData::Text(text))
    }
}

/// Drain a body stream into one contiguous buffer.
///
/// Natural completion, the receive timeout and the cancellation signal race;
/// the first to settle decides the outcome. The stream is dropped when this
/// returns, so a losing subscription receives nothing further. A partial
/// buffer is never returned.
///
/// Receive progress is reported per chunk with `total` as the expected length.
pub async fn drain(
    mut stream: ByteStream,
    options: &RequestOptions,
    total: Option<u64>,
) -> Result<Bytes> {
    let timeout = options.receive_timeout;
    let started = Instant::now();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut received = 0u64;

    let collect = async {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            received += chunk.len() as u64;
            if let Some(ref callback) = options.on_receive_progress {
                callback(received, total);
            }
            chunks.push(chunk);
        }
        Ok::<(), Error>(())
    };
    let deadline = async {
        if timeout.is_zero() {
            pending::<()>().await;
        } else {
            tokio::time::sleep(timeout).await;
        }
    };
    let cancelled = async {
        match &options.cancel_token {
            Some(token) => token.cancelled().await,
            None => pending::<String>().await,
        }
    };

    let outcome = tokio::select! {
        biased;
        reason = cancelled => Err(Error::Cancelled(reason)),
        () = deadline => Err(Error::ReceiveTimeout(timeout)),
        result = collect => result,
    };

    if let Err(ref err) = outcome {
        debug!(error = %err, received, "response drain aborted");
    }
    outcome?;

    let mut buffer = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
    for chunk in &chunks {
        buffer.extend_from_slice(chunk);
    }
    trace!(
        bytes = buffer.len(),
        chunks = chunks.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "response drained"
    );
    Ok(buffer.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CancelToken, Headers};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn json_response(body: &str) -> ResponseBody {
        ResponseBody::from_string(body, 200)
            .with_headers(Headers::from_map([("Content-Type", vec!["application/json"])]))
    }

    async fn transform(options: &RequestOptions, response: ResponseBody) -> ResponseData {
        DefaultTransformer.transform_response(options, response).await.unwrap()
    }

    #[tokio::test]
    async fn json_body_is_parsed() {
        let options = RequestOptions::get("/");
        let data = transform(&options, json_response(r#"{"ok":true}"#)).await;
        assert_eq!(data.as_json(), Some(&json!({"ok": true})));
    }

    #[tokio::test]
    async fn json_request_with_text_response_stays_text() {
        let options = RequestOptions::get("/");
        let response = ResponseBody::from_string("{\"ok\":true}", 200);
        let data = transform(&options, response).await;
        assert_eq!(data.as_text(), Some("{\"ok\":true}"));
    }

    #[tokio::test]
    async fn empty_json_body_is_empty_text() {
        let options = RequestOptions::get("/");
        let data = transform(&options, json_response("")).await;
        assert_eq!(data.as_text(), Some(""));
    }

    #[tokio::test]
    async fn plain_type_skips_json_parsing() {
        let options = RequestOptions::get("/").response_type(ResponseType::Plain);
        let data = transform(&options, json_response("[1,2]")).await;
        assert_eq!(data.as_text(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn invalid_json_surfaces_parser_error() {
        let options = RequestOptions::get("/");
        let err = DefaultTransformer
            .transform_response(&options, json_response("{oops"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn bytes_type_returns_raw_buffer() {
        let options = RequestOptions::get("/").response_type(ResponseType::Bytes);
        let response = ResponseBody::from_bytes(vec![0xff, 0x00, 0xfe], 200);
        let data = transform(&options, response).await;
        assert_eq!(data.as_bytes().map(|b| b.to_vec()), Some(vec![0xff, 0x00, 0xfe]));
    }

    #[tokio::test]
    async fn malformed_utf8_is_substituted() {
        let options = RequestOptions::get("/").response_type(ResponseType::Plain);
        let response = ResponseBody::from_bytes(vec![b'o', 0xff, b'k'], 200);
        let data = transform(&options, response).await;
        assert_eq!(data.as_text(), Some("o\u{fffd}k"));
    }

    #[tokio::test]
    async fn stream_type_is_not_drained() {
        let options = RequestOptions::get("/").response_type(ResponseType::Stream);
        let data = transform(&options, ResponseBody::from_string("body", 200)).await;
        let body = data.into_stream().unwrap();
        assert!(!body.is_consumed());
    }

    #[tokio::test]
    async fn custom_decoders_see_consumed_envelope() {
        let options = RequestOptions::get("/")
            .response_decoder(|buffer, _options, response| {
                assert!(response.is_consumed());
                Ok(String::from_utf8_lossy(buffer).to_uppercase())
            })
            .json_decoder(|text| Ok(json!({ "raw": text })));
        let data = transform(&options, json_response("abc")).await;
        assert_eq!(data.as_json(), Some(&json!({"raw": "ABC"})));
    }

    #[tokio::test]
    async fn custom_decoder_error_is_passed_through() {
        let options = RequestOptions::get("/")
            .response_decoder(|_, _, _| Err("bad encoding".into()));
        let err = DefaultTransformer
            .transform_response(&options, json_response("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(err.to_string(), "decode error: bad encoding");
    }

    #[tokio::test]
    async fn receive_progress_reports_content_length() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let options = RequestOptions::get("/")
            .response_type(ResponseType::Bytes)
            .on_receive_progress(move |received, total| sink.lock().unwrap().push((received, total)));

        let body = vec![1u8; crate::data::CHUNK_SIZE + 1];
        let response = ResponseBody::from_bytes(body, 200)
            .with_headers(Headers::from_map([("content-length", vec!["8193"])]));
        transform(&options, response).await;

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![(8192, Some(8193)), (8193, Some(8193))]);
    }

    #[tokio::test]
    async fn unknown_length_reports_none() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let options = RequestOptions::get("/")
            .on_receive_progress(move |received, total| sink.lock().unwrap().push((received, total)));
        transform(&options, ResponseBody::from_string("abc", 200)).await;
        assert_eq!(*seen.lock().unwrap(), vec![(3, None)]);
    }

    #[tokio::test]
    async fn already_cancelled_token_wins() {
        let token = CancelToken::new();
        token.cancel("gone");
        let options = RequestOptions::get("/").cancel_token(token);
        let err = DefaultTransformer
            .transform_response(&options, ResponseBody::from_string("abc", 200))
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
        assert_eq!(err.to_string(), "request cancelled: gone");
    }

    #[tokio::test]
    async fn stream_error_is_passed_through() {
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"a")),
            Err(Error::transport("connection reset")),
        ];
        let options = RequestOptions::get("/").receive_timeout(Duration::from_secs(5));
        let err = drain(Box::pin(stream::iter(chunks)), &options, None).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
