use std::future::pending;
use std::time::Duration;

use futures_util::{StreamExt, TryStreamExt, stream};
use reqwest::header::LOCATION;
use reqwest::{Client, Method, Url};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tracing::{debug, warn};

use super::adapter::HttpClientAdapter;
use crate::core::{is_redirect, redirect_method, strip_redirect_headers};
use crate::data::headers::CONTENT_TYPE;
use crate::data::{ByteStream, CancelToken, Headers, RedirectRecord, RequestOptions, ResponseBody};
use crate::error::{Error, Result};

/// Transport configuration for [`ReqwestAdapter`].
#[derive(Debug, Clone)]
pub struct ReqwestAdapterOptions {
    pub connect_timeout:  Option<Duration>,
    /// Follow redirects, recording each hop on the response.
    pub follow_redirects: bool,
    pub max_redirects:    usize,
    pub user_agent:       Option<String>,
}

impl Default for ReqwestAdapterOptions {
    fn default() -> Self {
        Self {
            connect_timeout:  None,
            follow_redirects: true,
            max_redirects:    5,
            user_agent:       None,
        }
    }
}

impl ReqwestAdapterOptions {
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    #[must_use]
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Method, target and headers of one request in a redirect chain.
struct Hop {
    method:       String,
    url:          Url,
    headers:      Headers,
    content_type: Option<String>,
}

/// Production adapter using `reqwest`.
///
/// Redirects are followed by the adapter itself so every hop can be recorded.
/// A hop that would have to resend a streamed body (307/308 after a request
/// with a payload) is not followed; the 3xx response is returned as-is.
/// Credential headers are dropped on a hop to another origin, and the content
/// type is dropped once a hop stops carrying the body.
pub struct ReqwestAdapter {
    client:   Client,
    options:  ReqwestAdapterOptions,
    shutdown: CancellationToken,
    tracker:  TaskTracker,
}

impl ReqwestAdapter {
    /// Create a new adapter with default configuration.
    pub fn new() -> Result<Self> { Self::with_options(ReqwestAdapterOptions::default()) }

    pub fn with_options(options: ReqwestAdapterOptions) -> Result<Self> {
        let mut builder = Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(ref user_agent) = options.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        let client = builder.build().map_err(Error::transport)?;

        Ok(Self {
            client,
            options,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        })
    }

    async fn send(
        &self,
        hop: &Hop,
        send_timeout: Duration,
        body: Option<ByteStream>,
    ) -> Result<reqwest::Response> {
        let method = Method::from_bytes(hop.method.as_bytes())
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;
        let mut request = self.client.request(method, hop.url.clone());

        for (name, values) in hop.headers.iter() {
            for value in values {
                request = request.header(name, value.as_str());
            }
        }
        if let Some(ref content_type) = hop.content_type
            && !hop.headers.contains(CONTENT_TYPE)
        {
            request = request.header(CONTENT_TYPE, content_type.as_str());
        }
        if let Some(body) = body {
            request = request.body(reqwest::Body::wrap_stream(body));
        }

        let pending = request.send();
        let response = if send_timeout.is_zero() {
            pending.await
        } else {
            tokio::time::timeout(send_timeout, pending)
                .await
                .map_err(|_| Error::SendTimeout(send_timeout))?
        };
        response.map_err(Error::transport)
    }

    async fn execute(
        &self,
        options: &RequestOptions,
        mut body: Option<ByteStream>,
    ) -> Result<ResponseBody> {
        let url = Url::parse(&options.url).map_err(|e| Error::InvalidRequest(e.to_string()))?;
        let mut hop = Hop {
            method: options.method.clone(),
            url,
            headers: options.headers.clone(),
            content_type: options.content_type.clone(),
        };
        let had_body = body.is_some();
        let mut redirects = Vec::new();

        loop {
            let response = self.send(&hop, options.send_timeout, body.take()).await?;
            let status = response.status().as_u16();

            if !self.options.follow_redirects || !is_redirect(status) {
                return Ok(self.envelope(response, redirects));
            }
            let Some(location) = response.headers().get(LOCATION).and_then(|v| v.to_str().ok())
            else {
                return Ok(self.envelope(response, redirects));
            };

            let (next_method, resend_body) = redirect_method(status, &hop.method);
            if resend_body && had_body {
                warn!(status, "redirect requires resending a streamed body, not following");
                return Ok(self.envelope(response, redirects));
            }
            if redirects.len() >= self.options.max_redirects {
                return Err(Error::transport(format!(
                    "redirect limit of {} exceeded",
                    self.options.max_redirects
                )));
            }

            let next = hop
                .url
                .join(location)
                .map_err(|e| Error::InvalidRequest(e.to_string()))?;
            let cross_origin = next.origin() != hop.url.origin();
            strip_redirect_headers(&mut hop.headers, cross_origin, !resend_body);
            if !resend_body {
                hop.content_type = None;
            }
            debug!(
                status,
                from = %hop.url,
                to = %next,
                method = %next_method,
                cross_origin,
                "following redirect"
            );
            redirects.push(RedirectRecord::new(next.as_str(), status, next_method.as_str()));
            hop.url = next;
            hop.method = next_method;
        }
    }

    fn envelope(&self, response: reqwest::Response, redirects: Vec<RedirectRecord>) -> ResponseBody {
        let status = response.status();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.add(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        let final_url = response.url().to_string();
        let version = format!("{:?}", response.version());

        let body = response.bytes_stream().map_err(Error::transport);
        let stream = guard_body(Box::pin(body), self.shutdown.clone(), self.tracker.token());

        let mut envelope = ResponseBody::new(stream, status.as_u16())
            .with_headers(headers)
            .with_extra("url", final_url.into())
            .with_extra("version", version.into());
        envelope.status_message = status.canonical_reason().map(str::to_string);
        for record in redirects {
            envelope = envelope.with_redirect(record);
        }
        envelope
    }
}

/// Fail the body with a cancellation once the adapter is force-closed, and
/// keep the adapter's graceful close waiting until the body is done.
fn guard_body(body: ByteStream, shutdown: CancellationToken, token: TaskTrackerToken) -> ByteStream {
    Box::pin(stream::unfold(
        Some((body, shutdown, token)),
        |state| async move {
            let (mut body, shutdown, token) = state?;
            let next = tokio::select! {
                biased;
                () = shutdown.cancelled() => None,
                item = body.next() => Some(item),
            };
            match next {
                None => Some((Err(Error::Cancelled("adapter closed".into())), None)),
                Some(None) => None,
                Some(Some(item)) => Some((item, Some((body, shutdown, token)))),
            }
        },
    ))
}

impl HttpClientAdapter for ReqwestAdapter {
    async fn fetch(
        &self,
        options: &RequestOptions,
        request_body: Option<ByteStream>,
        cancel: Option<CancelToken>,
    ) -> Result<ResponseBody> {
        if self.tracker.is_closed() {
            return Err(Error::AdapterClosed);
        }
        let _token = self.tracker.token();

        let cancelled = async {
            match cancel {
                Some(ref token) => token.cancelled().await,
                None => pending::<String>().await,
            }
        };

        tokio::select! {
            biased;
            reason = cancelled => Err(Error::Cancelled(reason)),
            () = self.shutdown.cancelled() => Err(Error::Cancelled("adapter closed".into())),
            result = self.execute(options, request_body) => result,
        }
    }

    async fn close(&self, force: bool) {
        self.tracker.close();
        if force {
            self.shutdown.cancel();
        } else {
            self.tracker.wait().await;
        }
        debug!(force, "reqwest adapter closed");
    }
}
