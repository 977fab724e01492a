//! The transport seam between the pipeline and the network.
//!
//! # Design
//! `Transport` is the only place I/O happens. The pipeline hands it an
//! `HttpRequest` and gets back an `HttpResponse`; 4xx/5xx responses are data,
//! not transport errors, so status interpretation stays in the interpreter.
//! `UreqTransport` runs ureq's blocking agent on tokio's blocking pool, which
//! keeps the async caller's thread free while the request is in flight.

use std::future::Future;
use std::sync::Arc;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP request and completes once with its response.
pub trait Transport: Send + Sync + 'static {
    fn fetch(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn fetch(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send {
        (**self).fetch(request)
    }
}

/// Transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// An agent that reports 4xx/5xx responses as data rather than `Err`.
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self::with_agent(agent)
    }

    /// Use a caller-configured agent. It must have `http_status_as_error`
    /// disabled, otherwise error statuses surface as `ApiError::Transport`.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?
    }
}

/// Execute an `HttpRequest` with ureq and collect the response as data.
fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;

    let result = match method {
        HttpMethod::Get => with_headers(agent.get(&url), &headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(&url), &headers).call(),
        HttpMethod::Post => send(with_headers(agent.post(&url), &headers), body),
        HttpMethod::Put => send(with_headers(agent.put(&url), &headers), body),
    };
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect();
    // Raw bytes with no size cap; text and JSON checks belong to interpretation.
    let body = response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_vec()
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    Ok(HttpResponse { status, headers, body })
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
