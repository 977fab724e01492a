//! Single-shot completion for callback-style callers.
//!
//! Every `*_with` operation runs its future on the tokio runtime and hands
//! the outcome to a `FnOnce` callback, so the callback fires exactly once
//! with exactly one of a result or an error. Completions fire in the order
//! the underlying requests finish, not the order they were issued.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Spawn `operation` and deliver its outcome to `callback`.
///
/// Must be called from within a tokio runtime.
pub(crate) fn spawn_completion<R, F, C>(operation: F, callback: C) -> JoinHandle<()>
where
    R: Send + 'static,
    F: Future<Output = Result<R, ApiError>> + Send + 'static,
    C: FnOnce(Result<R, ApiError>) + Send + 'static,
{
    tokio::spawn(async move { callback(operation.await) })
}

/// Hand `request` to the transport, logging both ends of the exchange.
pub(crate) async fn dispatch<T: Transport>(transport: &T, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    tracing::debug!(method = %request.method, url = %request.url, "dispatching request");
    let response = transport.fetch(request).await?;
    tracing::debug!(status = response.status, "response received");
    Ok(response)
}

/// Log a failed operation before passing its outcome on.
pub(crate) fn report<R>(operation: &'static str, outcome: Result<R, ApiError>) -> Result<R, ApiError> {
    if let Err(err) = &outcome {
        warn!(operation, error = %err, "operation failed");
    }
    outcome
}
