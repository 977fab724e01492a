//! Typed REST collection: request building, response parsing and the
//! asynchronous operations composed from them.
//!
//! # Design
//! `Collection` holds only its bindings (base URL, shared transport and the
//! optional hooks) and carries no mutable state between calls, so one
//! instance serves any number of concurrent operations. Each operation is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`; the async operation is
//! the two joined by one `Transport::fetch`. The `*_with` variants deliver the
//! same outcome to a completion callback instead.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::completion::{dispatch, report, spawn_completion};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::interpret::{self, http_error, ErrorHook};
use crate::model::{DecodeFn, Model, Tracked};
use crate::request;
use crate::transport::Transport;
use crate::url;

/// A collection of `M` resources living at `base_url`.
pub struct Collection<M, T> {
    base_url: String,
    transport: Arc<T>,
    decode: Option<DecodeFn>,
    on_error: ErrorHook,
    _model: PhantomData<fn() -> M>,
}

impl<M, T> Clone for Collection<M, T> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            transport: Arc::clone(&self.transport),
            decode: self.decode,
            on_error: self.on_error,
            _model: PhantomData,
        }
    }
}

impl<M, T> fmt::Debug for Collection<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("base_url", &self.base_url)
            .field("decode", &self.decode.is_some())
            .finish_non_exhaustive()
    }
}

impl<M: Model, T: Transport> Collection<M, T> {
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        Self::from_shared(base_url, Arc::new(transport))
    }

    /// Bind to a transport shared with other collections or sessions.
    pub fn from_shared(base_url: impl Into<String>, transport: Arc<T>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            decode: None,
            on_error: http_error,
            _model: PhantomData,
        }
    }

    /// Decode list responses with `decode` instead of plain JSON, e.g. to
    /// unwrap an envelope object around the array.
    pub fn with_decode(mut self, decode: DecodeFn) -> Self {
        self.decode = Some(decode);
        self
    }

    /// Build errors for 4xx/5xx responses with `hook`.
    pub fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.on_error = hook;
        self
    }

    pub fn collection_url(&self) -> &str {
        &self.base_url
    }

    pub fn resource_url(&self, id: &str) -> String {
        url::resource_url::<M>(&self.base_url, id)
    }

    pub fn build_all(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.base_url.as_str())
    }

    pub fn build_query(&self, params: &[(&str, &str)]) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, url::with_query(&self.base_url, params))
    }

    pub fn build_get(&self, id: impl fmt::Display) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.resource_url(&id.to_string()))
    }

    pub fn build_add(&self, obj: &Tracked<M>) -> Result<HttpRequest, ApiError> {
        request::add_request(obj, &self.base_url, |id| self.resource_url(id))
    }

    pub fn build_delete(&self, obj: &Tracked<M>) -> Result<HttpRequest, ApiError> {
        request::delete_request(obj, |id| self.resource_url(id))
    }

    /// Parse a list response from `all` or `query`.
    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<Tracked<M>>, ApiError> {
        interpret::check_status(&response, self.on_error)?;
        let payload = interpret::decode_body(&response, self.decode)?;
        interpret::into_sequence(payload)
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<Tracked<M>, ApiError> {
        interpret::interpret_get(&response, self.on_error)
    }

    pub fn parse_add(&self, obj: Tracked<M>, response: HttpResponse) -> Result<Tracked<M>, ApiError> {
        interpret::interpret_add(obj, &response, self.on_error)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        interpret::check_status(&response, self.on_error)
    }

    /// Fetch every resource in the collection.
    pub async fn all(&self) -> Result<Vec<Tracked<M>>, ApiError> {
        report("all", self.run_list(self.build_all()).await)
    }

    /// Fetch the collection filtered by query parameters.
    pub async fn query(&self, params: &[(&str, &str)]) -> Result<Vec<Tracked<M>>, ApiError> {
        report("query", self.run_list(self.build_query(params)).await)
    }

    pub async fn get(&self, id: impl fmt::Display) -> Result<Tracked<M>, ApiError> {
        let request = self.build_get(id);
        report("get", self.run_get(request).await)
    }

    /// Create `obj` (POST) or, if it is already persisted, update it (PUT).
    pub async fn add(&self, obj: Tracked<M>) -> Result<Tracked<M>, ApiError> {
        report("add", self.run_add(obj).await)
    }

    pub async fn delete(&self, obj: &Tracked<M>) -> Result<(), ApiError> {
        let request = self.build_delete(obj);
        report("delete", self.run_delete(request).await)
    }

    /// Like [`all`](Self::all), delivering the outcome to `callback`.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn all_with<C>(&self, callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<Vec<Tracked<M>>, ApiError>) + Send + 'static,
    {
        let request = self.build_all();
        self.list_with("all", request, callback)
    }

    /// Like [`query`](Self::query), delivering the outcome to `callback`.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn query_with<C>(&self, params: &[(&str, &str)], callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<Vec<Tracked<M>>, ApiError>) + Send + 'static,
    {
        let request = self.build_query(params);
        self.list_with("query", request, callback)
    }

    /// Like [`get`](Self::get), delivering the outcome to `callback`.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn get_with<C>(&self, id: impl fmt::Display, callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<Tracked<M>, ApiError>) + Send + 'static,
    {
        let this = self.clone();
        let request = self.build_get(id);
        spawn_completion(async move { report("get", this.run_get(request).await) }, callback)
    }

    /// Like [`add`](Self::add), delivering the outcome to `callback`.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn add_with<C>(&self, obj: Tracked<M>, callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<Tracked<M>, ApiError>) + Send + 'static,
    {
        let this = self.clone();
        spawn_completion(async move { this.add(obj).await }, callback)
    }

    /// Like [`delete`](Self::delete), delivering the outcome to `callback`.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn delete_with<C>(&self, obj: &Tracked<M>, callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<(), ApiError>) + Send + 'static,
    {
        let this = self.clone();
        let request = self.build_delete(obj);
        spawn_completion(async move { report("delete", this.run_delete(request).await) }, callback)
    }

    fn list_with<C>(&self, operation: &'static str, request: HttpRequest, callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<Vec<Tracked<M>>, ApiError>) + Send + 'static,
    {
        let this = self.clone();
        spawn_completion(async move { report(operation, this.run_list(request).await) }, callback)
    }

    async fn run_list(&self, request: HttpRequest) -> Result<Vec<Tracked<M>>, ApiError> {
        let response = dispatch(&*self.transport, request).await?;
        self.parse_list(response)
    }

    async fn run_get(&self, request: HttpRequest) -> Result<Tracked<M>, ApiError> {
        let response = dispatch(&*self.transport, request).await?;
        self.parse_get(response)
    }

    async fn run_add(&self, obj: Tracked<M>) -> Result<Tracked<M>, ApiError> {
        let request = self.build_add(&obj)?;
        let response = dispatch(&*self.transport, request).await?;
        self.parse_add(obj, response)
    }

    async fn run_delete(&self, request: Result<HttpRequest, ApiError>) -> Result<(), ApiError> {
        let response = dispatch(&*self.transport, request?).await?;
        self.parse_delete(response)
    }
}
