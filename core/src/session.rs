//! Lightweight single-resource facade.
//!
//! A `Session` addresses any model through `{endpoint}/{M::COLLECTION}` and
//! supports only get and add. It interprets responses exactly like
//! `Collection` does for single resources.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::completion::{dispatch, report, spawn_completion};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::interpret::{self, http_error};
use crate::model::{Model, Tracked};
use crate::request;
use crate::transport::Transport;

pub struct Session<T> {
    endpoint: String,
    transport: Arc<T>,
}

impl<T> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Session<T> {
    pub fn new(endpoint: impl Into<String>, transport: T) -> Self {
        Self::from_shared(endpoint, Arc::new(transport))
    }

    pub fn from_shared(endpoint: impl Into<String>, transport: Arc<T>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    /// `{endpoint}/{collection}`, or `{endpoint}/{collection}/{id}`.
    pub fn url<M: Model>(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/{}/{id}", self.endpoint, M::COLLECTION),
            None => format!("{}/{}", self.endpoint, M::COLLECTION),
        }
    }

    pub fn build_get<M: Model>(&self, id: impl fmt::Display) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.url::<M>(Some(&id.to_string())))
    }

    pub fn build_add<M: Model>(&self, obj: &Tracked<M>) -> Result<HttpRequest, ApiError> {
        request::add_request(obj, &self.url::<M>(None), |id| self.url::<M>(Some(id)))
    }

    pub fn parse_get<M: Model>(&self, response: HttpResponse) -> Result<Tracked<M>, ApiError> {
        interpret::interpret_get(&response, http_error)
    }

    pub fn parse_add<M: Model>(&self, obj: Tracked<M>, response: HttpResponse) -> Result<Tracked<M>, ApiError> {
        interpret::interpret_add(obj, &response, http_error)
    }

    pub async fn get<M: Model>(&self, id: impl fmt::Display) -> Result<Tracked<M>, ApiError> {
        let request = self.build_get::<M>(id);
        report("session get", self.run_get(request).await)
    }

    pub async fn add<M: Model>(&self, obj: Tracked<M>) -> Result<Tracked<M>, ApiError> {
        report("session add", self.run_add(obj).await)
    }

    /// Like [`get`](Self::get), delivering the outcome to `callback`.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn get_with<M, C>(&self, id: impl fmt::Display, callback: C) -> JoinHandle<()>
    where
        M: Model,
        C: FnOnce(Result<Tracked<M>, ApiError>) + Send + 'static,
    {
        let this = self.clone();
        let request = self.build_get::<M>(id);
        spawn_completion(async move { report("session get", this.run_get(request).await) }, callback)
    }

    /// Like [`add`](Self::add), delivering the outcome to `callback`.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn add_with<M, C>(&self, obj: Tracked<M>, callback: C) -> JoinHandle<()>
    where
        M: Model,
        C: FnOnce(Result<Tracked<M>, ApiError>) + Send + 'static,
    {
        let this = self.clone();
        spawn_completion(async move { this.add(obj).await }, callback)
    }

    async fn run_get<M: Model>(&self, request: HttpRequest) -> Result<Tracked<M>, ApiError> {
        let response = dispatch(&*self.transport, request).await?;
        self.parse_get(response)
    }

    async fn run_add<M: Model>(&self, obj: Tracked<M>) -> Result<Tracked<M>, ApiError> {
        let request = self.build_add(&obj)?;
        let response = dispatch(&*self.transport, request).await?;
        self.parse_add(obj, response)
    }
}
