//! Collection and resource URL resolution.
//!
//! A resource URL is the base URL with `/{id}` appended to its path. Any
//! query string on the base is carried over after the id, so
//! `/users?type=json` addresses `/users/1?type=json`.

use crate::model::{Model, ResourceUrl};

/// Split `url` at its last `?`. An empty query is reported as absent.
pub fn split_query(url: &str) -> (&str, Option<&str>) {
    match url.rsplit_once('?') {
        Some((path, query)) if query.is_empty() => (path, None),
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}

/// Append `/{id}` to the path of `url`, keeping its query string.
pub fn append_id(url: &str, id: &str) -> String {
    let (path, query) = split_query(url);
    match query {
        Some(query) => format!("{path}/{id}?{query}"),
        None => format!("{path}/{id}"),
    }
}

/// Append form-urlencoded `params` to `url`, after any query it already
/// carries.
pub fn with_query(url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().copied())
        .finish();
    let (path, query) = split_query(url);
    match query {
        Some(query) => format!("{path}?{query}&{encoded}"),
        None => format!("{path}?{encoded}"),
    }
}

/// Address of the resource `id` of model `M` inside the collection at
/// `base_url`, honoring the model's URL hook.
pub fn resource_url<M: Model>(base_url: &str, id: &str) -> String {
    match M::hooks().url {
        Some(ResourceUrl::Resolve(resolve)) => resolve(id),
        Some(ResourceUrl::Static(url)) => append_id(url, id),
        None => append_id(base_url, id),
    }
}
