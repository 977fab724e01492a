//! Request construction shared by `Collection` and `Session`.
//!
//! Builders only read the object they are given; the persisted flag and the
//! model's fields change later, when the response is interpreted.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, JSON_CONTENT_TYPE};
use crate::model::{model_name, EncodedBody, Model, Tracked};

/// Encode `model` with its encode hook, or as JSON of every declared field.
pub fn encode_body<M: Model>(model: &M) -> Result<EncodedBody, ApiError> {
    if let Some(encode) = M::hooks().encode {
        return encode(model);
    }
    let fields = model.field_values()?;
    let body = serde_json::to_string(&Value::Object(fields)).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok(EncodedBody {
        body,
        content_type: JSON_CONTENT_TYPE.to_string(),
    })
}

/// The primary key of `model`, required to address it on the server.
pub(crate) fn identity<M: Model>(model: &M) -> Result<String, ApiError> {
    model.primary_key()?.ok_or(ApiError::MissingIdentity {
        model: model_name::<M>(),
    })
}

/// POST to `collection_url` for new objects, PUT to the resource for
/// persisted ones.
pub(crate) fn add_request<M: Model>(
    obj: &Tracked<M>,
    collection_url: &str,
    resource_url: impl FnOnce(&str) -> String,
) -> Result<HttpRequest, ApiError> {
    let (method, url) = if obj.is_persisted() {
        (HttpMethod::Put, resource_url(&identity(obj.model())?))
    } else {
        (HttpMethod::Post, collection_url.to_string())
    };
    let encoded = encode_body(obj.model())?;
    Ok(HttpRequest::new(method, url).with_body(encoded.body, encoded.content_type))
}

pub(crate) fn delete_request<M: Model>(
    obj: &Tracked<M>,
    resource_url: impl FnOnce(&str) -> String,
) -> Result<HttpRequest, ApiError> {
    if !obj.is_persisted() {
        tracing::debug!(model = model_name::<M>(), "deleting an object that was never persisted");
    }
    let url = resource_url(&identity(obj.model())?);
    Ok(HttpRequest::new(HttpMethod::Delete, url))
}
