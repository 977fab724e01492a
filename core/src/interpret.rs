//! Response interpretation: status classification, payload decoding and
//! schema validation.
//!
//! # Design
//! Each step is a small function returning `Result<_, ApiError>` so the
//! `parse_*` methods of `Collection` and `Session` read as a straight `?`
//! chain. Status is checked before the body is looked at; list payloads are
//! validated as a whole batch, so one bad element discards every element.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpResponse, LOCATION};
use crate::model::{json_kind, model_name, DecodeFn, Model, Tracked};

/// Builds the error for a response in the 4xx/5xx range.
pub type ErrorHook = fn(&HttpResponse) -> ApiError;

/// Default error hook: keep the status and the body as text.
pub fn http_error(response: &HttpResponse) -> ApiError {
    ApiError::Http {
        status: response.status,
        body: response.text().into_owned(),
    }
}

/// Fail with the hook's error if the status is in the error range.
pub(crate) fn check_status(response: &HttpResponse, on_error: ErrorHook) -> Result<(), ApiError> {
    if response.is_error() {
        return Err(on_error(response));
    }
    Ok(())
}

/// Run the decode hook if one is installed, otherwise parse the body as
/// JSON. Bytes that are not UTF-8 fail here, as a decode error.
pub(crate) fn decode_body(response: &HttpResponse, hook: Option<DecodeFn>) -> Result<Value, ApiError> {
    match hook {
        Some(decode) => decode(response),
        None => serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string())),
    }
}

/// Build one persisted instance per array element. The first invalid
/// element aborts the batch.
pub(crate) fn into_sequence<M: Model>(payload: Value) -> Result<Vec<Tracked<M>>, ApiError> {
    let Value::Array(items) = payload else {
        return Err(ApiError::ExpectedArray {
            found: json_kind(&payload),
        });
    };
    items
        .into_iter()
        .map(|raw| M::construct(raw).map(Tracked::persisted).map_err(ApiError::from))
        .collect()
}

/// Apply a decoded payload onto `target` and mark it persisted.
pub(crate) fn apply_single<M: Model>(mut target: Tracked<M>, payload: Value) -> Result<Tracked<M>, ApiError> {
    target.update_from(payload)?;
    target.mark_persisted();
    Ok(target)
}

/// Handle a successful creation that carried no body: the new identity, if
/// any, comes from the `Location` header.
pub(crate) fn apply_location<M: Model>(mut target: Tracked<M>, response: &HttpResponse) -> Result<Tracked<M>, ApiError> {
    if let Some(location) = response.header(LOCATION) {
        let parsed = match M::hooks().parse_id {
            Some(parse_id) => parse_id(location),
            None => trailing_segment(location),
        };
        match (parsed, M::primary_field()) {
            (Some(id), Some(field)) => {
                let mut payload = serde_json::Map::new();
                payload.insert(field.name.to_string(), field.coerce(&id));
                target.update_from(Value::Object(payload))?;
            }
            (Some(_), None) => {
                tracing::debug!(model = model_name::<M>(), "ignoring Location header, model has no primary field");
            }
            (None, _) => {
                tracing::debug!(location, "no identity found in Location header");
            }
        }
    }
    target.mark_persisted();
    Ok(target)
}

/// Interpret the response to an add: either the echoed resource or an empty
/// body pointing at it.
pub(crate) fn interpret_add<M: Model>(target: Tracked<M>, response: &HttpResponse, on_error: ErrorHook) -> Result<Tracked<M>, ApiError> {
    check_status(response, on_error)?;
    if response.is_empty() {
        return apply_location(target, response);
    }
    let payload = decode_body(response, M::hooks().decode)?;
    apply_single(target, payload)
}

/// Interpret the response to a get into a fresh instance.
pub(crate) fn interpret_get<M: Model>(response: &HttpResponse, on_error: ErrorHook) -> Result<Tracked<M>, ApiError> {
    check_status(response, on_error)?;
    let payload = decode_body(response, M::hooks().decode)?;
    apply_single(Tracked::new(M::default()), payload)
}

/// Last non-empty path segment of a URL, ignoring query and fragment.
fn trailing_segment(location: &str) -> Option<String> {
    let path = location.split(['?', '#']).next().unwrap_or(location);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
