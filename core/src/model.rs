//! Model schema seam: static field descriptors, validated construction and
//! the persisted-state envelope.
//!
//! # Design
//! A model is an ordinary serde type that also declares its field set in
//! `Model::FIELDS`. Incoming payloads are checked against that allow-list
//! before serde ever sees them, so an undeclared key surfaces as
//! `ValidationError::UnknownField` instead of being silently dropped.
//! Updates are merged into a serialized copy of the instance and
//! deserialized back in one step; a failed update leaves the instance as it
//! was.
//!
//! Optional per-model behavior (URL override, custom codec, Location id
//! parser) is declared through `ModelHooks`, a struct of optional function
//! pointers returned by `Model::hooks`.

use std::any::type_name;
use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, ValidationError};
use crate::http::HttpResponse;

/// Semantic type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    String,
    Boolean,
    Any,
}

/// One entry of a model's static schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub primary: bool,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            primary: false,
        }
    }

    /// Mark this field as the model's identity key.
    pub const fn primary(self) -> Self {
        Self {
            primary: true,
            ..self
        }
    }

    /// Convert a raw identifier taken from a URL into a value of this
    /// field's kind. Text that does not parse stays a string.
    pub fn coerce(&self, raw: &str) -> Value {
        match self.kind {
            FieldKind::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| raw.parse::<u64>().map(Value::from))
                .unwrap_or_else(|_| Value::from(raw)),
            FieldKind::Float => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::from(raw)),
            FieldKind::Boolean => raw.parse::<bool>().map(Value::from).unwrap_or_else(|_| Value::from(raw)),
            FieldKind::String | FieldKind::Any => Value::from(raw),
        }
    }
}

/// Per-model override of the resource URL.
#[derive(Clone, Copy)]
pub enum ResourceUrl {
    /// A base URL, possibly carrying a query string; the id is appended to
    /// its path.
    Static(&'static str),
    /// Full control: the function receives the id and its result is used
    /// verbatim.
    Resolve(fn(&str) -> String),
}

impl fmt::Debug for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceUrl::Static(url) => f.debug_tuple("Static").field(url).finish(),
            ResourceUrl::Resolve(_) => f.write_str("Resolve(..)"),
        }
    }
}

/// A request body produced by a custom encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub body: String,
    pub content_type: String,
}

pub type EncodeFn<M> = fn(&M) -> Result<EncodedBody, ApiError>;

/// Turns a raw response into the payload the interpreter validates.
pub type DecodeFn = fn(&HttpResponse) -> Result<Value, ApiError>;

/// Extracts a primary key from a `Location` header value.
pub type IdParserFn = fn(&str) -> Option<String>;

/// Optional capabilities a model may supply. Every member left `None` falls
/// back to the default behavior.
pub struct ModelHooks<M> {
    pub url: Option<ResourceUrl>,
    pub encode: Option<EncodeFn<M>>,
    pub decode: Option<DecodeFn>,
    pub parse_id: Option<IdParserFn>,
}

impl<M> Default for ModelHooks<M> {
    fn default() -> Self {
        Self {
            url: None,
            encode: None,
            decode: None,
            parse_id: None,
        }
    }
}

impl<M> Clone for ModelHooks<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for ModelHooks<M> {}

impl<M> fmt::Debug for ModelHooks<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHooks")
            .field("url", &self.url)
            .field("encode", &self.encode.is_some())
            .field("decode", &self.decode.is_some())
            .field("parse_id", &self.parse_id.is_some())
            .finish()
    }
}

/// A typed record mapped onto a REST resource.
///
/// Implementors declare their schema in `FIELDS`; the provided methods
/// enforce it. Fields are usually `Option`s so an empty instance
/// (`Default`) can be filled from a partial payload.
pub trait Model: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Path segment used by `Session` to address this model's resources.
    const COLLECTION: &'static str;

    const FIELDS: &'static [Field];

    fn hooks() -> ModelHooks<Self> {
        ModelHooks::default()
    }

    fn field(name: &str) -> Option<&'static Field> {
        Self::FIELDS.iter().find(|field| field.name == name)
    }

    fn primary_field() -> Option<&'static Field> {
        Self::FIELDS.iter().find(|field| field.primary)
    }

    /// Build an instance from raw keyed data, rejecting undeclared keys.
    fn construct(raw: Value) -> Result<Self, ValidationError> {
        let mut model = Self::default();
        model.update_from(raw)?;
        Ok(model)
    }

    /// Apply raw keyed data onto this instance. Either every key is applied
    /// or, on error, none is.
    fn update_from(&mut self, raw: Value) -> Result<(), ValidationError> {
        let incoming = expect_object::<Self>(raw)?;
        if let Some(unknown) = incoming.keys().find(|key| Self::field(key).is_none()) {
            return Err(ValidationError::UnknownField {
                model: model_name::<Self>(),
                field: unknown.clone(),
            });
        }

        let mut merged = serialize_fields(&*self)?;
        merged.extend(incoming);
        *self = serde_json::from_value(Value::Object(merged)).map_err(invalid_value::<Self>)?;
        Ok(())
    }

    /// Every declared field with its current value; unset fields are `null`.
    fn field_values(&self) -> Result<Map<String, Value>, ValidationError> {
        let mut current = serialize_fields(self)?;
        Ok(Self::FIELDS
            .iter()
            .map(|field| {
                let value = current.remove(field.name).unwrap_or(Value::Null);
                (field.name.to_string(), value)
            })
            .collect())
    }

    /// The primary key rendered as a URL path segment, if the model declares
    /// one and it is set.
    fn primary_key(&self) -> Result<Option<String>, ValidationError> {
        let Some(field) = Self::primary_field() else {
            return Ok(None);
        };
        let values = self.field_values()?;
        Ok(values.get(field.name).and_then(path_segment))
    }
}

/// A model instance plus whether its state is known to match the server.
///
/// Only the collection layer flips `persisted` to true, after a successful
/// round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tracked<M> {
    model: M,
    persisted: bool,
}

impl<M> Tracked<M> {
    /// Wrap a locally built instance that the server has not seen yet.
    pub fn new(model: M) -> Self {
        Self {
            model,
            persisted: false,
        }
    }

    /// Wrap an instance known to exist on the server, e.g. one loaded
    /// through another channel. `add` will update it with PUT.
    pub fn persisted(model: M) -> Self {
        Self {
            model,
            persisted: true,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_inner(self) -> M {
        self.model
    }
}

impl<M> From<M> for Tracked<M> {
    fn from(model: M) -> Self {
        Self::new(model)
    }
}

impl<M> Deref for Tracked<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.model
    }
}

impl<M> DerefMut for Tracked<M> {
    fn deref_mut(&mut self) -> &mut M {
        &mut self.model
    }
}

/// Short type name used in error messages.
pub(crate) fn model_name<M>() -> &'static str {
    let full = type_name::<M>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Human-readable JSON type, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn expect_object<M>(value: Value) -> Result<Map<String, Value>, ValidationError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ValidationError::NotAnObject {
            model: model_name::<M>(),
            found: json_kind(&other),
        }),
    }
}

fn serialize_fields<M: Serialize>(model: &M) -> Result<Map<String, Value>, ValidationError> {
    let value = serde_json::to_value(model).map_err(invalid_value::<M>)?;
    expect_object::<M>(value)
}

fn invalid_value<M>(err: serde_json::Error) -> ValidationError {
    ValidationError::InvalidValue {
        model: model_name::<M>(),
        message: err.to_string(),
    }
}

fn path_segment(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
