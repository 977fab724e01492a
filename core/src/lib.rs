//! Typed REST collections over asynchronous HTTP.
//!
//! # Overview
//! Declare a model (a serde type plus its field schema) and bind it to a
//! base URL as a `Collection`; then list, query, fetch, create, update and
//! delete resources without writing URL construction, JSON encoding or
//! status handling by hand.
//!
//! ```no_run
//! use restmodel_core::{Collection, Field, FieldKind, Model, Tracked, UreqTransport};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct User {
//!     id: Option<u64>,
//!     name: Option<String>,
//! }
//!
//! impl Model for User {
//!     const COLLECTION: &'static str = "users";
//!     const FIELDS: &'static [Field] = &[
//!         Field::new("id", FieldKind::Integer).primary(),
//!         Field::new("name", FieldKind::String),
//!     ];
//! }
//!
//! # async fn run() -> Result<(), restmodel_core::ApiError> {
//! let users: Collection<User, _> = Collection::new("http://localhost:3000/users", UreqTransport::new());
//! let created = users.add(Tracked::new(User { id: None, name: Some("Foo".into()) })).await?;
//! let everyone = users.all().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - Host-does-IO core: every operation is a `build_*` method producing an
//!   `HttpRequest` and a `parse_*` method consuming an `HttpResponse`. The
//!   async operations join the two through a `Transport`.
//! - `Collection` and `Session` are stateless apart from their bindings and
//!   are safe to share across concurrent operations.
//! - The persisted flag lives in `Tracked<M>`, never in the model's schema.
//! - Optional behavior (URL override, codecs, Location id parsing) is an
//!   explicit `ModelHooks` value rather than something detected at runtime.

pub mod collection;
mod completion;
pub mod error;
pub mod http;
mod interpret;
pub mod model;
pub mod request;
pub mod session;
pub mod transport;
pub mod url;

pub use collection::Collection;
pub use error::{ApiError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interpret::{http_error, ErrorHook};
pub use model::{DecodeFn, EncodeFn, EncodedBody, Field, FieldKind, IdParserFn, Model, ModelHooks, ResourceUrl, Tracked};
pub use session::Session;
pub use transport::{Transport, UreqTransport};
