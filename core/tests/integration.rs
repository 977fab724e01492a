//! Full lifecycle test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every collection
//! and session operation over real HTTP through `UreqTransport`. Validates
//! that request building, transport and response interpretation work
//! end-to-end with an actual server.

use std::sync::Arc;

use restmodel_core::{ApiError, Collection, Field, FieldKind, HttpResponse, Model, Session, Tracked, UreqTransport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct User {
    id: Option<u64>,
    name: Option<String>,
    email: Option<String>,
}

impl Model for User {
    const COLLECTION: &'static str = "users";
    const FIELDS: &'static [Field] = &[
        Field::new("id", FieldKind::Integer).primary(),
        Field::new("name", FieldKind::String),
        Field::new("email", FieldKind::String),
    ];
}

/// `/wrapped-users` nests the list under a `users` key.
fn unwrap_users(response: &HttpResponse) -> Result<Value, ApiError> {
    let mut envelope: Value = serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(envelope["users"].take())
}

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

fn new_user(name: &str, email: Option<&str>) -> Tracked<User> {
    Tracked::new(User {
        id: None,
        name: Some(name.to_string()),
        email: email.map(str::to_string),
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn collection_lifecycle() {
    let endpoint = start_server().await;
    let transport = Arc::new(UreqTransport::new());
    let users: Collection<User, UreqTransport> = Collection::from_shared(format!("{endpoint}/users"), Arc::clone(&transport));

    // Step 1: list, should be empty.
    assert!(users.all().await.unwrap().is_empty(), "expected empty list");

    // Step 2: create; the server echoes the resource with its new id.
    let foo = users.add(new_user("Foo", Some("foo@example.com"))).await.unwrap();
    assert!(foo.is_persisted());
    assert_eq!(foo.id, Some(1));
    assert_eq!(foo.email.as_deref(), Some("foo@example.com"));

    // Step 3: create through the variant that answers with a Location header.
    let located: Collection<User, UreqTransport> = Collection::from_shared(format!("{endpoint}/located-users"), Arc::clone(&transport));
    let bar = located.add(new_user("Bar", None)).await.unwrap();
    assert!(bar.is_persisted());
    assert_eq!(bar.id, Some(2));
    assert_eq!(bar.name.as_deref(), Some("Bar"));

    // Step 4: get.
    let fetched = users.get(1).await.unwrap();
    assert_eq!(fetched.model(), foo.model());

    // Step 5: query.
    let matching = users.query(&[("name", "Bar")]).await.unwrap();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].id, Some(2));

    // Step 6: update a persisted object with PUT.
    let mut foo = foo;
    foo.name = Some("Foo Bar".to_string());
    let foo = users.add(foo).await.unwrap();
    assert_eq!(foo.name.as_deref(), Some("Foo Bar"));
    assert_eq!(users.get(1).await.unwrap().name.as_deref(), Some("Foo Bar"));

    // Step 7: wrapped list needs a decode hook.
    let wrapped: Collection<User, UreqTransport> = Collection::from_shared(format!("{endpoint}/wrapped-users"), Arc::clone(&transport));
    let err = wrapped.all().await.unwrap_err();
    assert!(matches!(err, ApiError::ExpectedArray { .. }));
    let everyone = wrapped.with_decode(unwrap_users).all().await.unwrap();
    assert_eq!(everyone.len(), 2);

    // Step 8: delete.
    users.delete(&foo).await.unwrap();

    // Step 9: get after delete, should be not found.
    let err = users.get(1).await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");

    // Step 10: delete again, also not found.
    let err = users.delete(&foo).await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    // Step 11: one user left.
    assert_eq!(users.all().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn callbacks_fire_once_per_operation() {
    let endpoint = start_server().await;
    let users: Collection<User, UreqTransport> = Collection::new(format!("{endpoint}/users"), UreqTransport::new());

    let (tx, rx) = oneshot::channel();
    users.add_with(new_user("Foo", None), move |result| {
        let _ = tx.send(result);
    });
    let created = rx.await.unwrap().unwrap();
    assert_eq!(created.id, Some(1));

    let (tx, rx) = oneshot::channel();
    users.all_with(move |result| {
        let _ = tx.send(result);
    });
    assert_eq!(rx.await.unwrap().unwrap().len(), 1);

    let (tx, rx) = oneshot::channel();
    users.get_with(42, move |result| {
        let _ = tx.send(result);
    });
    assert!(rx.await.unwrap().unwrap_err().is_not_found());
}

#[tokio::test(flavor = "multi_thread")]
async fn session_get_and_add() {
    let endpoint = start_server().await;
    let session = Session::new(endpoint, UreqTransport::new());

    let created = session.add(new_user("Jack", Some("jack@example.com"))).await.unwrap();
    assert_eq!(created.id, Some(1));

    let fetched: Tracked<User> = session.get(1).await.unwrap();
    assert_eq!(fetched.email.as_deref(), Some("jack@example.com"));

    let err = session.get::<User>(2).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 404 Not Found");
}

#[tokio::test(flavor = "multi_thread")]
async fn error_status_survives_undecodable_body() {
    let endpoint = start_server().await;

    let garbled: Collection<User, UreqTransport> = Collection::new(format!("{endpoint}/garbled-error"), UreqTransport::new());
    let err = garbled.all().await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 500, .. }), "unexpected error: {err}");

    let oversized: Collection<User, UreqTransport> = Collection::new(format!("{endpoint}/oversized-error"), UreqTransport::new());
    let err = oversized.all().await.unwrap_err();
    assert_eq!(err.status(), Some(503), "unexpected error: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn non_utf8_list_is_a_decode_error() {
    let endpoint = start_server().await;
    let users: Collection<User, UreqTransport> = Collection::new(format!("{endpoint}/garbled-users"), UreqTransport::new());
    let err = users.all().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "unexpected error: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let users: Collection<User, UreqTransport> = Collection::new(format!("http://{addr}/users"), UreqTransport::new());
    let err = users.all().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "unexpected error: {err}");
}
