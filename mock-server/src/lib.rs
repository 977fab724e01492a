//! In-memory `users` REST resource for exercising the client end to end.
//!
//! Besides the plain collection at `/users`, two variants cover the less
//! common server behaviors a client must handle: `/located-users` answers a
//! creation with an empty body and a `Location` header, and `/wrapped-users`
//! returns the list inside an envelope object. The `garbled-*` and
//! `oversized-*` routes answer with bodies that are not UTF-8 text or that are
//! larger than common client read limits.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Body accepted by POST and PUT. Every field may be null; a client that
/// serializes its whole schema sends `"id": null` for new resources.
#[derive(Debug, Default, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub name: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    users: BTreeMap<u64, User>,
}

impl Store {
    fn insert(&mut self, input: UserInput) -> User {
        self.next_id += 1;
        let user = User {
            id: self.next_id,
            name: input.name.unwrap_or_default(),
            email: input.email.unwrap_or_default(),
        };
        self.users.insert(user.id, user.clone());
        user
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Bytes that are not valid UTF-8.
pub const GARBLED_BODY: &[u8] = &[0xff, 0xfe, 0x00];

/// Size of the `/oversized-error` body, above ureq's default 10 MiB cap.
pub const OVERSIZED_LEN: usize = 11 * 1024 * 1024;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/located-users", post(create_located_user))
        .route("/wrapped-users", get(list_wrapped_users))
        .route("/garbled-users", get(garbled_users))
        .route("/garbled-error", get(garbled_error))
        .route("/oversized-error", get(oversized_error))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_users(State(db): State<Db>, Query(filter): Query<ListFilter>) -> Json<Vec<User>> {
    info!(name = ?filter.name, "GET /users");
    let store = db.read().await;
    let users = store
        .users
        .values()
        .filter(|user| filter.name.as_ref().map_or(true, |name| &user.name == name))
        .cloned()
        .collect();
    Json(users)
}

async fn list_wrapped_users(State(db): State<Db>) -> Json<serde_json::Value> {
    info!("GET /wrapped-users");
    let store = db.read().await;
    let users: Vec<User> = store.users.values().cloned().collect();
    Json(json!({ "users": users }))
}

async fn garbled_users() -> impl IntoResponse {
    info!("GET /garbled-users");
    ([(header::CONTENT_TYPE, "application/json")], GARBLED_BODY)
}

async fn garbled_error() -> impl IntoResponse {
    info!("GET /garbled-error");
    (StatusCode::INTERNAL_SERVER_ERROR, GARBLED_BODY)
}

async fn oversized_error() -> impl IntoResponse {
    info!("GET /oversized-error");
    (StatusCode::SERVICE_UNAVAILABLE, vec![b'x'; OVERSIZED_LEN])
}

async fn create_user(State(db): State<Db>, Json(input): Json<UserInput>) -> (StatusCode, Json<User>) {
    let user = db.write().await.insert(input);
    info!(id = user.id, "POST /users");
    (StatusCode::CREATED, Json(user))
}

async fn create_located_user(State(db): State<Db>, Json(input): Json<UserInput>) -> impl IntoResponse {
    let user = db.write().await.insert(input);
    info!(id = user.id, "POST /located-users");
    (StatusCode::CREATED, [(header::LOCATION, format!("/users/{}", user.id))])
}

async fn get_user(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<User>, StatusCode> {
    info!(id, "GET /users/{{id}}");
    let store = db.read().await;
    store.users.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UserInput>,
) -> Result<Json<User>, StatusCode> {
    info!(id, "PUT /users/{{id}}");
    let mut store = db.write().await;
    let user = store.users.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(email) = input.email {
        user.email = email;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, StatusCode> {
    info!(id, "DELETE /users/{{id}}");
    let mut store = db.write().await;
    store.users.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}
