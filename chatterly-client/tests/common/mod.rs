//! In-process mock backend shared by the integration tests.

#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

pub const GOOD_EMAIL: &str = "user@example.com";
pub const GOOD_PASSWORD: &str = "GoodPass1";
pub const TOKEN: &str = "tok-123";

/// Requests observed by the mock, for assertions.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub authorization: Vec<Option<String>>,
    pub queries: Vec<String>,
    pub member_bodies: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    pub recorded: Arc<Mutex<Recorded>>,
    pub fail_logout: bool,
    /// Room whose message pages are answered late.
    pub slow_room: Option<String>,
}

pub fn user_json(id: &str, name: &str) -> Value {
    json!({"_id": id, "email": format!("{name}@example.com"), "username": name, "status": "offline"})
}

pub fn message_json(id: &str, room: &str, sender: &str) -> Value {
    json!({
        "_id": id,
        "room": room,
        "sender": user_json(sender, sender),
        "content": format!("body {id}"),
        "type": "text",
        "status": "sent",
        "reactions": [],
        "isPinned": false,
        "createdAt": "2025-03-08T14:30:00Z",
        "updatedAt": "2025-03-08T14:30:00Z"
    })
}

pub fn rooms_json() -> Value {
    json!([
        {
            "_id": "r1",
            "type": "private",
            "members": [user_json("u1", "user"), user_json("u2", "ada")],
            "admins": ["u1"],
            "pinnedMessages": [],
            "createdAt": "2025-03-08T14:30:00Z",
            "updatedAt": "2025-03-08T14:30:00Z"
        },
        {
            "_id": "r2",
            "type": "group",
            "name": "Team",
            "members": [user_json("u1", "user"), user_json("u2", "ada"), user_json("u3", "bob")],
            "admins": ["u3"],
            "pinnedMessages": [],
            "unreadCount": 4,
            "createdAt": "2025-03-08T14:30:00Z",
            "updatedAt": "2025-03-08T14:30:00Z"
        }
    ])
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Not authorized, no token"})),
    )
        .into_response()
}

impl MockBackend {
    fn authorize(&self, headers: &HeaderMap) -> bool {
        let header = bearer(headers);
        let ok = header.as_deref() == Some(&format!("Bearer {TOKEN}"));
        self.recorded.lock().unwrap().authorization.push(header);
        ok
    }

    pub fn recorded(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/login", post(login))
            .route("/signup", post(signup))
            .route("/logout", post(logout))
            .route("/rooms", get(rooms))
            .route("/rooms/search", get(search_rooms))
            .route("/rooms/{id}/messages", get(messages))
            .route("/rooms/{id}/members", delete(remove_member))
            .route("/messages/{id}", delete(delete_message))
            .route("/users/search", get(|| async { "not json" }))
            .with_state(self.clone())
    }

    pub async fn spawn(&self) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
    #[serde(default)]
    username: Option<String>,
}

async fn login(Json(body): Json<Credentials>) -> Response {
    if body.email == GOOD_EMAIL && body.password == GOOD_PASSWORD {
        Json(json!({"data": user_json("u1", "user"), "token": TOKEN, "message": "Logged in"}))
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid email or password"})),
        )
            .into_response()
    }
}

async fn signup(Json(body): Json<Credentials>) -> Response {
    let name = body.username.unwrap_or_default();
    if body.password.len() < 6 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Password must be at least 6 characters"})),
        )
            .into_response();
    }
    Json(json!({"data": user_json("u9", &name), "token": TOKEN, "message": "Created"}))
        .into_response()
}

async fn logout(State(mock): State<MockBackend>, headers: HeaderMap) -> Response {
    mock.authorize(&headers);
    if mock.fail_logout {
        (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
    } else {
        Json(json!({"data": user_json("u1", "user"), "message": "Logged out"})).into_response()
    }
}

async fn rooms(State(mock): State<MockBackend>, headers: HeaderMap) -> Response {
    if !mock.authorize(&headers) {
        return unauthorized();
    }
    Json(json!({"data": rooms_json(), "message": ""})).into_response()
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

async fn search_rooms(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Response {
    if !mock.authorize(&headers) {
        return unauthorized();
    }
    mock.recorded.lock().unwrap().queries.push(query.q.clone());
    let matches: Vec<Value> = rooms_json()
        .as_array()
        .unwrap()
        .iter()
        .filter(|room| {
            room["name"]
                .as_str()
                .is_some_and(|name| name.to_lowercase().contains(&query.q.to_lowercase()))
        })
        .cloned()
        .collect();
    Json(json!({"data": matches})).into_response()
}

#[derive(Deserialize)]
struct PageQuery {
    page: u32,
    limit: u32,
}

async fn messages(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Path(room): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    if !mock.authorize(&headers) {
        return unauthorized();
    }
    if room == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Room not found"})))
            .into_response();
    }
    if mock.slow_room.as_deref() == Some(room.as_str()) {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    let messages: Vec<Value> = (1..=3)
        .map(|n| message_json(&format!("{room}-m{n}"), &room, "u2"))
        .collect();
    Json(json!({
        "data": {
            "messages": messages,
            "pagination": {"page": query.page, "limit": query.limit, "total": 3, "pages": 1}
        }
    }))
    .into_response()
}

async fn remove_member(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Path(room): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !mock.authorize(&headers) {
        return unauthorized();
    }
    mock.recorded.lock().unwrap().member_bodies.push(body);
    let mut updated = rooms_json()[1].clone();
    updated["_id"] = json!(room);
    Json(json!({"data": updated})).into_response()
}

async fn delete_message(State(mock): State<MockBackend>, headers: HeaderMap) -> Response {
    if !mock.authorize(&headers) {
        return unauthorized();
    }
    Json(json!({"data": null, "message": "Message deleted"})).into_response()
}
