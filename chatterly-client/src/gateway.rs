//! REST gateway: thin typed wrapper over the Chatterly HTTP API.

use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, cookie::Jar};
use serde::{Serialize, de::DeserializeOwned};
use shared::{
    config::ClientConfig,
    models::{
        ApiResponse, AuthResponse, CreateRoomRequest, EditMessageRequest, ErrorResponse,
        LoginRequest, Message, MessageId, MessagePage, Room, RoomId, RoomMemberRequest,
        SignupRequest, UpdateRoomRequest, User, UserId,
    },
};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};

const USER_AGENT: &str = concat!("chatterly-client/", env!("CARGO_PKG_VERSION"));

/// Credential exchange used by the session store.
#[async_trait]
pub trait AuthBackend: Send + Sync + std::fmt::Debug {
    /// Replace the bearer token attached to subsequent calls.
    fn set_token(&self, token: Option<String>);

    /// Exchange credentials for a user and token.
    ///
    /// # Errors
    /// Returns [`ClientError::Api`] on rejected credentials, or the transport error.
    async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse>;

    /// Register a new account.
    ///
    /// # Errors
    /// Returns [`ClientError::Api`] when the backend refuses the signup.
    async fn signup(&self, request: &SignupRequest) -> ClientResult<AuthResponse>;

    /// Invalidate the server-side session.
    ///
    /// # Errors
    /// Returns the backend or transport error.
    async fn logout(&self) -> ClientResult<()>;
}

/// HTTP client for the Chatterly REST API.
///
/// Stateless apart from the bearer token and the cookie jar; no call is
/// retried.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Create a client rooted at `base_url`.
    ///
    /// # Errors
    /// Fails when the underlying HTTP client cannot be built.
    pub fn new(base_url: &Url, timeout: Duration) -> ClientResult<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            client,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Build from the `api_url` and `request_timeout_secs` settings.
    ///
    /// # Errors
    /// Fails when the underlying HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(
            &config.api_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Token attached to outgoing requests.
    #[must_use]
    pub fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().cloned())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.api_url(path));
        match self.current_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> ClientResult<Vec<u8>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = %status, bytes = body.len(), "api response");

        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(ClientError::api(
                status,
                ErrorResponse::message_from_body(&body),
            ))
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let body = self.execute(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch_data<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        self.fetch::<ApiResponse<T>>(request)
            .await
            .map(ApiResponse::into_data)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch_data(self.request(method, path).json(body)).await
    }

    /// List the rooms the current user belongs to.
    ///
    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn rooms(&self) -> ClientResult<Vec<Room>> {
        self.fetch_data(self.request(Method::GET, "rooms")).await
    }

    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn room(&self, id: &RoomId) -> ClientResult<Room> {
        self.fetch_data(self.request(Method::GET, &format!("rooms/{id}")))
            .await
    }

    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn search_rooms(&self, query: &str) -> ClientResult<Vec<Room>> {
        self.fetch_data(
            self.request(Method::GET, "rooms/search")
                .query(&[("q", query)]),
        )
        .await
    }

    /// Fetch one page of a room's history, oldest first within the page.
    ///
    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn messages(&self, room: &RoomId, page: u32, limit: u32) -> ClientResult<MessagePage> {
        self.fetch_data(
            self.request(Method::GET, &format!("rooms/{room}/messages"))
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }

    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn create_room(&self, request: &CreateRoomRequest) -> ClientResult<Room> {
        self.send_json(Method::POST, "rooms", request).await
    }

    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn update_room(&self, id: &RoomId, request: &UpdateRoomRequest) -> ClientResult<Room> {
        self.send_json(Method::PUT, &format!("rooms/{id}"), request)
            .await
    }

    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn add_member(&self, room: &RoomId, user: &UserId) -> ClientResult<Room> {
        let body = RoomMemberRequest {
            user_id: user.clone(),
        };
        self.send_json(Method::POST, &format!("rooms/{room}/members"), &body)
            .await
    }

    /// Remove a member; the backend expects the user id in a DELETE body.
    ///
    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn remove_member(&self, room: &RoomId, user: &UserId) -> ClientResult<Room> {
        let body = RoomMemberRequest {
            user_id: user.clone(),
        };
        self.send_json(Method::DELETE, &format!("rooms/{room}/members"), &body)
            .await
    }

    /// Search across every room the user can see.
    ///
    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn search_messages(&self, query: &str) -> ClientResult<Vec<Message>> {
        self.fetch_data(
            self.request(Method::GET, "messages/search")
                .query(&[("q", query)]),
        )
        .await
    }

    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn search_room_messages(&self, room: &RoomId, query: &str) -> ClientResult<Vec<Message>> {
        self.fetch_data(
            self.request(Method::GET, &format!("messages/room/{room}/search"))
                .query(&[("q", query)]),
        )
        .await
    }

    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn pinned_messages(&self, room: &RoomId) -> ClientResult<Vec<Message>> {
        self.fetch_data(self.request(Method::GET, &format!("messages/room/{room}/pinned")))
            .await
    }

    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn edit_message(&self, id: &MessageId, content: &str) -> ClientResult<Message> {
        let body = EditMessageRequest {
            content: content.to_string(),
        };
        self.send_json(Method::PUT, &format!("messages/{id}"), &body)
            .await
    }

    /// Delete a message; the response body is ignored.
    ///
    /// # Errors
    /// Returns [`ClientError`] on transport or status failure.
    pub async fn delete_message(&self, id: &MessageId) -> ClientResult<()> {
        self.execute(self.request(Method::DELETE, &format!("messages/{id}")))
            .await
            .map(drop)
    }

    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn search_users(&self, query: &str) -> ClientResult<Vec<User>> {
        self.fetch_data(
            self.request(Method::GET, "users/search")
                .query(&[("q", query)]),
        )
        .await
    }

    /// # Errors
    /// Returns [`ClientError`] on transport, status or decode failure.
    pub async fn user(&self, id: &UserId) -> ClientResult<User> {
        self.fetch_data(self.request(Method::GET, &format!("users/{id}")))
            .await
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
        self.fetch(self.request(Method::POST, "login").json(request))
            .await
    }

    async fn signup(&self, request: &SignupRequest) -> ClientResult<AuthResponse> {
        self.fetch(self.request(Method::POST, "signup").json(request))
            .await
    }

    async fn logout(&self) -> ClientResult<()> {
        self.execute(self.request(Method::POST, "logout"))
            .await
            .map(drop)
    }
}
