//! High-level client wiring the session, gateway, live channel and
//! reconciliation state together.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use shared::{
    config::ClientConfig,
    models::{
        ClientIntent, CreateRoomRequest, MessageId, Pagination, Room, RoomId, UpdateRoomRequest,
        UserId,
    },
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    channel::{ChannelEvent, IntentSink, LiveChannel},
    composer::Composer,
    error::{ClientError, ClientResult},
    gateway::ApiClient,
    reconcile::{ChatState, EventOutcome},
    session::{Session, SessionState, SessionStore},
    storage::{FileStore, KeyValueStore},
};

/// Subdirectory of the data dir holding the persisted session.
const SESSION_DIR: &str = "session";

/// Entry point for front ends.
#[derive(Debug)]
pub struct ChatClient {
    config: ClientConfig,
    api: ApiClient,
    session: SessionStore,
    state: Arc<Mutex<ChatState>>,
    channel: Option<LiveChannel>,
}

impl ChatClient {
    /// Build a client persisting its session in `storage`.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: ClientConfig, storage: Arc<dyn KeyValueStore>) -> ClientResult<Self> {
        let api = ApiClient::from_config(&config)?;
        let session = SessionStore::new(storage, Arc::new(api.clone()));
        Ok(Self {
            config,
            api,
            session,
            state: Arc::new(Mutex::new(ChatState::default())),
            channel: None,
        })
    }

    /// Build a client persisting its session under `config.data_dir`.
    ///
    /// # Errors
    /// Fails when the data directory or HTTP client cannot be set up.
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let storage = FileStore::open(config.data_dir.join(SESSION_DIR))?;
        Self::new(config, Arc::new(storage))
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The REST gateway, for endpoints the facade does not wrap.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The session store.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current view state.
    #[must_use]
    pub fn snapshot(&self) -> ChatState {
        self.state().clone()
    }

    /// Rehydrate the persisted session.
    ///
    /// # Errors
    /// Returns [`ClientError::Storage`] when storage cannot be read.
    pub fn restore(&self) -> ClientResult<SessionState> {
        let state = self.session.rehydrate()?;
        self.state()
            .set_self(state.session().map(|session| session.user.id.clone()));
        Ok(state)
    }

    /// # Errors
    /// Returns the gateway error; no state changes on failure.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let session = self.session.login(email, password).await?;
        self.state().set_self(Some(session.user.id.clone()));
        Ok(session)
    }

    /// # Errors
    /// Returns the gateway error; no state changes on failure.
    pub async fn signup(&self, email: &str, password: &str, username: &str) -> ClientResult<Session> {
        let session = self.session.signup(email, password, username).await?;
        self.state().set_self(Some(session.user.id.clone()));
        Ok(session)
    }

    /// Tear down the live channel, end the session and drop all chat state.
    ///
    /// # Errors
    /// Returns [`ClientError::Storage`] when stored entries cannot be removed.
    pub async fn logout(&mut self) -> ClientResult<()> {
        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        self.state().clear();
        self.session.logout().await
    }

    /// Open the live channel for the current session, replacing any open one.
    ///
    /// # Errors
    /// [`ClientError::NotAuthenticated`] without a session.
    pub async fn connect(&mut self) -> ClientResult<mpsc::UnboundedReceiver<ChannelEvent>> {
        let token = self.session.token().ok_or(ClientError::NotAuthenticated)?;
        if let Some(previous) = self.channel.take() {
            previous.close().await;
        }

        let (channel, events) = LiveChannel::open(
            self.config.socket_url.clone(),
            token,
            Duration::from_millis(self.config.reconnect_delay_ms),
        );
        self.channel = Some(channel);
        Ok(events)
    }

    /// Whether the live channel is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.channel
            .as_ref()
            .is_some_and(|channel| channel.state().is_connected())
    }

    /// Fold one channel report into the state.
    #[must_use]
    pub fn handle_channel_event(&self, event: ChannelEvent) -> EventOutcome {
        match event {
            ChannelEvent::Connected => {
                let active = {
                    let mut state = self.state();
                    state.set_connected(true);
                    state.active_room_id().cloned()
                };
                if let Some(room_id) = active {
                    self.emit_best_effort(ClientIntent::join_room(room_id));
                }
                EventOutcome::Applied
            }
            ChannelEvent::Disconnected { reason } => {
                debug!(%reason, "marking channel disconnected");
                self.state().set_connected(false);
                EventOutcome::Applied
            }
            ChannelEvent::Event(event) => self.state().apply_event(event),
        }
    }

    /// Fetch the room list and seed the state with it.
    ///
    /// # Errors
    /// Returns the gateway error; existing rooms are kept on failure.
    pub async fn load_rooms(&self) -> ClientResult<Vec<Room>> {
        let rooms = self.api.rooms().await?;
        self.state().seed_rooms(rooms.clone());
        info!(count = rooms.len(), "rooms loaded");
        Ok(rooms)
    }

    /// Switch the active room, load its first page and join it.
    ///
    /// Returns `None` when another selection superseded this one before the
    /// page arrived.
    ///
    /// # Errors
    /// Returns the gateway error; the room stays selected with an empty
    /// sequence.
    pub async fn select_room(&self, room_id: &RoomId) -> ClientResult<Option<Pagination>> {
        let ticket = self.state().select_room(room_id.clone());
        let page = self
            .api
            .messages(room_id, 1, self.config.page_size)
            .await?;

        if !self.state().apply_page(&ticket, page.messages) {
            return Ok(None);
        }
        self.emit_best_effort(ClientIntent::join_room(room_id.clone()));
        Ok(Some(page.pagination))
    }

    /// Load an older page of the active room's history.
    ///
    /// # Errors
    /// Returns [`ClientError::UnknownRoom`] with no active room, or the
    /// gateway error.
    pub async fn load_page(&self, page: u32) -> ClientResult<Option<Pagination>> {
        let ticket = self
            .state()
            .current_ticket()
            .ok_or_else(|| ClientError::UnknownRoom("no active room".to_string()))?;

        let result = self
            .api
            .messages(ticket.room_id(), page, self.config.page_size)
            .await?;
        if self.state().apply_page(&ticket, result.messages) {
            Ok(Some(result.pagination))
        } else {
            Ok(None)
        }
    }

    fn channel(&self) -> ClientResult<&LiveChannel> {
        self.channel.as_ref().ok_or(ClientError::NotConnected)
    }

    fn emit(&self, intent: ClientIntent) -> ClientResult<()> {
        self.channel()?.emit(intent)
    }

    fn emit_best_effort(&self, intent: ClientIntent) {
        let name = intent.name();
        if let Err(err) = self.emit(intent) {
            debug!(intent = name, error = %err, "intent not sent");
        }
    }

    fn require_room(&self, room_id: &RoomId) -> ClientResult<()> {
        if self.state().room(room_id).is_some() {
            Ok(())
        } else {
            Err(ClientError::UnknownRoom(room_id.to_string()))
        }
    }

    fn active_room_id(&self) -> ClientResult<RoomId> {
        self.state()
            .active_room_id()
            .cloned()
            .ok_or_else(|| ClientError::UnknownRoom("no active room".to_string()))
    }

    /// # Errors
    /// [`ClientError::NotConnected`] when the channel is down.
    pub fn send_message(&self, room_id: &RoomId, content: &str) -> ClientResult<()> {
        self.require_room(room_id)?;
        self.emit(ClientIntent::send_text(room_id.clone(), content))
    }

    /// # Errors
    /// [`ClientError::NotConnected`] when the channel is down.
    pub fn react(&self, message_id: &MessageId, emoji: &str) -> ClientResult<()> {
        let room_id = self.active_room_id()?;
        self.emit(ClientIntent::react(message_id.clone(), room_id, emoji))
    }

    /// Toggle the pin state of a message in the active room.
    ///
    /// # Errors
    /// [`ClientError::NotConnected`] when the channel is down.
    pub fn pin(&self, message_id: &MessageId) -> ClientResult<()> {
        let room_id = self.active_room_id()?;
        self.emit(ClientIntent::pin(message_id.clone(), room_id))
    }

    /// # Errors
    /// [`ClientError::NotConnected`] when the channel is down.
    pub fn mark_read(&self, message_id: &MessageId) -> ClientResult<()> {
        let room_id = self.active_room_id()?;
        self.emit(ClientIntent::mark_read(message_id.clone(), room_id))
    }

    /// Composer bound to the active room and the live channel.
    ///
    /// # Errors
    /// [`ClientError::NotConnected`] without a channel, or
    /// [`ClientError::UnknownRoom`] with no active room.
    pub fn composer(&self) -> ClientResult<Composer> {
        let sink = self.channel()?.sink();
        let room_id = self.active_room_id()?;
        let mut composer = Composer::new(
            room_id,
            Duration::from_millis(self.config.typing_idle_ms),
            Arc::new(sink),
        );
        composer.set_enabled(self.is_connected());
        Ok(composer)
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn create_room(&self, request: &CreateRoomRequest) -> ClientResult<Room> {
        let room = self.api.create_room(request).await?;
        self.state().upsert_room(room.clone());
        Ok(room)
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn update_room(&self, room_id: &RoomId, request: &UpdateRoomRequest) -> ClientResult<Room> {
        let room = self.api.update_room(room_id, request).await?;
        self.state().upsert_room(room.clone());
        Ok(room)
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn add_member(&self, room_id: &RoomId, user: &UserId) -> ClientResult<Room> {
        let room = self.api.add_member(room_id, user).await?;
        self.state().upsert_room(room.clone());
        Ok(room)
    }

    /// Remove a member; removing yourself drops the room locally.
    ///
    /// # Errors
    /// Returns the gateway error.
    pub async fn remove_member(&self, room_id: &RoomId, user: &UserId) -> ClientResult<Room> {
        let room = self.api.remove_member(room_id, user).await?;
        let mut state = self.state();
        if state.self_id() == Some(user) {
            state.remove_room(room_id);
        } else {
            state.upsert_room(room.clone());
        }
        Ok(room)
    }

    /// Close the live channel if open; the session is kept.
    pub async fn disconnect(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close().await;
            self.state().set_connected(false);
        } else {
            debug!("disconnect requested without an open channel");
        }
    }
}
