#![cfg_attr(not(test), forbid(unsafe_code))]

//! Chatterly client core.
//!
//! - [`session`]: login, signup, logout and persisted identity.
//! - [`gateway`]: typed REST calls.
//! - [`channel`]: the supervised live WebSocket.
//! - [`reconcile`]: folds pages and live events into [`reconcile::ChatState`].
//! - [`view`]: derived display helpers.
//! - [`composer`]: composer text and typing debounce.
//! - [`client`]: [`ChatClient`], which wires the above together.

pub mod channel;
pub mod client;
pub mod composer;
pub mod error;
pub mod gateway;
pub mod reconcile;
pub mod session;
pub mod storage;
pub mod view;

pub use channel::{ChannelEvent, ConnectionState, IntentSink, LiveChannel};
pub use client::ChatClient;
pub use error::{ClientError, ClientResult};
pub use gateway::{ApiClient, AuthBackend};
pub use reconcile::{ChatState, EventOutcome, PageTicket, TypingUser};
pub use session::{Session, SessionState, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
