//! Live channel frames. Every frame is a JSON object `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

use super::{
    DeliveryStatus, Message, MessageId, MessageKind, Reaction, RoomId, Timestamp, UserId,
};

/// Payload of `message:status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageStatusEvent {
    /// Message whose delivery progressed.
    pub message_id: MessageId,
    /// New delivery status.
    pub status: DeliveryStatus,
}

/// Payload of `message:reacted`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageReactedEvent {
    /// Message that was reacted to.
    pub message_id: MessageId,
    /// Full replacement reaction set.
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

/// Payload of `message:pinned`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePinnedEvent {
    /// Message whose pin state changed.
    pub message_id: MessageId,
    /// Pin state after the toggle.
    pub is_pinned: bool,
}

/// Payload of `typing:start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingStartEvent {
    /// User who started typing.
    pub user_id: UserId,
    /// Their display name, for the typing line.
    pub username: String,
    /// Present when the backend scopes typing frames to a room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
}

/// Payload of `typing:stop`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingStopEvent {
    /// User who stopped typing.
    pub user_id: UserId,
    /// Present when the backend scopes typing frames to a room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
}

/// Payload of `user:online`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserOnlineEvent {
    /// User who came online.
    pub user_id: UserId,
    /// Display name; some backends omit it.
    #[serde(default)]
    pub username: String,
}

/// Payload of `user:offline`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserOfflineEvent {
    /// User who went offline.
    pub user_id: UserId,
    /// When they were last seen.
    pub last_seen: Timestamp,
}

/// Payload of `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelErrorEvent {
    /// Server-provided description.
    pub message: String,
}

/// Frames pushed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A message was posted to a room the user belongs to.
    #[serde(rename = "message:new")]
    MessageNew(Box<Message>),
    /// A message advanced to delivered or read.
    #[serde(rename = "message:status")]
    MessageStatus(MessageStatusEvent),
    /// A message's reaction set changed.
    #[serde(rename = "message:reacted")]
    MessageReacted(MessageReactedEvent),
    /// A message was pinned or unpinned.
    #[serde(rename = "message:pinned")]
    MessagePinned(MessagePinnedEvent),
    /// Someone started typing.
    #[serde(rename = "typing:start")]
    TypingStart(TypingStartEvent),
    /// Someone stopped typing.
    #[serde(rename = "typing:stop")]
    TypingStop(TypingStopEvent),
    /// A user came online.
    #[serde(rename = "user:online")]
    UserOnline(UserOnlineEvent),
    /// A user went offline.
    #[serde(rename = "user:offline")]
    UserOffline(UserOfflineEvent),
    /// The server rejected something; no state change.
    #[serde(rename = "error")]
    Error(ChannelErrorEvent),
}

impl ServerEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MessageNew(_) => "message:new",
            Self::MessageStatus(_) => "message:status",
            Self::MessageReacted(_) => "message:reacted",
            Self::MessagePinned(_) => "message:pinned",
            Self::TypingStart(_) => "typing:start",
            Self::TypingStop(_) => "typing:stop",
            Self::UserOnline(_) => "user:online",
            Self::UserOffline(_) => "user:offline",
            Self::Error(_) => "error",
        }
    }
}

/// Payload of `message:send`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageIntent {
    /// Destination room.
    pub room_id: RoomId,
    /// Message body.
    pub content: String,
    /// Payload kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

/// Room-scoped intent payload (join, typing).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomIntent {
    /// Target room.
    pub room_id: RoomId,
}

/// Message-scoped intent payload (read, pin).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageIntent {
    /// Target message.
    pub message_id: MessageId,
    /// Room holding the message.
    pub room_id: RoomId,
}

/// Payload of `message:react`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactIntent {
    /// Target message.
    pub message_id: MessageId,
    /// Room holding the message.
    pub room_id: RoomId,
    /// Emoji to toggle.
    pub emoji: String,
}

/// Frames the client sends; fire-and-forget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum ClientIntent {
    /// Post a message.
    #[serde(rename = "message:send")]
    SendMessage(SendMessageIntent),
    /// The user started typing in a room.
    #[serde(rename = "typing:start")]
    TypingStart(RoomIntent),
    /// The user stopped typing in a room.
    #[serde(rename = "typing:stop")]
    TypingStop(RoomIntent),
    /// Mark a message read.
    #[serde(rename = "message:read")]
    MarkRead(MessageIntent),
    /// Toggle a reaction.
    #[serde(rename = "message:react")]
    React(ReactIntent),
    /// Toggle a message's pin state.
    #[serde(rename = "message:pin")]
    Pin(MessageIntent),
    /// Subscribe to a room's frames.
    #[serde(rename = "room:join")]
    JoinRoom(RoomIntent),
}

impl ClientIntent {
    /// `message:send` with a text payload.
    #[must_use]
    pub fn send_text(room_id: RoomId, content: impl Into<String>) -> Self {
        Self::SendMessage(SendMessageIntent {
            room_id,
            content: content.into(),
            kind: MessageKind::Text,
        })
    }

    /// `typing:start` for `room_id`.
    #[must_use]
    pub fn typing_start(room_id: RoomId) -> Self {
        Self::TypingStart(RoomIntent { room_id })
    }

    /// `typing:stop` for `room_id`.
    #[must_use]
    pub fn typing_stop(room_id: RoomId) -> Self {
        Self::TypingStop(RoomIntent { room_id })
    }

    /// `room:join` for `room_id`.
    #[must_use]
    pub fn join_room(room_id: RoomId) -> Self {
        Self::JoinRoom(RoomIntent { room_id })
    }

    /// `message:read` for one message.
    #[must_use]
    pub fn mark_read(message_id: MessageId, room_id: RoomId) -> Self {
        Self::MarkRead(MessageIntent {
            message_id,
            room_id,
        })
    }

    /// `message:react` with one emoji.
    #[must_use]
    pub fn react(message_id: MessageId, room_id: RoomId, emoji: impl Into<String>) -> Self {
        Self::React(ReactIntent {
            message_id,
            room_id,
            emoji: emoji.into(),
        })
    }

    /// `message:pin` toggle for one message.
    #[must_use]
    pub fn pin(message_id: MessageId, room_id: RoomId) -> Self {
        Self::Pin(MessageIntent {
            message_id,
            room_id,
        })
    }

    /// Wire name of the intent.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => "message:send",
            Self::TypingStart(_) => "typing:start",
            Self::TypingStop(_) => "typing:stop",
            Self::MarkRead(_) => "message:read",
            Self::React(_) => "message:react",
            Self::Pin(_) => "message:pin",
            Self::JoinRoom(_) => "room:join",
        }
    }
}
