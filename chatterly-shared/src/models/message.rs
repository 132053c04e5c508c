//! Messages, reactions and paged history.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::{MessageId, RoomId, Timestamp, User};

/// The kind of payload a message carries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text.
    #[default]
    Text,
    /// Uploaded attachment.
    File,
    /// Animated image link.
    Gif,
    /// Backend-generated notice.
    System,
}

impl MessageKind {
    /// Canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Gif => "gif",
            Self::System => "system",
        }
    }
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Delivery progress of a message. Ordered `Sent < Delivered < Read`.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Accepted by the backend.
    #[default]
    Sent,
    /// Reached at least one recipient.
    Delivered,
    /// Seen by a recipient.
    Read,
}

impl DeliveryStatus {
    /// Canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }

    /// Whether moving from `self` to `next` keeps the status monotonic.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        next >= self
    }
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One user's emoji reaction on a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reaction {
    /// Who reacted.
    pub user: User,
    /// The emoji itself.
    pub emoji: String,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier for the message.
    #[serde(rename = "_id")]
    pub id: MessageId,

    /// Author of the message.
    pub sender: User,

    /// Room the message belongs to.
    pub room: RoomId,

    /// Text body, or caption for attachments.
    #[serde(default)]
    pub content: String,

    /// Payload kind.
    #[serde(rename = "type", default)]
    pub kind: MessageKind,

    /// Attachment location for file messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,

    /// Human-readable attachment size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,

    /// Original attachment name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Delivery progress.
    #[serde(default)]
    pub status: DeliveryStatus,

    /// Every (user, emoji) pair; the same emoji may appear more than once.
    #[serde(default)]
    pub reactions: Vec<Reaction>,

    /// Whether the message is pinned in its room.
    #[serde(default)]
    pub is_pinned: bool,

    /// Message this one replies to, when the backend populates it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Box<Message>>,

    /// Server creation time.
    pub created_at: Timestamp,

    /// Last edit time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Message {
    /// Advance the delivery status; returns `false` when `next` would regress it.
    pub fn advance_status(&mut self, next: DeliveryStatus) -> bool {
        if self.status.can_advance_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}

/// Pagination block attached to a message page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    /// Page size requested.
    pub limit: u32,
    /// Messages in the room.
    pub total: u64,
    /// Number of pages at this size.
    pub pages: u32,
    /// Whether older pages remain.
    pub has_more: bool,
}

/// Payload of `GET /rooms/:id/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagePage {
    /// Messages on this page, oldest first.
    pub messages: Vec<Message>,
    /// Position of the page within the history.
    #[serde(default)]
    pub pagination: Pagination,
}

/// Body for `PUT /messages/:id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditMessageRequest {
    /// Replacement body.
    pub content: String,
}
