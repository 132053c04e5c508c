//! Rooms and room management bodies.

use serde::{Deserialize, Serialize};

use super::{Message, MessageId, RoomId, Timestamp, User, UserId};

/// Room flavour; private rooms derive their display fields from the other member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    /// One-to-one conversation.
    Private,
    /// Named multi-member room.
    Group,
    /// Conversation with an assistant.
    Ai,
}

impl RoomKind {
    /// Canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Group => "group",
            Self::Ai => "ai",
        }
    }
}

impl TryFrom<&str> for RoomKind {
    type Error = &'static str;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "private" => Ok(Self::Private),
            "group" => Ok(Self::Group),
            "ai" => Ok(Self::Ai),
            _ => Err("invalid room kind"),
        }
    }
}

/// A conversation room with its members and denormalized last message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Unique identifier for the room.
    #[serde(rename = "_id")]
    pub id: RoomId,

    /// Display name; required for group/ai rooms, absent for private rooms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Room flavour.
    #[serde(rename = "type")]
    pub kind: RoomKind,

    /// Member projections, including the current user.
    #[serde(default)]
    pub members: Vec<User>,

    /// Members allowed to manage the room.
    #[serde(default)]
    pub admins: Vec<UserId>,

    /// Background asset reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallpaper: Option<String>,

    /// Pinned message ids.
    #[serde(default)]
    pub pinned_messages: Vec<MessageId>,

    /// Most recent message, used for previews and ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Box<Message>>,

    /// Messages the current user has not read.
    #[serde(default)]
    pub unread_count: u32,

    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    /// Last server-side change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Room {
    /// Whether `user` belongs to the room.
    #[must_use]
    pub fn has_member(&self, user: &UserId) -> bool {
        self.members.iter().any(|member| &member.id == user)
    }

    /// Mutable access to every occurrence of `user` among the members.
    pub fn members_matching<'a>(
        &'a mut self,
        user: &'a UserId,
    ) -> impl Iterator<Item = &'a mut User> + 'a {
        self.members.iter_mut().filter(move |member| &member.id == user)
    }
}

/// Body for `POST /rooms`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateRoomRequest {
    /// Room flavour.
    #[serde(rename = "type")]
    pub kind: RoomKind,
    /// Display name for group rooms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Initial members besides the creator.
    pub members: Vec<UserId>,
}

/// Body for `PUT /rooms/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateRoomRequest {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New wallpaper reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallpaper: Option<String>,
}

/// Body for `POST`/`DELETE /rooms/:id/members`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomMemberRequest {
    /// Member to add or remove.
    pub user_id: UserId,
}
