//! Derived-only selectors for rendering chat state.

use chrono::{DateTime, Utc};
use shared::models::{DeliveryStatus, Message, Reaction, Room, RoomKind, Timestamp, User, UserId};

use crate::reconcile::TypingUser;

/// Avatar colour used when a user has not picked one.
pub const DEFAULT_AVATAR_COLOR: &str = "#a594f9";

/// The non-self member of a private room. Other room kinds have none.
#[must_use]
pub fn other_participant<'a>(room: &'a Room, self_id: &UserId) -> Option<&'a User> {
    match room.kind {
        RoomKind::Private => room.members.iter().find(|member| &member.id != self_id),
        RoomKind::Group | RoomKind::Ai => None,
    }
}

/// Title shown for a room: the other member's name for private rooms, the
/// stored name otherwise.
#[must_use]
pub fn room_display_name(room: &Room, self_id: &UserId) -> String {
    match room.kind {
        RoomKind::Private => other_participant(room, self_id)
            .map_or_else(|| "Unknown".to_string(), |user| user.username.clone()),
        RoomKind::Group | RoomKind::Ai => room
            .name
            .clone()
            .unwrap_or_else(|| "Unnamed room".to_string()),
    }
}

/// Avatar colour: the other member's for private rooms, the default otherwise.
#[must_use]
pub fn avatar_color<'a>(room: &'a Room, self_id: &UserId) -> &'a str {
    other_participant(room, self_id)
        .and_then(|user| user.profile_pic_color.as_deref())
        .unwrap_or(DEFAULT_AVATAR_COLOR)
}

/// Status line under the room title.
#[must_use]
pub fn header_status(
    room: &Room,
    self_id: &UserId,
    typing: &[TypingUser],
    now: DateTime<Utc>,
) -> String {
    if !typing.is_empty() {
        return "typing...".to_string();
    }

    match room.kind {
        RoomKind::Private => match other_participant(room, self_id) {
            Some(user) if user.is_online() => "online".to_string(),
            Some(user) => format_last_seen(user.last_seen, now),
            None => String::new(),
        },
        RoomKind::Group | RoomKind::Ai => format!("{} members", room.members.len()),
    }
}

/// "ada is typing..." or "ada, bob are typing...".
#[must_use]
pub fn typing_text(typing: &[TypingUser]) -> Option<String> {
    if typing.is_empty() {
        return None;
    }
    let names = typing
        .iter()
        .map(|user| user.username.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let verb = if typing.len() == 1 { "is" } else { "are" };
    Some(format!("{names} {verb} typing..."))
}

/// Coarse age of `then` relative to `now`.
#[must_use]
pub fn format_relative(then: Timestamp, now: DateTime<Utc>) -> String {
    let minutes = now.signed_duration_since(then.0).num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 60 * 24 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (60 * 24))
    }
}

/// "last seen ..." line for an offline user; empty when unknown.
#[must_use]
pub fn format_last_seen(last_seen: Option<Timestamp>, now: DateTime<Utc>) -> String {
    match last_seen {
        Some(seen) => match format_relative(seen, now).as_str() {
            "Just now" => "last seen just now".to_string(),
            relative => format!("last seen {relative}"),
        },
        None => String::new(),
    }
}

/// Clock time shown on a message bubble.
#[must_use]
pub fn format_time(at: Timestamp) -> String {
    at.0.format("%H:%M").to_string()
}

/// Delivery ticks for an own message; `highlighted` marks read receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTicks {
    /// One or two check marks.
    pub glyph: &'static str,
    /// Set once the message is read.
    pub highlighted: bool,
}

/// Ticks for a delivery status.
#[must_use]
pub const fn status_ticks(status: DeliveryStatus) -> StatusTicks {
    match status {
        DeliveryStatus::Sent => StatusTicks {
            glyph: "✓",
            highlighted: false,
        },
        DeliveryStatus::Delivered => StatusTicks {
            glyph: "✓✓",
            highlighted: false,
        },
        DeliveryStatus::Read => StatusTicks {
            glyph: "✓✓",
            highlighted: true,
        },
    }
}

/// Reaction counts grouped by emoji, in order of first appearance.
#[must_use]
pub fn reaction_counts(reactions: &[Reaction]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for reaction in reactions {
        match counts.iter_mut().find(|(emoji, _)| emoji == &reaction.emoji) {
            Some((_, count)) => *count += 1,
            None => counts.push((reaction.emoji.clone(), 1)),
        }
    }
    counts
}

/// Badge text for an unread counter; nothing when zero.
#[must_use]
pub fn unread_badge(count: u32) -> Option<String> {
    match count {
        0 => None,
        1..=9 => Some(count.to_string()),
        _ => Some("9+".to_string()),
    }
}

/// Whether `user` may manage `room`.
#[must_use]
pub fn is_admin(room: &Room, user: &UserId) -> bool {
    room.admins.contains(user)
}

/// Whether the signed-in user wrote `message`.
#[must_use]
pub fn is_own(message: &Message, self_id: &UserId) -> bool {
    &message.sender.id == self_id
}
