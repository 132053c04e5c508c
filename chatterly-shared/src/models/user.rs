//! User accounts and authentication bodies.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{Timestamp, UserId};

/// Presence reported for a user account.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    /// Connected to the live channel.
    Online,
    /// Not connected.
    #[default]
    Offline,
}

impl PresenceStatus {
    /// Canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresenceStatus {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err("unknown presence status"),
        }
    }
}

/// A chat participant as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier for the user.
    #[serde(rename = "_id")]
    pub id: UserId,

    /// Login email; omitted by some member projections.
    #[serde(default)]
    pub email: String,

    /// Display name.
    pub username: String,

    /// Optional avatar image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Optional avatar background colour (`#rrggbb`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic_color: Option<String>,

    /// Current presence.
    #[serde(default)]
    pub status: PresenceStatus,

    /// Last time the user was seen; only meaningful while offline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<Timestamp>,
}

impl User {
    /// Mark the user online, dropping any stale last-seen marker.
    pub fn set_online(&mut self) {
        self.status = PresenceStatus::Online;
        self.last_seen = None;
    }

    /// Mark the user offline as of `last_seen`.
    pub fn set_offline(&mut self, last_seen: Timestamp) {
        self.status = PresenceStatus::Offline;
        self.last_seen = Some(last_seen);
    }

    /// Whether the user is currently online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status == PresenceStatus::Online
    }
}

/// Credentials for `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Plaintext password, sent over the API transport.
    pub password: String,
}

/// Registration payload for `POST /signup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignupRequest {
    /// Account email.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Chosen display name.
    pub username: String,
}

/// Response body for `POST /login` and `POST /signup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    /// The authenticated user.
    pub data: User,
    /// Bearer token for subsequent calls.
    pub token: String,
    /// Human-readable status message.
    #[serde(default)]
    pub message: String,
}
