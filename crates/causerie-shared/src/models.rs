//! Domain model structs, shared by the REST snapshot path and the
//! WebSocket feed.
//!
//! Field names and casing follow the backend's JSON exactly; timestamps
//! travel as unix seconds and are `DateTime<Utc>` in memory.

use chrono::serde::ts_seconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MessageId, RoomId, RoomType, ServerId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user account as the backend exposes it.  Credentials never reach
/// the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(with = "ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.  Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub author_id: UserId,
    pub room_id: RoomId,
    pub server_id: ServerId,
    pub content: String,
    #[serde(with = "ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

/// A message with its author resolved, as delivered by both the
/// snapshot endpoint and the live feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    #[serde(flatten)]
    pub message: Message,
    pub author: User,
}

impl MessageResponse {
    pub fn id(&self) -> MessageId {
        self.message.id
    }

    pub fn room_id(&self) -> RoomId {
        self.message.room_id
    }

    /// Ordering key for the merged view: `created_at`, tie-broken by
    /// id so the order is stable when timestamps collide.
    pub fn ordering_key(&self) -> (DateTime<Utc>, MessageId) {
        (self.message.created_at, self.message.id)
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A room inside a server.  The client never mutates a room except its
/// per-viewer `status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub server_id: ServerId,
    pub name: String,
    /// Sidebar group the room is listed under.
    #[serde(default)]
    pub group_name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    #[serde(with = "ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub updated_at: DateTime<Utc>,
    /// Per-viewer read status, attached by the backend.
    #[serde(default)]
    pub status: Option<RoomUserStatus>,
}

/// Per-(user, room) read state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomUserStatus {
    pub id: String,
    pub user_id: UserId,
    pub room_id: RoomId,
    /// Every message at or before this id counts as read.  `None`
    /// means the viewer has no recorded boundary yet.
    #[serde(default)]
    pub last_read_msg_id: Option<MessageId>,
    /// When set, the read boundary follows new messages automatically
    /// while the viewer is caught up.
    #[serde(default)]
    pub is_cleared: bool,
}

// ---------------------------------------------------------------------------
// Rooms server (guild)
// ---------------------------------------------------------------------------

/// A rooms server ("guild") grouping rooms and members.  Read-only
/// from the client core's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomsServer {
    pub id: ServerId,
    pub name: String,
    pub owner_id: UserId,
    #[serde(with = "ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub updated_at: DateTime<Utc>,
    /// Per-viewer membership status, attached by the backend.
    #[serde(default)]
    pub status: Option<ServerUserStatus>,
}

/// Per-(user, server) membership state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerUserStatus {
    pub id: String,
    pub user_id: UserId,
    pub server_id: ServerId,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}
