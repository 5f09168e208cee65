//! Wire protocol for the per-room WebSocket feed.
//!
//! Inbound frames are JSON-encoded [`MessageResponse`] values; outbound
//! frames wrap the user-authored text in a `{content}` envelope.  The
//! server assigns ids and timestamps and echoes the finished message
//! back through the same feed, so the client never synthesizes a local
//! copy of its own sends.

use serde::{Deserialize, Serialize};

use crate::models::MessageResponse;

/// The outbound message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundFrame {
    pub content: String,
}

impl OutboundFrame {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Serialize to the JSON text frame the server expects.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Decode an inbound text frame into a [`MessageResponse`].
///
/// Malformed frames are the caller's problem to drop; this function
/// only reports the decode failure.
pub fn decode_inbound(frame: &str) -> Result<MessageResponse, serde_json::Error> {
    serde_json::from_str(frame)
}
