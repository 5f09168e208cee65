//! Room endpoints: message snapshots and the per-viewer read status.

use serde::Serialize;

use causerie_shared::{MessageId, MessageResponse, RoomId};

use crate::error::Result;
use crate::rest::RestClient;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomStatusPatch {
    last_read_msg_id: MessageId,
}

impl RestClient {
    /// Fetch the one-shot message snapshot for a room, authors
    /// resolved.
    pub async fn room_messages(&self, room_id: RoomId) -> Result<Vec<MessageResponse>> {
        self.get(&format!("/rooms/{room_id}/messages")).await
    }

    /// Persist the viewer's read boundary for a room.  The server
    /// answers 204 and no-ops when the value is unchanged.
    pub async fn update_room_status(&self, room_id: RoomId, last_read: MessageId) -> Result<()> {
        self.patch_no_content(
            &format!("/rooms/{room_id}/status"),
            &RoomStatusPatch {
                last_read_msg_id: last_read,
            },
        )
        .await
    }
}
