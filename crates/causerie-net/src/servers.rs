//! Rooms-server ("guild") endpoints.

use serde::Serialize;

use causerie_shared::{Room, RoomType, RoomsServer, ServerId};

use crate::error::Result;
use crate::rest::RestClient;

#[derive(Debug, Clone, Serialize)]
struct CreateServerRequest<'a> {
    name: &'a str,
}

/// Body of `POST /servers/{serverId}/rooms`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub group_name: &'a str,
}

impl RestClient {
    /// List the servers the viewer belongs to, each with the viewer's
    /// membership status attached.
    pub async fn servers(&self) -> Result<Vec<RoomsServer>> {
        self.get("/servers").await
    }

    /// Create a server owned by the viewer.
    pub async fn create_server(&self, name: &str) -> Result<RoomsServer> {
        self.post("/servers", &CreateServerRequest { name }).await
    }

    /// Join an existing server.
    pub async fn join_server(&self, server_id: ServerId) -> Result<RoomsServer> {
        self.post_empty(&format!("/servers/{server_id}")).await
    }

    /// List a server's rooms, each with the viewer's read status
    /// attached.
    pub async fn server_rooms(&self, server_id: ServerId) -> Result<Vec<Room>> {
        self.get(&format!("/servers/{server_id}/rooms")).await
    }

    /// Create a room inside a server.
    pub async fn create_room(
        &self,
        server_id: ServerId,
        request: &CreateRoomRequest<'_>,
    ) -> Result<Room> {
        self.post(&format!("/servers/{server_id}/rooms"), request)
            .await
    }
}
