//! Auth flow and cache bootstrap.
//!
//! Thin async operations over [`ClientState`]: each one talks to the
//! backend through the transport adapter and seeds the cache service
//! with the result.

use tracing::info;

use causerie_shared::{Room, RoomId, RoomType, RoomsServer, ServerId, User};

use causerie_net::servers::CreateRoomRequest;

use crate::error::Result;
use crate::state::ClientState;

impl ClientState {
    /// Create a session.  The transport adapter persists the returned
    /// bearer credential; subsequent calls carry it automatically.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<User> {
        let user = self.rest().login(username, password).await?;
        info!(user = %user.username, "Logged in");
        self.set_current_user(Some(user.clone()));
        Ok(user)
    }

    /// Session check against the stored credential.  `Ok(false)` is
    /// the recoverable unauthenticated state: the stored token is
    /// missing, expired, or not attached to a valid user, and the UI
    /// should route to the login entry point.
    pub async fn restore_session(&mut self) -> Result<bool> {
        match self.rest().current_user().await? {
            Some(user) => {
                info!(user = %user.username, "Session restored");
                self.set_current_user(Some(user));
                Ok(true)
            }
            None => {
                self.set_current_user(None);
                Ok(false)
            }
        }
    }

    /// End the session: drop the credential and every cache.
    pub fn logout(&mut self) -> Result<()> {
        self.rest().tokens().clear()?;
        self.caches()?.clear();
        self.set_current_user(None);
        info!("Logged out");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cache bootstrap
    // ------------------------------------------------------------------

    /// Fetch the viewer's servers and seed the cache.
    pub async fn load_servers(&self) -> Result<()> {
        let servers = self.rest().servers().await?;
        self.caches()?.set_servers(servers);
        Ok(())
    }

    /// Fetch a server's rooms (with the viewer's read status) and seed
    /// the cache.
    pub async fn load_rooms(&self, server_id: ServerId) -> Result<()> {
        let rooms = self.rest().server_rooms(server_id).await?;
        self.caches()?.set_rooms(server_id, rooms);
        Ok(())
    }

    /// Create a server and cache it.
    pub async fn create_server(&self, name: &str) -> Result<RoomsServer> {
        let server = self.rest().create_server(name).await?;
        self.caches()?.add_server(server.clone());
        Ok(server)
    }

    /// Join a server and cache it.
    pub async fn join_server(&self, server_id: ServerId) -> Result<RoomsServer> {
        let server = self.rest().join_server(server_id).await?;
        self.caches()?.add_server(server.clone());
        Ok(server)
    }

    /// Create a room inside a server and cache it.
    pub async fn create_room(
        &self,
        server_id: ServerId,
        name: &str,
        room_type: RoomType,
        group_name: &str,
    ) -> Result<Room> {
        let room = self
            .rest()
            .create_room(
                server_id,
                &CreateRoomRequest {
                    name,
                    room_type,
                    group_name,
                },
            )
            .await?;
        self.caches()?.add_room(room.clone());
        Ok(room)
    }

    /// Look a cached room up; missing entities surface as a typed
    /// not-found state, never a panic.
    pub fn room(&self, room_id: RoomId) -> Result<Room> {
        Ok(self.caches()?.room(room_id)?.clone())
    }
}
