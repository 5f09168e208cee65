//! The per-session cache service.
//!
//! One explicit object owns every cache the client holds: the servers
//! list, per-server room lists, and per-room message stores.  It is
//! created once per application session, passed by reference to
//! whoever needs it, and cleared on logout.  There is deliberately no
//! process-wide singleton.

use std::collections::HashMap;

use causerie_shared::{MessageId, Room, RoomId, RoomsServer, ServerId};

use crate::cache::CollectionCache;
use crate::error::{Result, StoreError};
use crate::messages::RoomMessageStore;

#[derive(Debug, Default)]
pub struct CacheService {
    servers: Option<CollectionCache<RoomsServer>>,
    rooms: HashMap<ServerId, CollectionCache<Room>>,
    messages: HashMap<RoomId, RoomMessageStore>,
}

impl CacheService {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Servers
    // ------------------------------------------------------------------

    /// Seed the servers cache from a fetched list.
    pub fn set_servers(&mut self, servers: Vec<RoomsServer>) {
        self.servers = Some(CollectionCache::from_items(servers));
    }

    /// The cached servers.  `Err(NotLoaded)` until the first fetch
    /// lands; an empty slice afterwards genuinely means "no servers".
    pub fn servers(&self) -> Result<&[RoomsServer]> {
        self.servers
            .as_ref()
            .map(|cache| cache.items())
            .ok_or(StoreError::NotLoaded)
    }

    pub fn server(&self, server_id: ServerId) -> Result<&RoomsServer> {
        self.servers
            .as_ref()
            .ok_or(StoreError::NotLoaded)?
            .get(server_id)
            .ok_or(StoreError::NotFound)
    }

    /// Add a newly created or joined server to the cache.
    pub fn add_server(&mut self, server: RoomsServer) {
        self.servers
            .get_or_insert_with(CollectionCache::new)
            .add(server);
    }

    pub fn remove_server(&mut self, server_id: ServerId) {
        if let Some(cache) = self.servers.as_mut() {
            cache.remove(server_id);
        }
        self.rooms.remove(&server_id);
    }

    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// Seed a server's rooms cache from a fetched list.
    pub fn set_rooms(&mut self, server_id: ServerId, rooms: Vec<Room>) {
        self.rooms
            .insert(server_id, CollectionCache::from_items(rooms));
    }

    /// The cached rooms of a server, `Err(NotLoaded)` until fetched.
    pub fn rooms(&self, server_id: ServerId) -> Result<&[Room]> {
        self.rooms
            .get(&server_id)
            .map(|cache| cache.items())
            .ok_or(StoreError::NotLoaded)
    }

    /// Look a room up across every cached server.
    pub fn room(&self, room_id: RoomId) -> Result<&Room> {
        self.rooms
            .values()
            .find_map(|cache| cache.get(room_id))
            .ok_or(StoreError::NotFound)
    }

    pub fn add_room(&mut self, room: Room) {
        self.rooms
            .entry(room.server_id)
            .or_default()
            .add(room);
    }

    pub fn remove_room(&mut self, server_id: ServerId, room_id: RoomId) {
        if let Some(cache) = self.rooms.get_mut(&server_id) {
            cache.remove(room_id);
        }
        self.messages.remove(&room_id);
    }

    /// Optimistically patch a room's per-viewer status to mirror the
    /// local read marker.
    pub fn patch_room_status(
        &mut self,
        room_id: RoomId,
        last_read: Option<MessageId>,
        is_cleared: bool,
    ) -> bool {
        self.rooms.values_mut().any(|cache| {
            cache.patch(room_id, |room| {
                if let Some(status) = room.status.as_mut() {
                    status.last_read_msg_id = last_read;
                    status.is_cleared = is_cleared;
                }
            })
        })
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// The message store for a room, created on first use.
    pub fn messages_mut(&mut self, room_id: RoomId) -> &mut RoomMessageStore {
        self.messages
            .entry(room_id)
            .or_insert_with(|| RoomMessageStore::new(room_id))
    }

    pub fn messages(&self, room_id: RoomId) -> Option<&RoomMessageStore> {
        self.messages.get(&room_id)
    }

    pub fn invalidate_messages(&mut self, room_id: RoomId) {
        if let Some(store) = self.messages.get_mut(&room_id) {
            store.invalidate();
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Drop every cache.  Called on logout.
    pub fn clear(&mut self) {
        self.servers = None;
        self.rooms.clear();
        self.messages.clear();
    }
}
