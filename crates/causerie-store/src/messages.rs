//! Per-room message store.
//!
//! Holds the one-shot fetched snapshot and the live-appended buffer
//! for a room, and derives the merged, de-duplicated, time-ordered
//! view the View Composer renders.

use std::collections::HashMap;

use tracing::warn;

use causerie_shared::{MessageId, MessageResponse, RequestError, RoomId};

/// The snapshot fetch outcome.  `Failed` is deliberately distinct from
/// an empty `Loaded` list so the UI can tell "no messages yet" from
/// "failed to load".
#[derive(Debug, Clone)]
pub enum SnapshotState {
    NotLoaded,
    Failed(RequestError),
    Loaded(Vec<MessageResponse>),
}

/// The derived view over snapshot + live buffer.
#[derive(Debug, Clone)]
pub enum MergedView {
    /// The snapshot has not arrived yet.
    NotLoaded,
    /// The snapshot fetch failed.
    Failed(RequestError),
    /// The merged, de-duplicated, `(created_at, id)`-ordered sequence.
    Ready(Vec<MessageResponse>),
}

impl MergedView {
    pub fn messages(&self) -> Option<&[MessageResponse]> {
        match self {
            MergedView::Ready(messages) => Some(messages),
            _ => None,
        }
    }
}

/// The authoritative message state for one room.
#[derive(Debug)]
pub struct RoomMessageStore {
    room_id: RoomId,
    snapshot: SnapshotState,
    /// Live-appended messages in arrival order.  A feed subscription
    /// can outlive a logical room scope, so entries are filtered to
    /// this room at merge time rather than at append time.
    live: Vec<MessageResponse>,
}

impl RoomMessageStore {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            snapshot: SnapshotState::NotLoaded,
            live: Vec::new(),
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn snapshot(&self) -> &SnapshotState {
        &self.snapshot
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.snapshot, SnapshotState::Loaded(_))
    }

    /// Apply a fetched snapshot.  The response carries the room it was
    /// requested for; a stale response tagged with another room id is
    /// ignored so late completions can never leak into the wrong room.
    pub fn apply_snapshot(&mut self, room_id: RoomId, messages: Vec<MessageResponse>) -> bool {
        if room_id != self.room_id {
            warn!(
                expected = %self.room_id,
                got = %room_id,
                "Ignoring stale snapshot for another room"
            );
            return false;
        }
        self.snapshot = SnapshotState::Loaded(messages);
        true
    }

    /// Record a failed snapshot fetch, under the same stale guard.
    pub fn apply_snapshot_failure(&mut self, room_id: RoomId, err: RequestError) -> bool {
        if room_id != self.room_id {
            warn!(
                expected = %self.room_id,
                got = %room_id,
                "Ignoring stale snapshot failure for another room"
            );
            return false;
        }
        self.snapshot = SnapshotState::Failed(err);
        true
    }

    /// Append a live message in arrival order.  A message whose id is
    /// already buffered replaces the buffered copy in place.
    pub fn append_live(&mut self, message: MessageResponse) {
        match self.live.iter().position(|m| m.id() == message.id()) {
            Some(i) => self.live[i] = message,
            None => self.live.push(message),
        }
    }

    /// The number of buffered live messages (all rooms).
    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// Derive the merged view: snapshot then buffer, buffer filtered
    /// to this room, de-duplicated by id with the buffer copy winning
    /// (it is the complete, author-resolved one), ordered by
    /// `(created_at, id)`.
    pub fn merged_view(&self) -> MergedView {
        let snapshot = match &self.snapshot {
            SnapshotState::NotLoaded => return MergedView::NotLoaded,
            SnapshotState::Failed(err) => return MergedView::Failed(err.clone()),
            SnapshotState::Loaded(messages) => messages,
        };

        let live = self.live.iter().filter(|m| m.room_id() == self.room_id);

        let mut positions: HashMap<MessageId, usize> = HashMap::new();
        let mut merged: Vec<MessageResponse> = Vec::with_capacity(snapshot.len());
        for message in snapshot.iter().chain(live) {
            match positions.get(&message.id()) {
                // A later copy of the same id wins in place, which is
                // exactly "the buffer copy wins" for snapshot/buffer
                // overlaps.
                Some(&i) => merged[i] = message.clone(),
                None => {
                    positions.insert(message.id(), merged.len());
                    merged.push(message.clone());
                }
            }
        }

        merged.sort_by_key(|m| m.ordering_key());
        MergedView::Ready(merged)
    }

    /// Drop everything so the next fetch starts clean.
    pub fn invalidate(&mut self) {
        self.snapshot = SnapshotState::NotLoaded;
        self.live.clear();
    }
}
