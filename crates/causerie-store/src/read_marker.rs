//! Read-position tracking and coalesced persistence.
//!
//! The [`ReadMarker`] owns the local "last read message" pointer for
//! one room, nothing else; the message list stays with the message
//! store.  Pointer updates apply locally at once (optimistic) and are
//! funneled through a `watch` channel to a single writer task, so at
//! most one persistence call per room is ever in flight and a newer
//! value supersedes any stale write still waiting to happen.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use causerie_shared::constants::{STATUS_RETRY_BASE_MS, STATUS_RETRY_MAX_MS};
use causerie_shared::{MessageId, MessageResponse, RoomId, RoomUserStatus};

/// What the view should do after a live message lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The viewer is snapped to the bottom sentinel: scroll to the new
    /// bottom.
    AutoScroll,
    /// The viewer has scrolled away: append only, keeping the unread
    /// boundary where the pointer last was.
    Append,
}

/// One pending pointer persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWrite {
    pub room_id: RoomId,
    pub last_read: MessageId,
}

/// Where pointer writes go.  The wiring layer implements this with a
/// `PATCH /rooms/{roomId}/status` call.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn persist_read_marker(&self, write: StatusWrite) -> anyhow::Result<()>;
}

/// The per-room read boundary tracker.
#[derive(Debug)]
pub struct ReadMarker {
    room_id: RoomId,
    last_read: Option<MessageId>,
    /// Whether the boundary follows new messages while the viewer is
    /// caught up (the server's `isCleared` semantics).
    is_cleared: bool,
    /// Whether the bottom sentinel is currently fully visible.
    at_bottom: bool,
    pending_tx: watch::Sender<Option<StatusWrite>>,
}

impl ReadMarker {
    /// Build a tracker seeded from the room's server-side status.
    /// Returns the watch receiver to hand to [`spawn_status_writer`].
    pub fn new(
        room_id: RoomId,
        status: Option<&RoomUserStatus>,
    ) -> (Self, watch::Receiver<Option<StatusWrite>>) {
        let (pending_tx, pending_rx) = watch::channel(None);
        let marker = Self {
            room_id,
            last_read: status.and_then(|s| s.last_read_msg_id),
            is_cleared: status.map(|s| s.is_cleared).unwrap_or(false),
            at_bottom: true,
            pending_tx,
        };
        (marker, pending_rx)
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// The current local pointer.  All messages at or before this id
    /// count as read.
    pub fn last_read(&self) -> Option<MessageId> {
        self.last_read
    }

    pub fn is_cleared(&self) -> bool {
        self.is_cleared
    }

    pub fn at_bottom(&self) -> bool {
        self.at_bottom
    }

    /// Feed the bottom sentinel's visibility signal in.  `true` only
    /// when the sentinel is fully visible.
    pub fn set_at_bottom(&mut self, at_bottom: bool) {
        self.at_bottom = at_bottom;
    }

    /// Mark everything up to `id` as read.  The local pointer moves
    /// immediately; persistence is coalesced.
    pub fn mark_read(&mut self, id: MessageId) -> bool {
        self.is_cleared = true;
        self.advance(id)
    }

    /// Mark `id` (and everything after it) as unread.  Turns the
    /// follow-the-bottom behavior off so the next arrival does not
    /// wipe the boundary the viewer just placed.
    pub fn mark_unread(&mut self, id: MessageId) -> bool {
        self.is_cleared = false;
        self.advance(id)
    }

    /// Decide what the view does with a freshly appended message, and
    /// advance the pointer when the viewer is caught up.
    pub fn on_append(&mut self, message: &MessageResponse) -> AppendOutcome {
        if self.at_bottom {
            if self.is_cleared {
                self.advance(message.id());
            }
            AppendOutcome::AutoScroll
        } else {
            AppendOutcome::Append
        }
    }

    /// The optimistic status patch mirroring the local state, for the
    /// rooms cache.
    pub fn status_patch(&self) -> (Option<MessageId>, bool) {
        (self.last_read, self.is_cleared)
    }

    fn advance(&mut self, id: MessageId) -> bool {
        // The server no-ops on unchanged values; skip the write before
        // it even leaves the client.
        if self.last_read == Some(id) {
            return false;
        }
        self.last_read = Some(id);
        let _ = self.pending_tx.send(Some(StatusWrite {
            room_id: self.room_id,
            last_read: id,
        }));
        true
    }
}

// ---------------------------------------------------------------------------
// Persistence writer
// ---------------------------------------------------------------------------

/// Spawn the single writer draining a marker's pending pointer writes.
///
/// Rapid updates collapse onto the newest value before it is read; a
/// failed write retries with capped exponential backoff and is
/// abandoned only when a newer value supersedes it.  The task ends
/// when the marker (the watch sender) is dropped.
pub fn spawn_status_writer(
    mut pending_rx: watch::Receiver<Option<StatusWrite>>,
    sink: Arc<dyn StatusSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if pending_rx.changed().await.is_err() {
                return;
            }
            let Some(mut write) = *pending_rx.borrow_and_update() else {
                continue;
            };

            let mut attempt: u32 = 0;
            loop {
                match sink.persist_read_marker(write).await {
                    Ok(()) => {
                        debug!(room = %write.room_id, last_read = %write.last_read, "Read marker persisted");
                        break;
                    }
                    Err(e) => {
                        attempt += 1;
                        let delay = retry_delay(attempt);
                        warn!(
                            room = %write.room_id,
                            attempt,
                            error = %e,
                            "Failed to persist read marker, backing off"
                        );
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            changed = pending_rx.changed() => {
                                if changed.is_err() {
                                    return;
                                }
                                if let Some(newer) = *pending_rx.borrow_and_update() {
                                    if newer != write {
                                        write = newer;
                                        attempt = 0;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

fn retry_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(4);
    let ms = (STATUS_RETRY_BASE_MS << exp).min(STATUS_RETRY_MAX_MS);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use causerie_shared::{Message, ServerId, User, UserId};
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    fn message(room_id: RoomId) -> MessageResponse {
        let author = User {
            id: UserId::new(),
            username: "ada".to_string(),
            created_at: Utc.timestamp_opt(1_000, 0).unwrap(),
            updated_at: Utc.timestamp_opt(1_000, 0).unwrap(),
        };
        MessageResponse {
            message: Message {
                id: MessageId::new(),
                author_id: author.id,
                room_id,
                server_id: ServerId::new(),
                content: "hi".to_string(),
                created_at: Utc.timestamp_opt(2_000, 0).unwrap(),
                updated_at: Utc.timestamp_opt(2_000, 0).unwrap(),
            },
            author,
        }
    }

    /// Records every successful write; optionally fails the first N.
    struct RecordingSink {
        writes: Mutex<Vec<StatusWrite>>,
        fail_first: Mutex<u32>,
        notify: Notify,
    }

    impl RecordingSink {
        fn new(fail_first: u32) -> Arc<Self> {
            Arc::new(Self {
                writes: Mutex::new(Vec::new()),
                fail_first: Mutex::new(fail_first),
                notify: Notify::new(),
            })
        }

        fn writes(&self) -> Vec<StatusWrite> {
            self.writes.lock().unwrap().clone()
        }

        async fn wait_for_write(&self) {
            self.notify.notified().await;
        }
    }

    #[async_trait]
    impl StatusSink for RecordingSink {
        async fn persist_read_marker(&self, write: StatusWrite) -> anyhow::Result<()> {
            {
                let mut remaining = self.fail_first.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    anyhow::bail!("injected failure");
                }
            }
            self.writes.lock().unwrap().push(write);
            self.notify.notify_one();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_rapid_updates_coalesce_into_one_write() {
        let room = RoomId::new();
        let (mut marker, rx) = ReadMarker::new(room, None);
        let sink = RecordingSink::new(0);

        // Five updates land before the writer task ever runs.
        let ids: Vec<MessageId> = (0..5).map(|_| MessageId::new()).collect();
        for id in &ids {
            assert!(marker.mark_read(*id));
        }
        assert_eq!(marker.last_read(), Some(ids[4]));

        let writer = spawn_status_writer(rx, sink.clone());
        sink.wait_for_write().await;

        assert_eq!(
            sink.writes(),
            vec![StatusWrite {
                room_id: room,
                last_read: ids[4],
            }]
        );

        drop(marker);
        writer.await.unwrap();
        // Nothing else got written after the marker went away.
        assert_eq!(sink.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_unread_moves_pointer_and_persists_once() {
        let room = RoomId::new();
        let m1 = MessageId::new();
        let m3 = MessageId::new();

        let status = RoomUserStatus {
            id: "status-1".to_string(),
            user_id: UserId::new(),
            room_id: room,
            last_read_msg_id: Some(m3),
            is_cleared: true,
        };
        let (mut marker, rx) = ReadMarker::new(room, Some(&status));
        assert_eq!(marker.last_read(), Some(m3));

        let sink = RecordingSink::new(0);
        let writer = spawn_status_writer(rx, sink.clone());

        assert!(marker.mark_unread(m1));
        // The local pointer moves before the write lands.
        assert_eq!(marker.last_read(), Some(m1));
        assert!(!marker.is_cleared());

        sink.wait_for_write().await;
        assert_eq!(
            sink.writes(),
            vec![StatusWrite {
                room_id: room,
                last_read: m1,
            }]
        );

        drop(marker);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_unchanged_pointer_is_skipped() {
        let room = RoomId::new();
        let (mut marker, rx) = ReadMarker::new(room, None);
        let id = MessageId::new();

        assert!(marker.mark_read(id));
        assert!(!marker.mark_read(id));

        let sink = RecordingSink::new(0);
        let writer = spawn_status_writer(rx, sink.clone());
        sink.wait_for_write().await;

        drop(marker);
        writer.await.unwrap();
        assert_eq!(sink.writes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_retries_then_newer_value_supersedes() {
        let room = RoomId::new();
        let (mut marker, rx) = ReadMarker::new(room, None);
        // Fail enough attempts to outlast the first value.
        let sink = RecordingSink::new(3);
        let writer = spawn_status_writer(rx, sink.clone());

        let v1 = MessageId::new();
        let v2 = MessageId::new();
        marker.mark_read(v1);

        // Let the writer fail and enter its backoff at least once,
        // then supersede the pending value.
        tokio::time::sleep(Duration::from_millis(700)).await;
        marker.mark_read(v2);

        sink.wait_for_write().await;
        let writes = sink.writes();
        assert_eq!(writes.last().unwrap().last_read, v2);
        assert!(writes.iter().all(|w| w.last_read != v1));

        drop(marker);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_append_at_bottom_autoscrolls_and_tracks() {
        let room = RoomId::new();
        let (mut marker, _rx) = ReadMarker::new(room, None);
        marker.set_at_bottom(true);
        let msg = message(room);

        // Not cleared yet: the pointer stays put even at the bottom.
        assert_eq!(marker.on_append(&msg), AppendOutcome::AutoScroll);
        assert_eq!(marker.last_read(), None);

        marker.mark_read(msg.id());
        let next = message(room);
        assert_eq!(marker.on_append(&next), AppendOutcome::AutoScroll);
        assert_eq!(marker.last_read(), Some(next.id()));
    }

    #[tokio::test]
    async fn test_append_away_from_bottom_keeps_the_boundary() {
        let room = RoomId::new();
        let boundary = MessageId::new();
        let status = RoomUserStatus {
            id: "status-1".to_string(),
            user_id: UserId::new(),
            room_id: room,
            last_read_msg_id: Some(boundary),
            is_cleared: true,
        };
        let (mut marker, _rx) = ReadMarker::new(room, Some(&status));
        marker.set_at_bottom(false);

        let msg = message(room);
        assert_eq!(marker.on_append(&msg), AppendOutcome::Append);
        // The unread boundary stays where it was recorded.
        assert_eq!(marker.last_read(), Some(boundary));
    }
}
