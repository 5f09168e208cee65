//! Per-room session orchestration.
//!
//! A [`RoomSession`] owns one room's live feed subscription and read
//! marker, and funnels feed events into the shared cache service.  The
//! open sequence subscribes *first* and fetches the snapshot *after*
//! the feed reports `Open`, so a message created between the two can
//! only ever show up twice (and be de-duplicated), never be missed.
//!
//! Dropping the session closes the feed connection; a new room always
//! gets a fresh session with a fresh connection.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use causerie_net::{
    spawn_feed, FeedCommand, FeedConfig, FeedEvent, FeedState, FeedStats, NetError, RestClient,
};
use causerie_shared::constants::FEED_OPEN_TIMEOUT_SECS;
use causerie_shared::error::codes;
use causerie_shared::{MessageId, RequestError, RoomId};
use causerie_store::{
    spawn_status_writer, AppendOutcome, CacheService, MergedView, ReadMarker, StatusSink,
    StatusWrite,
};

use crate::error::{ClientError, Result};
use crate::events::ClientEvent;
use crate::state::ClientState;

/// Persists read markers through the transport adapter.
struct RestStatusSink {
    rest: Arc<RestClient>,
}

#[async_trait]
impl StatusSink for RestStatusSink {
    async fn persist_read_marker(&self, write: StatusWrite) -> anyhow::Result<()> {
        self.rest
            .update_room_status(write.room_id, write.last_read)
            .await?;
        Ok(())
    }
}

/// One active room: feed subscription, read marker, event pump.
pub struct RoomSession {
    room_id: RoomId,
    caches: Arc<Mutex<CacheService>>,
    feed_tx: mpsc::Sender<FeedCommand>,
    feed_rx: mpsc::Receiver<FeedEvent>,
    feed_state: FeedState,
    marker: ReadMarker,
    writer: JoinHandle<()>,
    /// Set once the feed reported a terminal state, so an abrupt
    /// stream end can be told apart from a requested one.
    saw_terminal: bool,
}

impl ClientState {
    /// Open a session for a cached room.  Requires the room's server
    /// rooms to be loaded; an unknown id is a typed not-found.
    pub async fn open_room(&self, room_id: RoomId) -> Result<RoomSession> {
        let status = self.caches()?.room(room_id)?.status.clone();

        RoomSession::open(
            self.rest().clone(),
            self.caches_handle(),
            self.ws_base_url(),
            room_id,
            status.as_ref(),
        )
        .await
    }
}

impl RoomSession {
    pub(crate) async fn open(
        rest: Arc<RestClient>,
        caches: Arc<Mutex<CacheService>>,
        ws_base: &str,
        room_id: RoomId,
        status: Option<&causerie_shared::RoomUserStatus>,
    ) -> Result<Self> {
        // Subscribe before fetching: anything created from here on
        // arrives over the feed, and the merge de-duplicates whatever
        // the snapshot also contains.
        let token = rest.tokens().load();
        let (feed_tx, mut feed_rx) = spawn_feed(FeedConfig::new(ws_base, room_id, token));

        wait_for_open(&mut feed_rx).await?;

        match rest.room_messages(room_id).await {
            Ok(messages) => {
                lock(&caches)?
                    .messages_mut(room_id)
                    .apply_snapshot(room_id, messages);
            }
            Err(e) => {
                // Keep the distinguishable failed state; status 0
                // marks a transport-level failure with no HTTP status.
                let err = match e {
                    NetError::Request(err) => err,
                    other => RequestError::new(0, codes::INTERNAL_SERVER_ERROR, Some(other.to_string())),
                };
                warn!(room = %room_id, error = %err, "Snapshot fetch failed");
                lock(&caches)?
                    .messages_mut(room_id)
                    .apply_snapshot_failure(room_id, err);
            }
        }

        let (marker, pending_rx) = ReadMarker::new(room_id, status);
        let writer = spawn_status_writer(pending_rx, Arc::new(RestStatusSink { rest }));

        debug!(room = %room_id, "Room session open");
        Ok(Self {
            room_id,
            caches,
            feed_tx,
            feed_rx,
            feed_state: FeedState::Open,
            marker,
            writer,
            saw_terminal: false,
        })
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn feed_state(&self) -> FeedState {
        self.feed_state
    }

    /// The merged, de-duplicated, ordered view for this room.
    pub fn messages(&self) -> Result<MergedView> {
        Ok(lock(&self.caches)?
            .messages_mut(self.room_id)
            .merged_view())
    }

    /// The local read boundary.  Render the unread marker after this
    /// message.
    pub fn read_boundary(&self) -> Option<MessageId> {
        self.marker.last_read()
    }

    /// Pump the next feed event into the caches and hand the UI its
    /// event.  Returns `None` when the session is over.
    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        let event = match self.feed_rx.recv().await {
            Some(event) => event,
            None => {
                if self.saw_terminal {
                    return None;
                }
                // The feed task died without saying goodbye; this is
                // the unexpected-failure boundary, not a modeled state.
                self.saw_terminal = true;
                return Some(ClientEvent::Fault {
                    context: "room feed".to_string(),
                    detail: "event stream ended unexpectedly".to_string(),
                });
            }
        };

        self.feed_state = event.state();
        match event {
            FeedEvent::Message(message) => {
                let auto_scroll = match lock(&self.caches) {
                    Ok(mut caches) => {
                        caches.messages_mut(self.room_id).append_live(message.clone());

                        if message.room_id() == self.room_id {
                            let outcome = self.marker.on_append(&message);
                            let (last_read, is_cleared) = self.marker.status_patch();
                            caches.patch_room_status(self.room_id, last_read, is_cleared);
                            outcome == AppendOutcome::AutoScroll
                        } else {
                            false
                        }
                    }
                    Err(_) => {
                        return Some(ClientEvent::Fault {
                            context: "cache service".to_string(),
                            detail: "lock poisoned".to_string(),
                        })
                    }
                };

                Some(ClientEvent::Message {
                    message,
                    auto_scroll,
                })
            }
            FeedEvent::Open => Some(ClientEvent::Feed {
                state: FeedState::Open,
            }),
            FeedEvent::Reconnecting { attempt } => {
                debug!(room = %self.room_id, attempt, "Feed reconnecting");
                Some(ClientEvent::Feed {
                    state: FeedState::Reconnecting,
                })
            }
            FeedEvent::Closed { reason } => {
                warn!(room = %self.room_id, reason = %reason, "Feed closed");
                self.saw_terminal = true;
                Some(ClientEvent::Feed {
                    state: FeedState::Closed,
                })
            }
            FeedEvent::Terminated => {
                self.saw_terminal = true;
                Some(ClientEvent::Feed {
                    state: FeedState::Terminated,
                })
            }
        }
    }

    /// Send a user-authored message.  No local echo: it renders when
    /// the server reflects it back through the feed.
    pub async fn send(&self, content: impl Into<String>) -> Result<()> {
        self.feed_tx
            .send(FeedCommand::Send {
                content: content.into(),
            })
            .await
            .map_err(|_| ClientError::FeedClosed("command channel closed".to_string()))
    }

    /// Report the bottom sentinel's visibility.  `true` only when it
    /// is fully visible.
    pub fn set_at_bottom(&mut self, at_bottom: bool) {
        self.marker.set_at_bottom(at_bottom);
    }

    /// Mark everything up to `id` as read.  The pointer moves
    /// immediately; the network write is coalesced.
    pub fn mark_read(&mut self, id: MessageId) -> Result<()> {
        if self.marker.mark_read(id) {
            self.mirror_marker()?;
        }
        Ok(())
    }

    /// Mark `id` and everything after it as unread.
    pub fn mark_unread(&mut self, id: MessageId) -> Result<()> {
        if self.marker.mark_unread(id) {
            self.mirror_marker()?;
        }
        Ok(())
    }

    fn mirror_marker(&self) -> Result<()> {
        let (last_read, is_cleared) = self.marker.status_patch();
        lock(&self.caches)?.patch_room_status(self.room_id, last_read, is_cleared);
        Ok(())
    }

    /// Feed counters, for observability.
    pub async fn feed_stats(&self) -> Result<FeedStats> {
        let (tx, rx) = oneshot::channel();
        self.feed_tx
            .send(FeedCommand::Stats(tx))
            .await
            .map_err(|_| ClientError::FeedClosed("command channel closed".to_string()))?;
        rx.await
            .map_err(|_| ClientError::FeedClosed("feed task gone".to_string()))
    }

    /// Graceful teardown: close the connection and wait the tasks out.
    pub async fn close(mut self) {
        let _ = self.feed_tx.send(FeedCommand::Shutdown).await;
        while let Some(event) = self.feed_rx.recv().await {
            if matches!(event, FeedEvent::Terminated) {
                break;
            }
        }
        let RoomSession { marker, writer, .. } = self;
        // Dropping the marker ends the status writer.
        drop(marker);
        let _ = writer.await;
    }
}

fn lock(caches: &Arc<Mutex<CacheService>>) -> Result<std::sync::MutexGuard<'_, CacheService>> {
    caches.lock().map_err(|_| ClientError::Poisoned)
}

async fn wait_for_open(feed_rx: &mut mpsc::Receiver<FeedEvent>) -> Result<()> {
    let deadline = Duration::from_secs(FEED_OPEN_TIMEOUT_SECS);
    let wait = async {
        while let Some(event) = feed_rx.recv().await {
            match event {
                FeedEvent::Open => return Ok(()),
                FeedEvent::Reconnecting { .. } => continue,
                FeedEvent::Closed { reason } => return Err(ClientError::FeedClosed(reason)),
                FeedEvent::Terminated => {
                    return Err(ClientError::FeedClosed("terminated".to_string()))
                }
                FeedEvent::Message(_) => continue,
            }
        }
        Err(ClientError::FeedClosed("event stream ended".to_string()))
    };

    match tokio::time::timeout(deadline, wait).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::FeedTimeout),
    }
}
