//! Per-room live feed subscriber.
//!
//! Each active room gets one WebSocket connection, driven by a
//! dedicated tokio task.  External code talks to the task through a
//! typed command channel and receives decoded domain events back,
//! keeping the networking fully asynchronous and decoupled.
//!
//! Connection lifecycle: `Connecting → Open → (Closed | Reconnecting)
//! → Open | Terminated`.  Reconnecting always dials a fresh connection
//! for the same room; connections are never reused across rooms.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tracing::{debug, info, warn};

use causerie_shared::constants::{API_PREFIX, FEED_RECONNECT_BASE_MS, FEED_RECONNECT_MAX_MS};
use causerie_shared::protocol::{decode_inbound, OutboundFrame};
use causerie_shared::{MessageResponse, RoomId};

// ---------------------------------------------------------------------------
// Command / event types
// ---------------------------------------------------------------------------

/// Commands sent *into* the feed task.
#[derive(Debug)]
pub enum FeedCommand {
    /// Send a user-authored message over the feed.  No local echo is
    /// synthesized; the message appears when the server reflects it
    /// back through the inbound stream.
    Send { content: String },
    /// Request a snapshot of the feed counters.
    Stats(oneshot::Sender<FeedStats>),
    /// Gracefully tear the connection down.
    Shutdown,
}

/// Events sent *from* the feed task to the application.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// The connection is established; only events emitted after this
    /// point are delivered (no backlog replay).
    Open,
    /// A decoded inbound message.
    Message(MessageResponse),
    /// The connection dropped; a fresh one is being dialed.
    Reconnecting { attempt: u32 },
    /// The connection closed and will not be redialed.
    Closed { reason: String },
    /// Shut down on request; the task is gone.
    Terminated,
}

/// Connection lifecycle states, as the subscriber reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Connecting,
    Open,
    Reconnecting,
    Closed,
    Terminated,
}

impl FeedEvent {
    /// The lifecycle state this event puts the subscription in.
    pub fn state(&self) -> FeedState {
        match self {
            FeedEvent::Open | FeedEvent::Message(_) => FeedState::Open,
            FeedEvent::Reconnecting { .. } => FeedState::Reconnecting,
            FeedEvent::Closed { .. } => FeedState::Closed,
            FeedEvent::Terminated => FeedState::Terminated,
        }
    }
}

/// Feed counters, readable via [`FeedCommand::Stats`].
#[derive(Debug, Clone, Default)]
pub struct FeedStats {
    /// Inbound frames dropped because they failed to decode.
    pub decode_failures: u64,
    /// Messages decoded and delivered.
    pub messages: u64,
    /// Fresh connections dialed after a drop.
    pub reconnects: u32,
}

/// Configuration for spawning a feed subscription.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// WebSocket origin, e.g. `ws://localhost:8080`.
    pub ws_base: String,
    /// The room this subscription is scoped to.
    pub room_id: RoomId,
    /// Bearer credential, passed as a query parameter.
    pub token: Option<String>,
    /// Whether a dropped connection is redialed.
    pub reconnect: bool,
}

impl FeedConfig {
    pub fn new(ws_base: impl Into<String>, room_id: RoomId, token: Option<String>) -> Self {
        Self {
            ws_base: ws_base.into(),
            room_id,
            token,
            reconnect: true,
        }
    }

    fn feed_url(&self) -> String {
        let base = self.ws_base.trim_end_matches('/');
        match &self.token {
            Some(token) => format!("{base}{API_PREFIX}/rooms/{}?jwt={token}", self.room_id),
            None => format!("{base}{API_PREFIX}/rooms/{}", self.room_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Spawn
// ---------------------------------------------------------------------------

/// Spawn the feed task for one room.
///
/// Returns channels for sending commands and receiving events.  The
/// task connects after spawning and reports [`FeedEvent::Open`] once
/// the connection is established.  Dropping the command sender is
/// equivalent to [`FeedCommand::Shutdown`].
pub fn spawn_feed(config: FeedConfig) -> (mpsc::Sender<FeedCommand>, mpsc::Receiver<FeedEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = mpsc::channel(64);

    tokio::spawn(run_feed(config, cmd_rx, event_tx));

    (cmd_tx, event_rx)
}

/// Why the per-connection loop ended.
enum ConnExit {
    /// The transport dropped out from under us.
    Lost(String),
    /// Shutdown was requested (or every handle was dropped).
    Terminated,
}

async fn run_feed(
    config: FeedConfig,
    mut cmd_rx: mpsc::Receiver<FeedCommand>,
    event_tx: mpsc::Sender<FeedEvent>,
) {
    let url = config.feed_url();
    let mut stats = FeedStats::default();
    let mut attempt: u32 = 0;

    loop {
        debug!(room = %config.room_id, "Connecting to room feed");
        let mut ws = match connect_async(url.as_str()).await {
            Ok((ws, _)) => ws,
            Err(e) => {
                if !retry(&config, &event_tx, &mut stats, &mut attempt, e.to_string()).await {
                    return;
                }
                continue;
            }
        };

        attempt = 0;
        info!(room = %config.room_id, "Room feed open");
        if event_tx.send(FeedEvent::Open).await.is_err() {
            return;
        }

        let exit = loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(FeedCommand::Send { content }) => {
                        let frame = match OutboundFrame::new(content).to_json() {
                            Ok(text) => text,
                            Err(e) => {
                                warn!(room = %config.room_id, error = %e, "Failed to encode outbound frame");
                                continue;
                            }
                        };
                        if let Err(e) = ws.send(WsMessage::Text(frame)).await {
                            break ConnExit::Lost(e.to_string());
                        }
                    }
                    Some(FeedCommand::Stats(reply)) => {
                        let _ = reply.send(stats.clone());
                    }
                    Some(FeedCommand::Shutdown) | None => break ConnExit::Terminated,
                },
                frame = ws.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => match decode_inbound(&text) {
                        Ok(msg) => {
                            stats.messages += 1;
                            if event_tx.send(FeedEvent::Message(msg)).await.is_err() {
                                break ConnExit::Terminated;
                            }
                        }
                        // Malformed frames are dropped and counted;
                        // the connection stays open.
                        Err(e) => {
                            stats.decode_failures += 1;
                            warn!(room = %config.room_id, error = %e, "Dropping malformed feed frame");
                        }
                    },
                    Some(Ok(WsMessage::Ping(payload))) => {
                        if let Err(e) = ws.send(WsMessage::Pong(payload)).await {
                            break ConnExit::Lost(e.to_string());
                        }
                    }
                    Some(Ok(WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                    Some(Ok(WsMessage::Binary(_))) => {
                        stats.decode_failures += 1;
                        warn!(room = %config.room_id, "Dropping non-text feed frame");
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        break ConnExit::Lost("connection closed by server".to_string());
                    }
                    Some(Err(e)) => break ConnExit::Lost(e.to_string()),
                },
            }
        };

        match exit {
            ConnExit::Terminated => {
                let _ = ws.close(None).await;
                debug!(room = %config.room_id, "Room feed terminated");
                let _ = event_tx.send(FeedEvent::Terminated).await;
                return;
            }
            ConnExit::Lost(reason) => {
                if !retry(&config, &event_tx, &mut stats, &mut attempt, reason).await {
                    return;
                }
            }
        }
    }
}

/// Announce the drop and wait out the backoff.  Returns `false` when
/// the feed should stop instead of redialing.
async fn retry(
    config: &FeedConfig,
    event_tx: &mpsc::Sender<FeedEvent>,
    stats: &mut FeedStats,
    attempt: &mut u32,
    reason: String,
) -> bool {
    if !config.reconnect {
        warn!(room = %config.room_id, reason = %reason, "Room feed closed");
        let _ = event_tx.send(FeedEvent::Closed { reason }).await;
        return false;
    }

    *attempt += 1;
    stats.reconnects += 1;
    warn!(
        room = %config.room_id,
        attempt = *attempt,
        reason = %reason,
        "Room feed lost, redialing"
    );
    if event_tx
        .send(FeedEvent::Reconnecting { attempt: *attempt })
        .await
        .is_err()
    {
        return false;
    }

    tokio::time::sleep(reconnect_delay(*attempt)).await;
    true
}

fn reconnect_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(5);
    let ms = (FEED_RECONNECT_BASE_MS << exp).min(FEED_RECONNECT_MAX_MS);
    Duration::from_millis(ms)
}
