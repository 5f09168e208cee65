//! Typed events the View Composer consumes.

use causerie_net::FeedState;
use causerie_shared::MessageResponse;

/// What a [`RoomSession`](crate::RoomSession) hands the UI, one per
/// [`next_event`](crate::RoomSession::next_event) call.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A live message landed in the merged view.  `auto_scroll` is set
    /// when the viewer was snapped to the bottom sentinel at the
    /// moment of the append and the view should follow.
    Message {
        message: MessageResponse,
        auto_scroll: bool,
    },

    /// The feed's connection lifecycle moved.
    Feed { state: FeedState },

    /// Top-level failure boundary: something unexpected happened in a
    /// background task.  Distinct from the handled error taxonomy —
    /// anything here is a bug or an environment failure, not a state
    /// the UI is supposed to model.
    Fault { context: String, detail: String },
}
