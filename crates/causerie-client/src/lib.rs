//! # causerie-client
//!
//! Application wiring for the Causerie chat client core: the explicit
//! [`ClientState`] dependency container, the auth/session flow, and
//! the per-room [`RoomSession`] that merges the fetched history with
//! the live feed and tracks the viewer's read boundary.
//!
//! The View Composer (the UI shell) sits on top of this crate: it
//! drives [`RoomSession::next_event`], renders
//! [`RoomSession::messages`], and reports scroll-sentinel visibility
//! back in.

pub mod error;
pub mod events;
pub mod room;
pub mod session;
pub mod state;

pub use error::{ClientError, Result};
pub use events::ClientEvent;
pub use room::RoomSession;
pub use state::{ClientConfig, ClientState};

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise tracing for the client process.  Call once, early.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("causerie_client=debug,causerie_net=debug,causerie_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
