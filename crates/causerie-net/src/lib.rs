//! # causerie-net
//!
//! Networking layer: the stateless REST transport adapter, the bearer
//! credential store, and the per-room WebSocket live feed subscriber.
//! Typed endpoint wrappers live in per-entity modules as `impl` blocks
//! on [`RestClient`].

pub mod error;
pub mod feed;
pub mod rest;
pub mod rooms;
pub mod servers;
pub mod session;
pub mod token;

pub use error::{NetError, Result};
pub use feed::{spawn_feed, FeedCommand, FeedConfig, FeedEvent, FeedState, FeedStats};
pub use rest::{RestClient, RestConfig};
pub use session::SessionResponse;
pub use token::TokenStore;
