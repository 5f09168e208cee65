//! # causerie-store
//!
//! Client-side cache layer: the generic keyed collection cache, the
//! per-session [`CacheService`], the per-room message store that merges
//! the fetched snapshot with the live feed buffer, and the
//! read-position tracker with coalesced persistence.
//!
//! Nothing here touches the network; persistence goes through the
//! [`StatusSink`] seam the wiring layer implements.

pub mod cache;
pub mod error;
pub mod messages;
pub mod read_marker;
pub mod service;

pub use cache::{CollectionCache, Keyed};
pub use error::{Result, StoreError};
pub use messages::{MergedView, RoomMessageStore, SnapshotState};
pub use read_marker::{
    spawn_status_writer, AppendOutcome, ReadMarker, StatusSink, StatusWrite,
};
pub use service::CacheService;
