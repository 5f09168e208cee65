//! # causerie-shared
//!
//! Domain types, wire models, and the error taxonomy shared by every
//! Causerie crate.  The structs here mirror the backend's JSON shapes
//! exactly (camelCase fields, unix-second timestamps) so they can be
//! handed straight to serde on both the REST and WebSocket paths.

pub mod constants;
pub mod error;
pub mod models;
pub mod protocol;
pub mod types;

pub use error::{AuthErrorCode, ErrorResponse, RequestError};
pub use models::*;
pub use types::{MessageId, RoomId, RoomType, ServerId, UserId};
