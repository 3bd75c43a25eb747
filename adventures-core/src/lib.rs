//! Core rules for the adventures service.
//!
//! This crate holds everything the server needs apart from HTTP:
//! - `adventure`, `waypoint` and `user` records
//! - `policy` deciding who may do what to which adventure
//! - `store` for SQLite persistence
//! - `search` for bounding-box queries
//! - `service` with the lifecycle operations, each run as one transaction

pub mod adventure;
pub mod error;
pub mod listing;
pub mod policy;
pub mod search;
pub mod service;
pub mod store;
pub mod user;
pub mod waypoint;

pub use adventure::{Adventure, AdventureForm, AdventureId, Mode};
pub use error::{AdventureError, AdventureResult, ErrorKind};
pub use policy::{Action, Caller, authorize};
pub use search::SearchQuery;
pub use service::{Adventures, JoinOutcome, LeaveOutcome};
pub use store::Store;
pub use user::{Role, User, UserId};
pub use waypoint::{Marker, PointInput, Waypoint, WaypointSubmission};
