//! # roomwatch
//!
//! Polls the list of online rooms and raises a one-shot notification when a
//! watched full room gets a free slot.
//!
//! A user marks full rooms as watched. Every poll replaces the room
//! snapshot and reconciles the watch set against it: each watched room
//! that now has fewer members than its capacity fires exactly one
//! notification and leaves the set. Toggling a watch reconciles at once
//! against the snapshot already held.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, SSE)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── WatchHandle ──► engine task (service/)
//!     │                      │
//!     │     poller task ─────┤
//!     │     (source/)        │
//!     │                      ├── RoomSnapshotStore (domain/)
//!     │                      ├── WatchRegistry (domain/)
//!     │                      └── NotificationGateway (notify/)
//!     │
//!     └── EventBus (domain/) ──► SSE
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod service;
pub mod source;
