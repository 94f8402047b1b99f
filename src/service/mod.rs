//! Service layer: the watch engine and the runtime that schedules it.
//!
//! [`WatchEngine`] owns the snapshot store, the watch registry and the
//! notification gateway. [`WatchRuntime`] drives it from a poller task and
//! a command queue, and hands out [`WatchHandle`] clients.

pub mod runtime;
pub mod watch_engine;

pub use runtime::{RuntimeConfig, WatchHandle, WatchRuntime};
pub use watch_engine::{EngineStatus, RoomsView, WatchEngine};
