//! Data Transfer Objects for REST request/response serialization.

pub mod room_dto;
pub mod watch_dto;

pub use room_dto::*;
pub use watch_dto::*;
