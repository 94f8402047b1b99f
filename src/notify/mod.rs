//! Notification gateway: the injected capability that presents "a slot is
//! free" alerts to the user.
//!
//! The engine only talks to [`NotificationGateway`]. Concrete adapters:
//!
//! - [`LogNotifier`]: writes notifications to the tracing log.
//! - [`DesktopNotifier`]: shells out to `notify-send`.
//! - [`MemoryNotifier`]: records notifications in memory (no-op / test double).
//!
//! [`Notifier`] selects one of them at runtime from configuration.

pub mod desktop;
pub mod logging;
pub mod memory;

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Room;

pub use desktop::DesktopNotifier;
pub use logging::LogNotifier;
pub use memory::MemoryNotifier;

/// Failure to present a notification.
///
/// Never fatal: the engine logs it and still consumes the watch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    /// Permission was never granted (or was refused at startup).
    #[error("notification permission is not granted")]
    PermissionDenied,

    /// The platform refused or failed to present the alert.
    #[error("notification platform error: {0}")]
    Platform(String),
}

/// Outcome of the one-time permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Not requested yet.
    Default,
    /// Notifications may be shown.
    Granted,
    /// Notifications are refused; every `fire` reports an error.
    Denied,
}

/// A transient user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Headline.
    pub title: String,
    /// Detail text.
    pub body: String,
    /// Optional icon path or name.
    pub icon: Option<String>,
}

impl Notification {
    /// Creates a notification with no icon.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: None,
        }
    }

    /// Alert raised when a watched room frees a slot.
    #[must_use]
    pub fn vacancy(room: &Room) -> Self {
        Self::new(
            format!("{} has a free slot!", room.name),
            format!(
                "{} now has fewer than {} members.",
                room.name, room.capacity
            ),
        )
    }
}

/// Platform notification capability.
pub trait NotificationGateway: Send + Sync {
    /// Requests permission if it has not been decided yet.
    ///
    /// Called once at startup. A refusal is final: it is not retried.
    fn ensure_permission(&self) -> impl Future<Output = Permission> + Send;

    /// Current permission state, without prompting.
    fn permission(&self) -> Permission;

    /// Presents `notification`.
    ///
    /// Selecting the alert focuses the host application and closes it, where
    /// the platform supports that.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::PermissionDenied`] when permission is not
    /// granted, or [`NotificationError::Platform`] when presentation fails.
    fn fire(&self, notification: &Notification) -> Result<(), NotificationError>;
}

impl<T: NotificationGateway> NotificationGateway for std::sync::Arc<T> {
    fn ensure_permission(&self) -> impl Future<Output = Permission> + Send {
        (**self).ensure_permission()
    }

    fn permission(&self) -> Permission {
        (**self).permission()
    }

    fn fire(&self, notification: &Notification) -> Result<(), NotificationError> {
        (**self).fire(notification)
    }
}

/// Gateway chosen at startup.
#[derive(Debug)]
pub enum Notifier {
    /// Log-only notifications.
    Log(LogNotifier),
    /// Desktop notifications through `notify-send`.
    Desktop(DesktopNotifier),
    /// In-memory recorder.
    Memory(MemoryNotifier),
}

impl NotificationGateway for Notifier {
    async fn ensure_permission(&self) -> Permission {
        match self {
            Self::Log(inner) => inner.ensure_permission().await,
            Self::Desktop(inner) => inner.ensure_permission().await,
            Self::Memory(inner) => inner.ensure_permission().await,
        }
    }

    fn permission(&self) -> Permission {
        match self {
            Self::Log(inner) => inner.permission(),
            Self::Desktop(inner) => inner.permission(),
            Self::Memory(inner) => inner.permission(),
        }
    }

    fn fire(&self, notification: &Notification) -> Result<(), NotificationError> {
        match self {
            Self::Log(inner) => inner.fire(notification),
            Self::Desktop(inner) => inner.fire(notification),
            Self::Memory(inner) => inner.fire(notification),
        }
    }
}

/// Lock-free holder for a [`Permission`] decided at runtime.
#[derive(Debug)]
pub(crate) struct PermissionCell(AtomicU8);

impl PermissionCell {
    pub(crate) const fn new(permission: Permission) -> Self {
        Self(AtomicU8::new(encode(permission)))
    }

    pub(crate) fn get(&self) -> Permission {
        match self.0.load(Ordering::Acquire) {
            1 => Permission::Granted,
            2 => Permission::Denied,
            _ => Permission::Default,
        }
    }

    pub(crate) fn set(&self, permission: Permission) {
        self.0.store(encode(permission), Ordering::Release);
    }
}

const fn encode(permission: Permission) -> u8 {
    match permission {
        Permission::Default => 0,
        Permission::Granted => 1,
        Permission::Denied => 2,
    }
}
