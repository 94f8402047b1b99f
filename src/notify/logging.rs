//! Notification gateway that writes to the tracing log.

use super::{Notification, NotificationError, NotificationGateway, Permission};

/// Emits every notification as an `info` log line.
///
/// Permission is always granted; useful for headless deployments where the
/// log stream is the user-facing surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a log notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl NotificationGateway for LogNotifier {
    async fn ensure_permission(&self) -> Permission {
        Permission::Granted
    }

    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn fire(&self, notification: &Notification) -> Result<(), NotificationError> {
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            "notification"
        );
        Ok(())
    }
}
