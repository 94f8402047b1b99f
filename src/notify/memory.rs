//! In-memory notification gateway.

use std::sync::{Mutex, PoisonError};

use super::{Notification, NotificationError, NotificationGateway, Permission};

/// Records notifications instead of presenting them.
///
/// The permission outcome is fixed at construction, so the same type serves
/// as a no-op gateway and as a test double for the denied path.
#[derive(Debug)]
pub struct MemoryNotifier {
    outcome: Permission,
    fired: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// A recorder whose permission request is granted.
    #[must_use]
    pub fn granted() -> Self {
        Self::with_outcome(Permission::Granted)
    }

    /// A recorder whose permission request is refused.
    #[must_use]
    pub fn denied() -> Self {
        Self::with_outcome(Permission::Denied)
    }

    fn with_outcome(outcome: Permission) -> Self {
        Self {
            outcome,
            fired: Mutex::new(Vec::new()),
        }
    }

    /// Notifications presented so far, oldest first.
    #[must_use]
    pub fn fired(&self) -> Vec<Notification> {
        self.fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of notifications presented so far.
    #[must_use]
    pub fn fired_count(&self) -> usize {
        self.fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl NotificationGateway for MemoryNotifier {
    async fn ensure_permission(&self) -> Permission {
        self.outcome
    }

    fn permission(&self) -> Permission {
        self.outcome
    }

    fn fire(&self, notification: &Notification) -> Result<(), NotificationError> {
        if self.outcome != Permission::Granted {
            return Err(NotificationError::PermissionDenied);
        }
        self.fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }
}
