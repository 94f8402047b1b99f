//! Desktop notifications through `notify-send`.
//!
//! Permission is probed once by running `notify-send --version`; if the
//! binary is missing the gateway is denied for the lifetime of the process.
//! Each alert is shown with a default action: when the user clicks it the
//! optional focus command runs and the notification server closes the alert.

use std::future::Future;
use std::io;
use std::process::{Output, Stdio};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::{Notification, NotificationError, NotificationGateway, Permission, PermissionCell};

const NOTIFY_SEND: &str = "notify-send";
const APP_NAME: &str = "roomwatch";
const DEFAULT_ACTION: &str = "default";

/// `notify-send` backed gateway.
#[derive(Debug)]
pub struct DesktopNotifier {
    icon: Option<String>,
    focus_command: Option<String>,
    permission: PermissionCell,
    shutdown: CancellationToken,
}

impl DesktopNotifier {
    /// Creates a desktop notifier.
    ///
    /// - `icon`: icon name or path attached to every alert.
    /// - `focus_command`: shell command run when an alert is clicked, used to
    ///   bring the host application to the foreground.
    #[must_use]
    pub fn new(icon: Option<String>, focus_command: Option<String>) -> Self {
        Self {
            icon,
            focus_command,
            permission: PermissionCell::new(Permission::Default),
            shutdown: CancellationToken::new(),
        }
    }

    /// Stops waiting for clicks once `shutdown` is cancelled, so no focus
    /// command runs after teardown.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    fn command_for(&self, notification: &Notification) -> Command {
        let mut cmd = Command::new(NOTIFY_SEND);
        cmd.arg("--app-name").arg(APP_NAME);
        if let Some(icon) = notification.icon.as_ref().or(self.icon.as_ref()) {
            cmd.arg("--icon").arg(icon);
        }
        cmd.arg("--wait")
            .arg(format!("--action={DEFAULT_ACTION}=Open"))
            .arg(&notification.title)
            .arg(&notification.body)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(false);
        cmd
    }
}

impl NotificationGateway for DesktopNotifier {
    async fn ensure_permission(&self) -> Permission {
        let current = self.permission.get();
        if current != Permission::Default {
            return current;
        }

        let probe = Command::new(NOTIFY_SEND)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        let decided = match probe {
            Ok(status) if status.success() => Permission::Granted,
            Ok(status) => {
                tracing::error!(%status, "notify-send probe failed; desktop notifications disabled");
                Permission::Denied
            }
            Err(e) => {
                tracing::error!(error = %e, "notify-send unavailable; desktop notifications disabled");
                Permission::Denied
            }
        };
        self.permission.set(decided);
        decided
    }

    fn permission(&self) -> Permission {
        self.permission.get()
    }

    fn fire(&self, notification: &Notification) -> Result<(), NotificationError> {
        if self.permission.get() != Permission::Granted {
            return Err(NotificationError::PermissionDenied);
        }

        let child = self
            .command_for(notification)
            .spawn()
            .map_err(|e| NotificationError::Platform(e.to_string()))?;

        tokio::spawn(handle_click(
            child.wait_with_output(),
            self.focus_command.clone(),
            self.shutdown.clone(),
        ));
        Ok(())
    }
}

/// Waits for the alert to close and focuses the host if it was clicked.
///
/// Returns `true` if the click was handled.
async fn handle_click<F>(
    wait: F,
    focus_command: Option<String>,
    shutdown: CancellationToken,
) -> bool
where
    F: Future<Output = io::Result<Output>>,
{
    let output = tokio::select! {
        biased;
        () = shutdown.cancelled() => {
            tracing::debug!("shutting down; no longer waiting for notification clicks");
            return false;
        }
        output = wait => output,
    };

    match output {
        Ok(output) => {
            let action = String::from_utf8_lossy(&output.stdout);
            if action.trim() != DEFAULT_ACTION || shutdown.is_cancelled() {
                return false;
            }
            focus_host(focus_command.as_deref()).await;
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "notify-send did not complete");
            false
        }
    }
}

/// Runs the configured focus command, if any.
async fn focus_host(focus_command: Option<&str>) {
    let Some(command) = focus_command else {
        tracing::debug!("notification clicked; no focus command configured");
        return;
    };
    match Command::new("sh").arg("-c").arg(command).status().await {
        Ok(status) if status.success() => tracing::debug!("host focused"),
        Ok(status) => tracing::warn!(%status, "focus command failed"),
        Err(e) => tracing::warn!(error = %e, "focus command could not start"),
    }
}
