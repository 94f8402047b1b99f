//! Cooperative runtime around [`WatchEngine`].
//!
//! Two tasks, one cancellation token:
//!
//! ```text
//!  poller ──(fetch result)──┐
//!                           ├──► mpsc ──► engine task (sole owner of state)
//!  WatchHandle ──(command)──┘
//! ```
//!
//! The poller fetches once immediately and then on a fixed period. The
//! fetch suspends only the poller, so commands keep being served against
//! the previous snapshot while a request is in flight. The engine task
//! applies every message in arrival order, one at a time, so no locking is
//! needed around the watch set or the snapshot.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::watch_engine::{EngineStatus, RoomsView, WatchEngine};
use crate::domain::{Room, RoomId, ToggleOutcome};
use crate::error::WatchError;
use crate::notify::NotificationGateway;
use crate::source::{FetchError, RoomSource};

/// Message processed by the engine task.
#[derive(Debug)]
enum Command {
    Refreshed(Result<Vec<Room>, FetchError>),
    Subscribe {
        id: RoomId,
        reply: oneshot::Sender<bool>,
    },
    Unsubscribe {
        id: RoomId,
        reply: oneshot::Sender<bool>,
    },
    Toggle {
        id: RoomId,
        reply: oneshot::Sender<Result<ToggleOutcome, WatchError>>,
    },
    Rooms {
        reply: oneshot::Sender<RoomsView>,
    },
    Status {
        reply: oneshot::Sender<EngineStatus>,
    },
}

/// Scheduling parameters.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Time between the start of two polls.
    pub poll_interval: Duration,
    /// Capacity of the engine command queue.
    pub command_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            command_capacity: 64,
        }
    }
}

/// Cloneable client of the engine task.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    tx: mpsc::Sender<Command>,
}

impl WatchHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, WatchError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| WatchError::EngineUnavailable)?;
        rx.await.map_err(|_| WatchError::EngineUnavailable)
    }

    /// Starts watching `id` without checking its occupancy.
    ///
    /// Returns `true` if the id was newly added.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::EngineUnavailable`] after shutdown.
    pub async fn subscribe(&self, id: RoomId) -> Result<bool, WatchError> {
        self.request(|reply| Command::Subscribe { id, reply }).await
    }

    /// Stops watching `id`.
    ///
    /// Returns `true` if the id was watched.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::EngineUnavailable`] after shutdown.
    pub async fn unsubscribe(&self, id: RoomId) -> Result<bool, WatchError> {
        self.request(|reply| Command::Unsubscribe { id, reply }).await
    }

    /// Flips the watch on `id`; adding requires the room to be full.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::RoomNotFound`] or [`WatchError::RoomNotFull`]
    /// when adding a watch is not allowed, or
    /// [`WatchError::EngineUnavailable`] after shutdown.
    pub async fn toggle(&self, id: RoomId) -> Result<ToggleOutcome, WatchError> {
        self.request(|reply| Command::Toggle { id, reply }).await?
    }

    /// Current snapshot and watched ids.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::EngineUnavailable`] after shutdown.
    pub async fn rooms(&self) -> Result<RoomsView, WatchError> {
        self.request(|reply| Command::Rooms { reply }).await
    }

    /// A single room and whether it is watched.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::RoomNotFound`] if the room is not in the
    /// snapshot, or [`WatchError::EngineUnavailable`] after shutdown.
    pub async fn room(&self, id: &str) -> Result<(Room, bool), WatchError> {
        let view = self.rooms().await?;
        let room = view
            .room(id)
            .cloned()
            .ok_or_else(|| WatchError::RoomNotFound(RoomId::new(id)))?;
        Ok((room, view.is_watched(id)))
    }

    /// Watched ids, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::EngineUnavailable`] after shutdown.
    pub async fn watches(&self) -> Result<Vec<RoomId>, WatchError> {
        Ok(self.rooms().await?.watched)
    }

    /// Health summary.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::EngineUnavailable`] after shutdown.
    pub async fn status(&self) -> Result<EngineStatus, WatchError> {
        self.request(|reply| Command::Status { reply }).await
    }
}

/// Running engine and poller tasks.
#[derive(Debug)]
pub struct WatchRuntime<N> {
    handle: WatchHandle,
    cancel: CancellationToken,
    engine_task: JoinHandle<WatchEngine<N>>,
    poller_task: JoinHandle<()>,
}

impl<N> WatchRuntime<N>
where
    N: NotificationGateway + 'static,
{
    /// Spawns the engine and poller tasks on the current tokio runtime.
    ///
    /// Both tasks stop when `cancel` is cancelled.
    pub fn spawn<S>(
        engine: WatchEngine<N>,
        source: S,
        config: RuntimeConfig,
        cancel: CancellationToken,
    ) -> Self
    where
        S: RoomSource + 'static,
    {
        let (tx, rx) = mpsc::channel(config.command_capacity.max(1));

        let engine_task = tokio::spawn(run_engine(engine, rx, cancel.clone()));
        let poller_task = tokio::spawn(run_poller(
            source,
            config.poll_interval,
            tx.clone(),
            cancel.clone(),
        ));

        Self {
            handle: WatchHandle { tx },
            cancel,
            engine_task,
            poller_task,
        }
    }

    /// Client for the engine task.
    #[must_use]
    pub fn handle(&self) -> WatchHandle {
        self.handle.clone()
    }

    /// Cancels both tasks and waits for them to finish.
    ///
    /// Returns the engine so its final state can be inspected.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Internal`] if a task panicked.
    pub async fn shutdown(self) -> Result<WatchEngine<N>, WatchError> {
        self.cancel.cancel();
        self.poller_task
            .await
            .map_err(|e| WatchError::Internal(format!("poller task failed: {e}")))?;
        self.engine_task
            .await
            .map_err(|e| WatchError::Internal(format!("engine task failed: {e}")))
    }
}

/// Serves commands until cancelled or every sender is gone.
async fn run_engine<N: NotificationGateway>(
    mut engine: WatchEngine<N>,
    mut rx: mpsc::Receiver<Command>,
    cancel: CancellationToken,
) -> WatchEngine<N> {
    tracing::info!("watch engine started");
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            command = rx.recv() => match command {
                Some(command) => dispatch(&mut engine, command),
                None => break,
            },
        }
    }
    tracing::info!(pending_watches = engine.registry().len(), "watch engine stopped");
    engine
}

fn dispatch<N: NotificationGateway>(engine: &mut WatchEngine<N>, command: Command) {
    match command {
        Command::Refreshed(result) => {
            let _ = engine.apply_refresh(result);
        }
        Command::Subscribe { id, reply } => {
            let _ = reply.send(engine.subscribe(id));
        }
        Command::Unsubscribe { id, reply } => {
            let _ = reply.send(engine.unsubscribe(id.as_str()));
        }
        Command::Toggle { id, reply } => {
            let _ = reply.send(engine.request_toggle(id));
        }
        Command::Rooms { reply } => {
            let _ = reply.send(engine.rooms_view());
        }
        Command::Status { reply } => {
            let _ = reply.send(engine.status());
        }
    }
}

/// Fetches immediately, then once per `period`, until cancelled.
///
/// A slow fetch delays the next tick instead of queueing extra polls.
async fn run_poller<S: RoomSource>(
    source: S,
    period: Duration,
    tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = source.fetch_rooms() => result,
        };

        if tx.send(Command::Refreshed(result)).await.is_err() {
            break;
        }
    }
    tracing::info!("room poller stopped");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::EventBus;
    use crate::domain::fixtures::room;
    use crate::notify::MemoryNotifier;

    /// Counts fetches and always returns one full room.
    struct CountingSource(Arc<AtomicUsize>);

    impl RoomSource for CountingSource {
        async fn fetch_rooms(&self) -> Result<Vec<Room>, FetchError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![room("r1", 6)])
        }
    }

    fn spawn_runtime(
        period: Duration,
    ) -> (WatchRuntime<Arc<MemoryNotifier>>, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let engine = WatchEngine::new(Arc::new(MemoryNotifier::granted()), EventBus::new(16));
        let runtime = WatchRuntime::spawn(
            engine,
            CountingSource(Arc::clone(&fetches)),
            RuntimeConfig {
                poll_interval: period,
                command_capacity: 8,
            },
            CancellationToken::new(),
        );
        (runtime, fetches)
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_period() {
        let (runtime, fetches) = spawn_runtime(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        let Ok(engine) = runtime.shutdown().await else {
            panic!("shutdown should join cleanly");
        };
        assert_eq!(engine.store().snapshot().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_polls_after_shutdown() {
        let (runtime, fetches) = spawn_runtime(Duration::from_secs(10));
        let handle = runtime.handle();
        tokio::time::sleep(Duration::from_millis(1)).await;

        let _ = runtime.shutdown().await;
        let before = fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), before);

        assert!(matches!(
            handle.status().await,
            Err(WatchError::EngineUnavailable)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn handle_round_trips_commands() {
        let (runtime, _fetches) = spawn_runtime(Duration::from_secs(10));
        let handle = runtime.handle();
        tokio::time::sleep(Duration::from_millis(1)).await;

        let Ok(outcome) = handle.toggle(RoomId::new("r1")).await else {
            panic!("toggle on a full room should succeed");
        };
        assert_eq!(outcome, ToggleOutcome::Subscribed);
        assert_eq!(handle.watches().await.ok(), Some(vec![RoomId::new("r1")]));

        let Ok((found, watched)) = handle.room("r1").await else {
            panic!("room should be in snapshot");
        };
        assert_eq!(found.id.as_str(), "r1");
        assert!(watched);

        assert_eq!(handle.unsubscribe(RoomId::new("r1")).await.ok(), Some(true));
        assert!(matches!(
            handle.room("nope").await,
            Err(WatchError::RoomNotFound(_))
        ));

        let _ = runtime.shutdown().await;
    }
}
