use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use super::{PersistedState, StateStore};
use crate::scene_graph::ObjectId;

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

enum WriteCommand {
    Save { id: String, state: PersistedState },
    Flush(oneshot::Sender<()>),
}

/// Frame-loop facing side of persistence.
///
/// Saves are queued to a single writer task and applied in the order they were
/// issued, so the last write for an object wins. Nothing here blocks the
/// caller except [`PersistenceClient::flush`].
pub struct PersistenceClient {
    store: Arc<dyn StateStore>,
    runtime: Handle,
    writes: mpsc::UnboundedSender<WriteCommand>,
}

impl PersistenceClient {
    pub fn new(store: Arc<dyn StateStore>, runtime: Handle) -> Self {
        let (writes, commands) = mpsc::unbounded_channel();
        runtime.spawn(run_writer(store.clone(), commands));

        Self {
            store,
            runtime,
            writes,
        }
    }

    /// Queues a merge write of the object's transform. Failures are logged by
    /// the writer and never reach the caller.
    pub fn save(&self, id: &ObjectId, position: Vec3, rotation: Vec3) {
        let command = WriteCommand::Save {
            id: id.to_string(),
            state: PersistedState::new(position, rotation),
        };

        if self.writes.send(command).is_err() {
            log::warn!("Persistence writer has stopped, dropping save for {id}");
        }
    }

    /// Starts loading the object's persisted state. A failed load resolves to
    /// `None`, the same as a missing document.
    pub fn load(&self, id: &ObjectId) -> PendingLoad {
        let (sender, receiver) = oneshot::channel();
        let store = self.store.clone();
        let id = id.to_string();

        self.runtime.spawn(async move {
            let state = match store.load_state(&id).await {
                Ok(state) => state,
                Err(err) => {
                    log::warn!("Failed to load state for {id}: {err}");
                    None
                }
            };

            // The receiver is gone if the object unmounted first.
            let _ = sender.send(state);
        });

        PendingLoad { receiver }
    }

    /// Waits until every save queued so far has been attempted, or until
    /// `timeout` passes. Returns `false` on timeout.
    ///
    /// Blocks the calling thread, so it must not be called from inside the
    /// runtime.
    pub fn flush(&self, timeout: Duration) -> bool {
        let (sender, receiver) = oneshot::channel();
        if self.writes.send(WriteCommand::Flush(sender)).is_err() {
            return false;
        }

        self.runtime.block_on(async {
            matches!(tokio::time::timeout(timeout, receiver).await, Ok(Ok(())))
        })
    }
}

async fn run_writer(store: Arc<dyn StateStore>, mut commands: mpsc::UnboundedReceiver<WriteCommand>) {
    while let Some(command) = commands.recv().await {
        match command {
            WriteCommand::Save { id, state } => match store.save_state(&id, &state).await {
                Ok(()) => log::debug!("Saved state for {id}"),
                Err(err) => log::warn!("Failed to save state for {id}: {err}"),
            },
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

#[derive(Debug)]
pub enum LoadPoll {
    Pending,
    Ready(Option<PersistedState>),
}

/// Result slot of an in-flight [`PersistenceClient::load`]. Dropping it
/// discards the result.
#[derive(Debug)]
pub struct PendingLoad {
    receiver: oneshot::Receiver<Option<PersistedState>>,
}

impl PendingLoad {
    pub fn poll(&mut self) -> LoadPoll {
        match self.receiver.try_recv() {
            Ok(state) => LoadPoll::Ready(state),
            Err(oneshot::error::TryRecvError::Empty) => LoadPoll::Pending,
            Err(oneshot::error::TryRecvError::Closed) => LoadPoll::Ready(None),
        }
    }
}
