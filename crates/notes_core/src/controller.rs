use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use shared::{
    domain::{Note, NoteId},
    error::StorageError,
    order::SortSpec,
    protocol::{ListCommand, ListState},
};
use tokio::{
    sync::broadcast,
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, info, warn};

use crate::{
    events::{ListEvent, ListFailure},
    gateway::NoteGateway,
    sorted_view::{sorted_view, SortedFeed},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Owns the published [`ListState`], the running note view and the
/// single-note undo slot.
///
/// Construction and [`ListController::on_command`] spawn Tokio tasks and must
/// be called from inside a runtime.
pub struct ListController {
    gateway: Arc<dyn NoteGateway>,
    shared: Arc<ControllerShared>,
}

struct ControllerShared {
    state: Mutex<ControllerState>,
    events: broadcast::Sender<ListEvent>,
}

struct ControllerState {
    current: Arc<ListState>,
    view: Option<ActiveView>,
    /// Bumped whenever a view is replaced or the controller shuts down.
    generation: u64,
    recently_deleted: Option<Note>,
    restore_in_flight: bool,
    mutations: JoinSet<()>,
    closed: bool,
}

struct ActiveView {
    sort: SortSpec,
    task: JoinHandle<()>,
}

impl ListController {
    pub fn new(gateway: Arc<dyn NoteGateway>) -> Self {
        Self::with_initial_sort(gateway, SortSpec::default())
    }

    pub fn with_initial_sort(gateway: Arc<dyn NoteGateway>, sort: SortSpec) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let controller = Self {
            gateway,
            shared: Arc::new(ControllerShared {
                state: Mutex::new(ControllerState {
                    current: Arc::new(ListState::default()),
                    view: None,
                    generation: 0,
                    recently_deleted: None,
                    restore_in_flight: false,
                    mutations: JoinSet::new(),
                    closed: false,
                }),
                events,
            }),
        };

        {
            let mut guard = controller.shared.lock();
            controller.replace_view(&mut guard, sort);
        }
        controller
    }

    pub fn on_command(&self, command: ListCommand) {
        match command {
            ListCommand::Reorder(sort) => self.reorder(sort),
            ListCommand::Delete(note) => self.delete(note),
            ListCommand::Restore => self.restore(),
            ListCommand::ToggleOrderPanel => self.toggle_order_panel(),
        }
    }

    /// Last published snapshot.
    pub fn state(&self) -> Arc<ListState> {
        Arc::clone(&self.shared.lock().current)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListEvent> {
        self.shared.events.subscribe()
    }

    pub fn recently_deleted(&self) -> Option<Note> {
        self.shared.lock().recently_deleted.clone()
    }

    /// Waits for every delete/restore started so far, including ones spawned
    /// while waiting.
    pub async fn settle(&self) {
        loop {
            let mut pending = std::mem::take(&mut self.shared.lock().mutations);
            if pending.is_empty() {
                return;
            }
            drain(&mut pending).await;
        }
    }

    /// Stops the view, waits for in-flight mutations and silences the
    /// controller. Mutations that complete still reach storage.
    pub async fn shutdown(&self) {
        let mut pending = {
            let mut guard = self.shared.lock();
            guard.close();
            std::mem::take(&mut guard.mutations)
        };
        drain(&mut pending).await;
        info!("notes: list controller shut down");
    }

    fn reorder(&self, sort: SortSpec) {
        let mut guard = self.shared.lock();
        if guard.closed {
            return;
        }
        if guard.view.as_ref().is_some_and(|view| view.sort == sort) {
            debug!(%sort, "notes: reorder to the active sort ignored");
            return;
        }
        self.replace_view(&mut guard, sort);
    }

    fn replace_view(&self, state: &mut ControllerState, sort: SortSpec) {
        state.generation += 1;
        let generation = state.generation;
        if let Some(previous) = state.view.take() {
            previous.task.abort();
            debug!(sort = %previous.sort, "notes: cancelled superseded view");
        }

        let view = sorted_view(self.gateway.subscribe_all(), sort);
        let task = tokio::spawn(run_view(Arc::clone(&self.shared), generation, sort, view));
        state.view = Some(ActiveView { sort, task });
        info!(%sort, generation, "notes: view subscribed");
    }

    fn delete(&self, note: Note) {
        let mut guard = self.shared.lock();
        if guard.closed {
            return;
        }
        let gateway = Arc::clone(&self.gateway);
        let shared = Arc::clone(&self.shared);
        guard.spawn_mutation(async move {
            match gateway.delete(&note).await {
                Ok(()) => shared.finish_delete(note),
                Err(error) => shared.fail(ListFailure::Delete { note, error }),
            }
        });
    }

    fn restore(&self) {
        let mut guard = self.shared.lock();
        if guard.closed {
            return;
        }
        if guard.restore_in_flight {
            debug!("notes: restore already in flight");
            return;
        }
        let Some(note) = guard.recently_deleted.clone() else {
            debug!("notes: nothing to restore");
            return;
        };

        guard.restore_in_flight = true;
        let gateway = Arc::clone(&self.gateway);
        let shared = Arc::clone(&self.shared);
        guard.spawn_mutation(async move {
            let result = gateway.insert(note.clone()).await;
            shared.finish_restore(note, result);
        });
    }

    fn toggle_order_panel(&self) {
        let mut guard = self.shared.lock();
        if guard.closed {
            return;
        }
        let next = guard.current.with_order_panel_toggled();
        self.shared.publish(&mut guard, next);
    }
}

impl Drop for ListController {
    fn drop(&mut self) {
        let mut guard = self.shared.lock();
        guard.close();
        guard.mutations.detach_all();
    }
}

impl ControllerState {
    fn close(&mut self) {
        self.closed = true;
        self.generation += 1;
        if let Some(view) = self.view.take() {
            view.task.abort();
        }
    }

    fn spawn_mutation<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        while self.mutations.try_join_next().is_some() {}
        self.mutations.spawn(task);
    }
}

impl ControllerShared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &mut ControllerState, next: ListState) {
        let next = Arc::new(next);
        state.current = Arc::clone(&next);
        let _ = self.events.send(ListEvent::StateChanged(next));
    }

    /// Applies one emission of the view tagged `generation`. Returns false when
    /// that view has been superseded so the caller can stop pulling from it.
    fn publish_view(&self, generation: u64, sort: SortSpec, notes: Vec<Note>) -> bool {
        let mut guard = self.lock();
        if guard.closed || guard.generation != generation {
            debug!(
                generation,
                current = guard.generation,
                "notes: dropped emission from superseded view"
            );
            return false;
        }
        let next = guard.current.with_view(notes, sort);
        self.publish(&mut guard, next);
        true
    }

    fn report_view_failure(&self, generation: u64, sort: SortSpec, error: StorageError) -> bool {
        let guard = self.lock();
        if guard.closed || guard.generation != generation {
            return false;
        }
        warn!(%sort, %error, "notes: view reload failed");
        let _ = self
            .events
            .send(ListEvent::Failed(ListFailure::Feed { sort, error }));
        true
    }

    fn finish_delete(&self, note: Note) {
        let mut guard = self.lock();
        if guard.closed {
            return;
        }
        info!(note_id = ?note.id.map(|id| id.0), "notes: note deleted");
        guard.recently_deleted = Some(note.clone());
        let _ = self.events.send(ListEvent::NoteDeleted(note));
    }

    fn finish_restore(&self, note: Note, result: Result<NoteId, StorageError>) {
        let mut guard = self.lock();
        guard.restore_in_flight = false;
        if guard.closed {
            return;
        }
        match result {
            Ok(id) => {
                // Compare whole values: an unsaved note has no id to match on.
                if guard.recently_deleted.as_ref() == Some(&note) {
                    guard.recently_deleted = None;
                }
                info!(note_id = id.0, "notes: note restored");
                let _ = self.events.send(ListEvent::NoteRestored(note.with_id(id)));
            }
            Err(error) => {
                warn!(%error, "notes: restore failed, undo slot kept");
                let _ = self
                    .events
                    .send(ListEvent::Failed(ListFailure::Restore { note, error }));
            }
        }
    }

    fn fail(&self, failure: ListFailure) {
        let guard = self.lock();
        if guard.closed {
            return;
        }
        warn!(error = %failure, "notes: mutation failed");
        let _ = self.events.send(ListEvent::Failed(failure));
    }
}

async fn run_view(
    shared: Arc<ControllerShared>,
    generation: u64,
    sort: SortSpec,
    mut view: SortedFeed,
) {
    while let Some(batch) = view.next().await {
        let current = match batch {
            Ok(notes) => shared.publish_view(generation, sort, notes),
            Err(error) => shared.report_view_failure(generation, sort, error),
        };
        if !current {
            break;
        }
    }
    debug!(%sort, generation, "notes: view ended");
}

async fn drain(pending: &mut JoinSet<()>) {
    while let Some(result) = pending.join_next().await {
        if let Err(err) = result {
            if !err.is_cancelled() {
                warn!(error = %err, "notes: mutation task panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
