//! In-memory collaborators
//!
//! Reference implementations of the service and UI seams. They back the
//! simulator and the test suites, and are small enough to serve as a template
//! for real adapters.

use crate::collaborators::{AlertSurface, ExitHandler, NavigationGuard};
use crate::error::ServiceError;
use crate::events::{DirtyEvent, EventHub, Handler, SubscriptionToken};
use crate::service::RecordService;
use crate::types::{AlertMessage, RecordId};
use crate::validation::{SharedRecord, Validate};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Outcome the in-memory service gives to the next persist calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistOutcome {
    #[default]
    Succeed,
    Fail,
}

#[derive(Debug)]
struct ServiceState<R> {
    record_id: RecordId,
    record: Option<SharedRecord<R>>,
    dirty: bool,
    task_result: AlertMessage,
    outcome: PersistOutcome,
    next_id: u64,
    persisted: HashMap<RecordId, R>,
}

/// Record service over a `HashMap`
///
/// Dirty/clean events are raised only on transitions. A successful persist
/// assigns an identifier to new records and leaves the service clean.
#[derive(Debug)]
pub struct InMemoryRecordService<R> {
    description: Option<String>,
    events: EventHub,
    state: Mutex<ServiceState<R>>,
    save_calls: AtomicUsize,
    save_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl<R> InMemoryRecordService<R>
where
    R: Validate + Clone + Default + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            description: None,
            events: EventHub::new(),
            state: Mutex::new(ServiceState {
                record_id: RecordId::UNASSIGNED,
                record: None,
                dirty: false,
                task_result: AlertMessage::default(),
                outcome: PersistOutcome::Succeed,
                next_id: 1,
                persisted: HashMap::new(),
            }),
            save_calls: AtomicUsize::new(0),
            save_gate: Mutex::new(None),
        }
    }

    /// With record-type description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Seed a persisted record
    #[must_use]
    pub fn with_record(self, id: impl Into<RecordId>, record: R) -> Self {
        {
            let mut state = self.state.lock();
            let id = id.into();
            state.next_id = state.next_id.max(id.0 + 1);
            state.persisted.insert(id, record);
        }
        self
    }

    /// Set the outcome of subsequent persists
    pub fn set_persist_outcome(&self, outcome: PersistOutcome) {
        self.state.lock().outcome = outcome;
    }

    /// Make persists wait until the returned semaphore gets a permit.
    /// Each permit releases one persist.
    pub fn gate_saves(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.save_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Number of persist calls so far
    #[must_use]
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Persisted copy of a record
    #[must_use]
    pub fn persisted(&self, id: RecordId) -> Option<R> {
        self.state.lock().persisted.get(&id).cloned()
    }

    /// Live dirty/clean subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count(DirtyEvent::Dirty)
            + self.events.subscriber_count(DirtyEvent::Clean)
    }

    /// Raise a dirty or clean event without touching the flag
    pub fn emit(&self, event: DirtyEvent) -> usize {
        self.events.emit(event)
    }
}

impl<R> Default for InMemoryRecordService<R>
where
    R: Validate + Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> RecordService for InMemoryRecordService<R>
where
    R: Validate + Clone + Default + Send + Sync + 'static,
{
    type Record = R;

    fn is_clean(&self) -> bool {
        !self.state.lock().dirty
    }

    fn record_id(&self) -> RecordId {
        self.state.lock().record_id
    }

    fn record_description(&self) -> Option<String> {
        self.description.clone()
    }

    fn record(&self) -> Option<SharedRecord<R>> {
        self.state.lock().record.clone()
    }

    fn subscribe_dirty(&self, handler: Handler) -> SubscriptionToken {
        self.events.subscribe(DirtyEvent::Dirty, handler)
    }

    fn subscribe_clean(&self, handler: Handler) -> SubscriptionToken {
        self.events.subscribe(DirtyEvent::Clean, handler)
    }

    fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.events.unsubscribe(token)
    }

    fn set_dirty_state(&self, dirty: bool) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.dirty != dirty;
            state.dirty = dirty;
            changed
        };
        if changed {
            self.events
                .emit(if dirty { DirtyEvent::Dirty } else { DirtyEvent::Clean });
        }
    }

    async fn load_record(&self, id: RecordId, _first_load: bool) -> Result<(), ServiceError> {
        {
            let mut state = self.state.lock();
            let record = if id.is_unassigned() {
                R::default()
            } else {
                state
                    .persisted
                    .get(&id)
                    .cloned()
                    .ok_or(ServiceError::NotFound(id))?
            };
            state.record_id = id;
            state.record = Some(Arc::new(RwLock::new(record)));
        }
        self.set_dirty_state(false);
        Ok(())
    }

    async fn save_record(&self) -> bool {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.save_gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let saved = {
            let mut state = self.state.lock();
            let Some(record) = state.record.clone() else {
                state.task_result = AlertMessage::danger("No record to save");
                return false;
            };
            match state.outcome {
                PersistOutcome::Fail => {
                    state.task_result = AlertMessage::danger("Failed to save the record");
                    false
                }
                PersistOutcome::Succeed => {
                    if state.record_id.is_unassigned() {
                        state.record_id = RecordId(state.next_id);
                        state.next_id += 1;
                    }
                    let id = state.record_id;
                    let copy = record.read().clone();
                    state.persisted.insert(id, copy);
                    state.task_result = AlertMessage::success("Record saved");
                    true
                }
            }
        };

        if saved {
            self.set_dirty_state(false);
        }
        saved
    }

    fn task_result(&self) -> AlertMessage {
        self.state.lock().task_result.clone()
    }
}

/// Navigation guard that remembers its last commands
#[derive(Debug, Default)]
pub struct RecordingGuard {
    locked: AtomicBool,
    exit_check: AtomicBool,
    lock_changes: AtomicUsize,
}

impl RecordingGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn exit_check_armed(&self) -> bool {
        self.exit_check.load(Ordering::SeqCst)
    }

    /// Number of lock/unlock commands received
    #[must_use]
    pub fn lock_changes(&self) -> usize {
        self.lock_changes.load(Ordering::SeqCst)
    }
}

impl NavigationGuard for RecordingGuard {
    fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
        self.lock_changes.fetch_add(1, Ordering::SeqCst);
    }

    fn set_page_exit_check(&self, armed: bool) {
        self.exit_check.store(armed, Ordering::SeqCst);
    }
}

/// Alert surface that keeps the current alert and a history
#[derive(Debug, Default)]
pub struct RecordingAlerts {
    current: Mutex<Option<AlertMessage>>,
    history: Mutex<Vec<Option<AlertMessage>>>,
}

impl RecordingAlerts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alert currently displayed
    #[must_use]
    pub fn current(&self) -> Option<AlertMessage> {
        self.current.lock().clone()
    }

    /// Every set (`Some`) and clear (`None`) in order
    #[must_use]
    pub fn history(&self) -> Vec<Option<AlertMessage>> {
        self.history.lock().clone()
    }
}

impl AlertSurface for RecordingAlerts {
    fn set_alert(&self, message: AlertMessage) {
        *self.current.lock() = Some(message.clone());
        self.history.lock().push(Some(message));
    }

    fn clear_alert(&self) {
        *self.current.lock() = None;
        self.history.lock().push(None);
    }
}

/// Exit handler that counts invocations
#[derive(Debug, Default)]
pub struct RecordingExit {
    exits: AtomicUsize,
    modal_exits: AtomicUsize,
}

impl RecordingExit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn exits(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn modal_exits(&self) -> usize {
        self.modal_exits.load(Ordering::SeqCst)
    }

    /// Exits of either kind
    #[must_use]
    pub fn total(&self) -> usize {
        self.exits() + self.modal_exits()
    }
}

impl ExitHandler for RecordingExit {
    fn exit(&self) {
        self.exits.fetch_add(1, Ordering::SeqCst);
    }

    fn modal_exit(&self) {
        self.modal_exits.fetch_add(1, Ordering::SeqCst);
    }
}
