//! Record service contract
//!
//! The service owns the record, its persistence and its dirty flag. A session
//! observes the service and requests dirty-state transitions; it never writes
//! record fields itself.

use crate::error::ServiceError;
use crate::events::{Handler, SubscriptionToken};
use crate::types::{AlertMessage, RecordId};
use crate::validation::{SharedRecord, Validate};
use async_trait::async_trait;

/// Data-access collaborator behind an edit session
///
/// `set_dirty_state` is expected to raise the matching dirty/clean event
/// synchronously when the flag changes. A successful `save_record` is
/// expected to leave the service clean.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Record type being edited
    type Record: Validate + Send + Sync;

    /// True when the record matches its persisted state
    fn is_clean(&self) -> bool;

    /// Identifier of the loaded record (`RecordId::UNASSIGNED` for new ones)
    fn record_id(&self) -> RecordId;

    /// Human-readable record-type description, if configured
    fn record_description(&self) -> Option<String>;

    /// The loaded record, if any
    fn record(&self) -> Option<SharedRecord<Self::Record>>;

    /// Register a handler for the dirty event
    fn subscribe_dirty(&self, handler: Handler) -> SubscriptionToken;

    /// Register a handler for the clean event
    fn subscribe_clean(&self, handler: Handler) -> SubscriptionToken;

    /// Release a subscription; false if the token was not registered
    fn unsubscribe(&self, token: SubscriptionToken) -> bool;

    /// Request a dirty-state transition
    fn set_dirty_state(&self, dirty: bool);

    /// Load (or create, for `RecordId::UNASSIGNED`) the record to edit
    async fn load_record(&self, id: RecordId, first_load: bool) -> Result<(), ServiceError>;

    /// Persist the record; details of the outcome go to `task_result`
    async fn save_record(&self) -> bool;

    /// Outcome of the last service task, ready for the alert surface
    fn task_result(&self) -> AlertMessage;
}
