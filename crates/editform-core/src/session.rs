//! Edit session controller
//!
//! Owns the lifecycle of one record edit form:
//! - loads the record and binds a fresh validation context to it
//! - subscribes to the service's dirty/clean events after the first render
//! - keeps the navigation guard and alert surface in step with the dirty flag
//! - orchestrates save, save-and-exit and exit
//! - computes the derived view state the form renders from
//!
//! # Locking
//!
//! Session state lives behind `parking_lot` mutexes. None of them is held
//! across an `.await` or while calling `set_dirty_state` on the service,
//! because the service raises dirty/clean events synchronously and those
//! re-enter the session. Lock order is `subscriptions -> state -> phase`.

use crate::collaborators::{AlertSurface, ExitHandler, NavigationGuard, RenderSignal};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::events::{Handler, SubscriptionToken};
use crate::save_phase::{self, SavePhase};
use crate::service::RecordService;
use crate::types::{AlertMessage, ExitDecision, ExitPath, ViewState};
use crate::validation::{FieldError, ValidationContext};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

/// UI-side collaborators of a session
#[derive(Clone)]
pub struct Collaborators {
    pub guard: Arc<dyn NavigationGuard>,
    pub alerts: Arc<dyn AlertSurface>,
    pub exit: Arc<dyn ExitHandler>,
}

impl Collaborators {
    #[must_use]
    pub fn new(
        guard: Arc<dyn NavigationGuard>,
        alerts: Arc<dyn AlertSurface>,
        exit: Arc<dyn ExitHandler>,
    ) -> Self {
        Self {
            guard,
            alerts,
            exit,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Session lifecycle. A validation context exists exactly in `Loaded`.
enum SessionState<R> {
    NoSession,
    Loaded(LoadedSession<R>),
    Disposed,
}

struct LoadedSession<R> {
    validation: ValidationContext<R>,
}

/// Tokens from `on_first_render`; each is released exactly once by `dispose`
#[derive(Debug, Clone, Copy)]
struct Subscriptions {
    dirty: SubscriptionToken,
    clean: SubscriptionToken,
}

struct Inner<S: RecordService> {
    service: Arc<S>,
    config: SessionConfig,
    collaborators: Collaborators,
    render: RenderSignal,
    subscriptions: Mutex<Option<Subscriptions>>,
    state: Mutex<SessionState<S::Record>>,
    phase: Mutex<SavePhase>,
}

impl<S: RecordService> Inner<S> {
    fn is_live(&self) -> bool {
        !matches!(*self.state.lock(), SessionState::Disposed)
    }

    fn on_record_dirty(&self) {
        if !self.is_live() {
            return;
        }
        tracing::debug!("Record {} dirty", self.service.record_id());
        let guard = &self.collaborators.guard;
        guard.set_locked(true);
        guard.set_page_exit_check(true);
        self.collaborators
            .alerts
            .set_alert(AlertMessage::warning(self.config.messages.unsaved.clone()));
        self.render.request();
    }

    fn on_record_clean(&self) {
        if !self.is_live() {
            return;
        }
        tracing::debug!("Record {} clean", self.service.record_id());
        let guard = &self.collaborators.guard;
        guard.set_locked(false);
        guard.set_page_exit_check(false);
        self.collaborators.alerts.clear_alert();
        self.render.request();
    }

    fn transition(&self, to: SavePhase) -> Result<(), SessionError> {
        let mut phase = self.phase.lock();
        save_phase::validate_transition(*phase, to)?;
        *phase = to;
        Ok(())
    }
}

/// Puts the save phase back to `Idle` if a save future is dropped mid-flight
struct InFlight<'a>(&'a Mutex<SavePhase>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut phase = self.0.lock();
        if phase.in_flight() {
            *phase = SavePhase::Idle;
        }
    }
}

/// Controller behind a single-record edit form
///
/// Not `Clone`: dropping the controller disposes the session. Share it behind
/// an `Arc` if several UI parts need it.
pub struct EditSessionController<S: RecordService + 'static> {
    inner: Arc<Inner<S>>,
}

impl<S: RecordService + 'static> EditSessionController<S> {
    /// Create a session with no record loaded
    #[must_use]
    pub fn new(service: Arc<S>, config: SessionConfig, collaborators: Collaborators) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                config,
                collaborators,
                render: RenderSignal::new(),
                subscriptions: Mutex::new(None),
                state: Mutex::new(SessionState::NoSession),
                phase: Mutex::new(SavePhase::Idle),
            }),
        }
    }

    /// Load the configured record, then bind a fresh validation context to it.
    ///
    /// # Errors
    /// - `SessionError::Load` if the service fails to load (not retried here)
    /// - `SessionError::Disposed` if the session was disposed before or
    ///   during the load
    pub async fn load(&self, first_load: bool) -> Result<(), SessionError> {
        let inner = &self.inner;
        if !inner.is_live() {
            return Err(SessionError::Disposed);
        }

        let id = inner.config.record_id;
        tracing::debug!("Loading record {} (first load: {})", id, first_load);
        inner.service.load_record(id, first_load).await?;

        let record = inner.service.record();
        let mut state = inner.state.lock();
        if matches!(*state, SessionState::Disposed) {
            return Err(SessionError::Disposed);
        }
        *state = match record {
            Some(record) => SessionState::Loaded(LoadedSession {
                validation: ValidationContext::new(record),
            }),
            None => {
                tracing::warn!("Service loaded record {} but exposes no record", id);
                SessionState::NoSession
            }
        };
        Ok(())
    }

    /// Subscribe to the service's dirty and clean events.
    ///
    /// Call once the form has rendered for the first time. Later calls do
    /// nothing, as do calls on a disposed session.
    pub fn on_first_render(&self) {
        let mut subscriptions = self.inner.subscriptions.lock();
        if subscriptions.is_some() || !self.inner.is_live() {
            return;
        }

        let dirty = self.inner.service.subscribe_dirty(self.handler(Inner::<S>::on_record_dirty));
        let clean = self.inner.service.subscribe_clean(self.handler(Inner::<S>::on_record_clean));
        *subscriptions = Some(Subscriptions { dirty, clean });
        tracing::debug!("Subscribed to dirty/clean events");
    }

    fn handler(&self, action: fn(&Inner<S>)) -> Handler {
        let weak: Weak<Inner<S>> = Arc::downgrade(&self.inner);
        Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                action(&inner);
            }
        })
    }

    /// React to the record becoming dirty: lock navigation, arm the exit
    /// check, warn, re-render. Idempotent.
    pub fn on_record_dirty(&self) {
        self.inner.on_record_dirty();
    }

    /// React to the record becoming clean: the mirror of
    /// [`on_record_dirty`](Self::on_record_dirty). Idempotent.
    pub fn on_record_clean(&self) {
        self.inner.on_record_clean();
    }

    /// Field-level edit notification. Ignored unless a record is loaded.
    pub fn on_field_changed(&self, is_dirty: bool) {
        {
            let mut state = self.inner.state.lock();
            let SessionState::Loaded(session) = &mut *state else {
                tracing::trace!("Field change ignored: no record loaded");
                return;
            };
            if is_dirty {
                session.validation.mark_modified();
            }
        }
        self.inner.service.set_dirty_state(is_dirty);
    }

    /// Validate and persist the record.
    ///
    /// Returns `Ok(false)` when validation rejects the record (a danger alert
    /// is shown and nothing is persisted) or when the service fails to
    /// persist (its task result is shown).
    ///
    /// # Errors
    /// - `SessionError::NotLoaded` if no record is loaded
    /// - `SessionError::IllegalTransition` if a save is already in flight
    /// - `SessionError::Disposed` if the session is disposed, including while
    ///   the persist was pending
    pub async fn save(&self) -> Result<bool, SessionError> {
        let inner = &self.inner;

        let valid = {
            let mut state = inner.state.lock();
            let session = match &mut *state {
                SessionState::Loaded(session) => session,
                SessionState::NoSession => return Err(SessionError::NotLoaded),
                SessionState::Disposed => return Err(SessionError::Disposed),
            };
            inner.transition(SavePhase::Validating)?;
            session.validation.validate()
        };
        let _in_flight = InFlight(&inner.phase);

        if !valid {
            inner.transition(SavePhase::Invalid)?;
            tracing::warn!("Save rejected: record {} failed validation", inner.service.record_id());
            inner.collaborators.alerts.set_alert(AlertMessage::danger(
                inner.config.messages.validation_error.clone(),
            ));
            inner.transition(SavePhase::Idle)?;
            return Ok(false);
        }

        inner.transition(SavePhase::Saving)?;
        let ok = inner.service.save_record().await;

        {
            let mut state = inner.state.lock();
            match &mut *state {
                SessionState::Loaded(session) if ok => session.validation.mark_unmodified(),
                SessionState::Disposed => {
                    tracing::debug!("Save resumed on a disposed session");
                    return Err(SessionError::Disposed);
                }
                _ => {}
            }
        }

        if ok {
            inner.transition(SavePhase::Saved)?;
            tracing::info!("Record {} saved", inner.service.record_id());
        } else {
            inner.transition(SavePhase::Failed)?;
            tracing::warn!("Record {} failed to save", inner.service.record_id());
        }
        inner.collaborators.alerts.set_alert(inner.service.task_result());
        inner.render.request();
        inner.transition(SavePhase::Idle)?;
        Ok(ok)
    }

    /// Save, then exit if the save succeeded.
    ///
    /// Returns the exit path taken, or `None` when the form stays open with
    /// the alert from `save` visible.
    ///
    /// # Errors
    /// Same as [`save`](Self::save).
    pub async fn save_and_exit(&self) -> Result<Option<ExitPath>, SessionError> {
        if self.save().await? {
            Ok(Some(self.confirm_exit()))
        } else {
            Ok(None)
        }
    }

    /// Exit if clean; otherwise leave it to the caller to confirm.
    pub fn try_exit(&self) -> ExitDecision {
        if self.is_clean() {
            ExitDecision::Exited(self.confirm_exit())
        } else {
            tracing::debug!("Exit needs confirmation: record {} is dirty", self.inner.service.record_id());
            ExitDecision::ConfirmationRequired
        }
    }

    /// Force the record clean and exit, discarding unsaved changes.
    pub fn confirm_exit(&self) -> ExitPath {
        let inner = &self.inner;
        inner.service.set_dirty_state(false);

        let path = if inner.config.is_modal {
            inner.collaborators.exit.modal_exit();
            ExitPath::ModalClose
        } else {
            inner.collaborators.exit.exit();
            ExitPath::Navigate
        };
        tracing::info!("Exited record {} via {:?}", inner.service.record_id(), path);
        path
    }

    /// Release both event subscriptions and drop the validation context.
    ///
    /// Idempotent. Events raised afterwards, and saves resuming afterwards,
    /// have no effect on the session.
    pub fn dispose(&self) {
        let taken = {
            let mut subscriptions = self.inner.subscriptions.lock();
            let previous =
                std::mem::replace(&mut *self.inner.state.lock(), SessionState::Disposed);
            if matches!(previous, SessionState::Disposed) {
                return;
            }
            subscriptions.take()
        };

        if let Some(Subscriptions { dirty, clean }) = taken {
            self.inner.service.unsubscribe(dirty);
            self.inner.service.unsubscribe(clean);
        }
        tracing::debug!("Session for record {} disposed", self.inner.config.record_id);
    }

    // ---- derived view state ----

    /// True when the service reports the record clean
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.inner.service.is_clean()
    }

    #[must_use]
    pub fn is_new_record(&self) -> bool {
        self.inner.service.record_id().is_unassigned()
    }

    #[must_use]
    pub fn is_modal(&self) -> bool {
        self.inner.config.is_modal
    }

    #[must_use]
    pub fn page_title(&self) -> String {
        let description = self
            .inner
            .service
            .record_description()
            .unwrap_or_else(|| self.inner.config.default_description.clone());
        if self.is_new_record() {
            format!("New {description}")
        } else {
            format!("{description} Editor")
        }
    }

    #[must_use]
    pub fn card_border_class(&self) -> &'static str {
        if self.is_clean() {
            "border-secondary"
        } else {
            "border-danger"
        }
    }

    #[must_use]
    pub fn card_header_class(&self) -> &'static str {
        if self.is_clean() {
            "bg-secondary text-white"
        } else {
            "bg-danger text-white"
        }
    }

    #[must_use]
    pub fn card_css(&self) -> &'static str {
        if self.is_modal() {
            "m-0"
        } else {
            ""
        }
    }

    /// True when there is nothing to edit: no record or no validation context
    #[must_use]
    pub fn is_error(&self) -> bool {
        let loaded = matches!(*self.inner.state.lock(), SessionState::Loaded(_));
        !(loaded && self.inner.service.record().is_some())
    }

    /// Everything above in one snapshot
    #[must_use]
    pub fn view_state(&self) -> ViewState {
        ViewState {
            page_title: self.page_title(),
            is_clean: self.is_clean(),
            is_new_record: self.is_new_record(),
            is_modal: self.is_modal(),
            is_error: self.is_error(),
            card_border_class: self.card_border_class().to_string(),
            card_header_class: self.card_header_class().to_string(),
            card_css: self.card_css().to_string(),
            save_phase: self.save_phase(),
        }
    }

    // ---- session introspection ----

    #[must_use]
    pub fn save_phase(&self) -> SavePhase {
        *self.inner.phase.lock()
    }

    /// True while a validation context exists
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(*self.inner.state.lock(), SessionState::Loaded(_))
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        !self.inner.is_live()
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.inner.subscriptions.lock().is_some()
    }

    /// Modification mark of the validation context; false when not loaded
    #[must_use]
    pub fn is_modified(&self) -> bool {
        match &*self.inner.state.lock() {
            SessionState::Loaded(session) => session.validation.is_modified(),
            _ => false,
        }
    }

    /// Field messages from the last validation
    #[must_use]
    pub fn field_errors(&self) -> Vec<FieldError> {
        match &*self.inner.state.lock() {
            SessionState::Loaded(session) => session.validation.field_errors().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Number of render requests issued so far
    #[must_use]
    pub fn render_requests(&self) -> u64 {
        self.inner.render.requests()
    }

    /// Receiver that wakes on every render request
    #[must_use]
    pub fn subscribe_render(&self) -> watch::Receiver<u64> {
        self.inner.render.subscribe()
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn service(&self) -> &Arc<S> {
        &self.inner.service
    }
}

impl<S: RecordService + 'static> Drop for EditSessionController<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<S: RecordService + 'static> std::fmt::Debug for EditSessionController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSessionController")
            .field("record_id", &self.inner.config.record_id)
            .field("is_modal", &self.inner.config.is_modal)
            .field("loaded", &self.is_loaded())
            .field("subscribed", &self.is_subscribed())
            .field("save_phase", &self.save_phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockExitHandler, MockNavigationGuard};
    use crate::memory::{InMemoryRecordService, RecordingAlerts, RecordingExit, RecordingGuard};
    use crate::validation::{Validate, ValidationReport};
    use crate::Severity;

    #[derive(Debug, Clone, Default)]
    struct Item {
        name: String,
    }

    impl Validate for Item {
        fn validate(&self) -> ValidationReport {
            let mut report = ValidationReport::valid();
            if self.name.is_empty() {
                report.push("name", "Name is required");
            }
            report
        }
    }

    type Service = InMemoryRecordService<Item>;

    fn service() -> Arc<Service> {
        Arc::new(
            InMemoryRecordService::new()
                .with_description("Item")
                .with_record(42, Item { name: "bolt".into() }),
        )
    }

    fn session_with(
        service: &Arc<Service>,
        config: SessionConfig,
        guard: Arc<dyn NavigationGuard>,
        exit: Arc<dyn ExitHandler>,
    ) -> (EditSessionController<Service>, Arc<RecordingAlerts>) {
        let alerts = Arc::new(RecordingAlerts::new());
        let session = EditSessionController::new(
            Arc::clone(service),
            config,
            Collaborators::new(guard, alerts.clone(), exit),
        );
        (session, alerts)
    }

    #[tokio::test]
    async fn field_change_before_load_is_ignored() {
        let service = service();
        let (session, _) = session_with(
            &service,
            SessionConfig::new(),
            Arc::new(RecordingGuard::new()),
            Arc::new(RecordingExit::new()),
        );

        session.on_field_changed(true);
        assert!(service.is_clean());
        assert!(session.is_error());
        assert!(!session.is_loaded());
    }

    #[tokio::test]
    async fn first_render_subscribes_once() {
        let service = service();
        let (session, _) = session_with(
            &service,
            SessionConfig::new().with_record_id(42),
            Arc::new(RecordingGuard::new()),
            Arc::new(RecordingExit::new()),
        );
        session.load(true).await.unwrap();

        session.on_first_render();
        session.on_first_render();
        assert_eq!(service.subscriber_count(), 2);

        session.dispose();
        assert_eq!(service.subscriber_count(), 0);
        assert!(!session.is_subscribed());
    }

    #[tokio::test]
    async fn dirty_handler_drives_guard_once_per_event() {
        let mut guard = MockNavigationGuard::new();
        guard.expect_set_locked().withf(|locked| *locked).times(1).return_const(());
        guard
            .expect_set_page_exit_check()
            .withf(|armed| *armed)
            .times(1)
            .return_const(());

        let service = service();
        let (session, alerts) = session_with(
            &service,
            SessionConfig::new().with_record_id(42),
            Arc::new(guard),
            Arc::new(RecordingExit::new()),
        );
        session.load(true).await.unwrap();
        session.on_first_render();

        session.on_field_changed(true);
        session.on_field_changed(true);

        assert_eq!(alerts.current().unwrap().severity, Severity::Warning);
        assert_eq!(session.render_requests(), 1);
        assert!(session.is_modified());
    }

    #[tokio::test]
    async fn confirm_exit_on_dirty_modal_closes_overlay() {
        let mut exit = MockExitHandler::new();
        exit.expect_modal_exit().times(1).return_const(());
        exit.expect_exit().never();

        let service = service();
        let (session, _) = session_with(
            &service,
            SessionConfig::new().with_record_id(42).modal(true),
            Arc::new(RecordingGuard::new()),
            Arc::new(exit),
        );
        session.load(true).await.unwrap();
        session.on_first_render();
        session.on_field_changed(true);
        assert!(!session.is_clean());

        assert_eq!(session.confirm_exit(), ExitPath::ModalClose);
        assert!(session.is_clean());
    }

    #[tokio::test]
    async fn try_exit_on_dirty_invokes_nothing() {
        let mut exit = MockExitHandler::new();
        exit.expect_exit().never();
        exit.expect_modal_exit().never();

        let service = service();
        let (session, _) = session_with(
            &service,
            SessionConfig::new().with_record_id(42),
            Arc::new(RecordingGuard::new()),
            Arc::new(exit),
        );
        session.load(true).await.unwrap();
        session.on_field_changed(true);

        assert_eq!(session.try_exit(), ExitDecision::ConfirmationRequired);
        assert!(!session.is_clean());
    }

    #[tokio::test]
    async fn save_without_record_is_not_loaded() {
        let service = service();
        let (session, _) = session_with(
            &service,
            SessionConfig::new(),
            Arc::new(RecordingGuard::new()),
            Arc::new(RecordingExit::new()),
        );

        assert!(matches!(session.save().await, Err(SessionError::NotLoaded)));
        assert_eq!(service.save_calls(), 0);
    }

    #[tokio::test]
    async fn invalid_save_requests_no_render() {
        let service = service();
        let (session, alerts) = session_with(
            &service,
            SessionConfig::new(),
            Arc::new(RecordingGuard::new()),
            Arc::new(RecordingExit::new()),
        );
        session.load(true).await.unwrap();

        assert!(!session.save().await.unwrap());
        assert_eq!(session.render_requests(), 0);
        assert_eq!(service.save_calls(), 0);
        assert_eq!(
            alerts.current(),
            Some(AlertMessage::danger(
                SessionConfig::new().messages.validation_error
            ))
        );
        assert_eq!(session.field_errors().len(), 1);
        assert_eq!(session.save_phase(), SavePhase::Idle);
    }

    #[tokio::test]
    async fn failed_load_propagates() {
        let service = service();
        let (session, _) = session_with(
            &service,
            SessionConfig::new().with_record_id(7),
            Arc::new(RecordingGuard::new()),
            Arc::new(RecordingExit::new()),
        );

        let err = session.load(true).await.unwrap_err();
        assert!(matches!(err, SessionError::Load(crate::ServiceError::NotFound(_))));
        assert!(session.is_error());
    }

    #[tokio::test]
    async fn load_after_dispose_is_refused() {
        let service = service();
        let (session, _) = session_with(
            &service,
            SessionConfig::new(),
            Arc::new(RecordingGuard::new()),
            Arc::new(RecordingExit::new()),
        );
        session.dispose();

        assert!(matches!(session.load(true).await, Err(SessionError::Disposed)));
        session.on_first_render();
        assert_eq!(service.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn drop_releases_subscriptions() {
        let service = service();
        {
            let (session, _) = session_with(
                &service,
                SessionConfig::new(),
                Arc::new(RecordingGuard::new()),
                Arc::new(RecordingExit::new()),
            );
            session.load(true).await.unwrap();
            session.on_first_render();
            assert_eq!(service.subscriber_count(), 2);
        }
        assert_eq!(service.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn view_state_snapshot() {
        let service = service();
        let (session, _) = session_with(
            &service,
            SessionConfig::new().with_record_id(42).modal(true),
            Arc::new(RecordingGuard::new()),
            Arc::new(RecordingExit::new()),
        );
        session.load(true).await.unwrap();

        let view = session.view_state();
        assert_eq!(view.page_title, "Item Editor");
        assert!(view.is_clean);
        assert!(!view.is_new_record);
        assert!(!view.is_error);
        assert_eq!(view.card_border_class, "border-secondary");
        assert_eq!(view.card_header_class, "bg-secondary text-white");
        assert_eq!(view.card_css, "m-0");
        assert_eq!(view.save_phase, SavePhase::Idle);
    }
}
