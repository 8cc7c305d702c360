//! Testing utilities for the editform workspace
//!
//! Shared test record, fixtures and helpers.

#![allow(missing_docs)]

use editform_core::memory::{InMemoryRecordService, RecordingAlerts, RecordingExit, RecordingGuard};
use editform_core::{
    Collaborators, EditSessionController, RecordService, SessionConfig, Validate,
    ValidationReport,
};
use std::sync::Arc;

/// Identifier of the widget every fixture service is seeded with
pub const EXISTING_ID: u64 = 42;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Widget {
    pub name: String,
    pub price_cents: i64,
}

impl Validate for Widget {
    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::valid();
        if self.name.trim().is_empty() {
            report.push("name", "Name is required");
        }
        if self.price_cents < 0 {
            report.push("price_cents", "Price cannot be negative");
        }
        report
    }
}

pub fn widget(name: &str, price_cents: i64) -> Widget {
    Widget {
        name: name.to_string(),
        price_cents,
    }
}

pub type WidgetService = InMemoryRecordService<Widget>;

pub fn widget_service() -> WidgetService {
    InMemoryRecordService::new()
        .with_description("Widget")
        .with_record(EXISTING_ID, widget("Sprocket", 250))
}

/// A session wired to in-memory collaborators
pub struct Fixture {
    pub service: Arc<WidgetService>,
    pub guard: Arc<RecordingGuard>,
    pub alerts: Arc<RecordingAlerts>,
    pub exit: Arc<RecordingExit>,
    pub session: EditSessionController<WidgetService>,
}

impl Fixture {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_service(widget_service(), config)
    }

    pub fn with_service(service: WidgetService, config: SessionConfig) -> Self {
        let service = Arc::new(service);
        let guard = Arc::new(RecordingGuard::new());
        let alerts = Arc::new(RecordingAlerts::new());
        let exit = Arc::new(RecordingExit::new());
        let session = EditSessionController::new(
            Arc::clone(&service),
            config,
            Collaborators::new(guard.clone(), alerts.clone(), exit.clone()),
        );
        Self {
            service,
            guard,
            alerts,
            exit,
            session,
        }
    }

    /// Loaded and rendered once, i.e. subscribed
    pub async fn loaded(config: SessionConfig) -> Self {
        let fixture = Self::new(config);
        fixture.session.load(true).await.unwrap();
        fixture.session.on_first_render();
        fixture
    }

    /// Existing widget, non-modal, loaded and subscribed
    pub async fn existing() -> Self {
        Self::loaded(SessionConfig::new().with_record_id(EXISTING_ID)).await
    }

    /// Write a field the way a widget would, then report the edit
    pub fn edit(&self, change: impl FnOnce(&mut Widget)) {
        if let Some(record) = self.service.record() {
            change(&mut record.write());
        }
        self.session.on_field_changed(true);
    }
}
