//! editform core
//!
//! Headless controller behind a single-record edit form:
//! 1. **Load**: fetch the record through a [`RecordService`] and bind a
//!    validation context to it
//! 2. **Track**: follow the service's dirty/clean events, keeping the
//!    navigation guard, alert surface and render requests in step
//! 3. **Act**: save, save-and-exit, exit and confirmed exit
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use editform_core::prelude::*;
//!
//! let session = EditSessionController::new(service, SessionConfig::new().with_record_id(42), collaborators);
//! session.load(true).await?;
//! session.on_first_render();
//!
//! session.on_field_changed(true);   // guard locks, "not saved" warning shows
//! if session.save().await? {
//!     session.try_exit();
//! }
//! session.dispose();
//! ```

// Core modules
pub mod collaborators;
pub mod config;
pub mod error;
pub mod events;
pub mod save_phase;
pub mod service;
pub mod session;
pub mod types;
pub mod validation;

// Reference collaborators
pub mod memory;

// Test harness
pub mod test_harness;

// Re-exports
pub use collaborators::{AlertSurface, ExitHandler, NavigationGuard, RenderSignal};
pub use config::{AlertTexts, SessionConfig};
pub use error::{ConfigError, ServiceError, SessionError};
pub use events::{DirtyEvent, EventHub, Handler, SubscriptionToken};
pub use save_phase::SavePhase;
pub use service::RecordService;
pub use session::{Collaborators, EditSessionController};
pub use types::{AlertMessage, ExitDecision, ExitPath, RecordId, Severity, ViewState};
pub use validation::{FieldError, SharedRecord, Validate, ValidationContext, ValidationReport};

/// Common imports for building an edit form
pub mod prelude {
    pub use crate::{
        AlertMessage, AlertSurface, Collaborators, EditSessionController, ExitDecision,
        ExitHandler, ExitPath, NavigationGuard, RecordId, RecordService, SessionConfig,
        SessionError, Severity, Validate, ValidationReport,
    };
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
