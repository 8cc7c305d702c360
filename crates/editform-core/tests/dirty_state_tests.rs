use editform_core::{AlertMessage, DirtyEvent, SessionConfig, Severity};
use editform_test_utils::{Fixture, EXISTING_ID};
use proptest::prelude::*;

#[tokio::test]
async fn edit_locks_guard_and_warns() {
    let f = Fixture::existing().await;

    f.edit(|w| w.name = "Cog".into());

    assert!(!f.session.is_clean());
    assert!(f.guard.is_locked());
    assert!(f.guard.exit_check_armed());
    assert_eq!(
        f.alerts.current(),
        Some(AlertMessage::warning("The Record isn't Saved"))
    );
    assert_eq!(f.session.card_border_class(), "border-danger");
    assert_eq!(f.session.card_header_class(), "bg-danger text-white");
}

#[tokio::test]
async fn dirty_then_clean_round_trip() {
    let f = Fixture::existing().await;

    f.session.on_record_dirty();
    f.session.on_record_clean();

    assert!(!f.guard.is_locked());
    assert!(!f.guard.exit_check_armed());
    assert_eq!(f.alerts.current(), None);
}

#[tokio::test]
async fn handlers_are_idempotent() {
    let f = Fixture::existing().await;

    f.session.on_record_dirty();
    let once = (f.guard.is_locked(), f.guard.exit_check_armed(), f.alerts.current());
    f.session.on_record_dirty();
    let twice = (f.guard.is_locked(), f.guard.exit_check_armed(), f.alerts.current());
    assert_eq!(once, twice);

    f.session.on_record_clean();
    f.session.on_record_clean();
    assert!(!f.guard.is_locked());
    assert_eq!(f.alerts.current(), None);
}

#[tokio::test]
async fn revert_to_clean_unlocks() {
    let f = Fixture::existing().await;

    f.edit(|w| w.price_cents = 300);
    f.session.on_field_changed(false);

    assert!(f.session.is_clean());
    assert!(!f.guard.is_locked());
    assert_eq!(f.alerts.current(), None);
    assert_eq!(f.session.card_border_class(), "border-secondary");
}

#[tokio::test]
async fn events_before_first_render_are_not_observed() {
    let f = Fixture::new(SessionConfig::new().with_record_id(EXISTING_ID));
    f.session.load(true).await.unwrap();

    f.session.on_field_changed(true);

    assert!(!f.session.is_clean());
    assert!(!f.guard.is_locked());
    assert_eq!(f.session.render_requests(), 0);
}

#[tokio::test]
async fn disposed_session_ignores_events() {
    let f = Fixture::existing().await;
    f.session.dispose();

    assert_eq!(f.service.emit(DirtyEvent::Dirty), 0);
    f.session.on_record_dirty();

    assert!(!f.guard.is_locked());
    assert_eq!(f.alerts.current(), None);
    assert_eq!(f.session.render_requests(), 0);
    assert!(f.session.is_error());
}

#[tokio::test]
async fn render_receiver_wakes_on_dirty() {
    let f = Fixture::existing().await;
    let mut rx = f.session.subscribe_render();

    f.edit(|w| w.name = "Gear".into());

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), 1);
}

#[tokio::test]
async fn custom_unsaved_text() {
    let mut config = SessionConfig::new().with_record_id(EXISTING_ID);
    config.messages.unsaved = "Unsaved changes".to_string();
    let f = Fixture::loaded(config).await;

    f.edit(|w| w.name = "Gear".into());

    let alert = f.alerts.current().unwrap();
    assert_eq!(alert.text, "Unsaved changes");
    assert_eq!(alert.severity, Severity::Warning);
}

proptest! {
    #[test]
    fn prop_guard_lock_tracks_dirty_flag(edits in proptest::collection::vec(any::<bool>(), 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let f = Fixture::existing().await;
            for is_dirty in edits {
                f.session.on_field_changed(is_dirty);
                prop_assert_eq!(f.guard.is_locked(), !f.session.is_clean());
                prop_assert_eq!(f.guard.exit_check_armed(), !f.session.is_clean());
            }
            Ok(())
        })?;
    }
}
