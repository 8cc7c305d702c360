use editform_core::SessionConfig;
use editform_test_utils::{Fixture, EXISTING_ID};

#[tokio::test]
async fn reload_binds_a_fresh_validation_context() {
    let f = Fixture::existing().await;
    f.edit(|w| w.name.clear());
    assert!(!f.session.save().await.unwrap());
    assert!(f.session.is_modified());
    assert!(!f.session.field_errors().is_empty());

    f.session.load(false).await.unwrap();

    assert!(f.session.is_loaded());
    assert!(!f.session.is_modified());
    assert!(f.session.field_errors().is_empty());
    assert!(f.session.is_clean());
    assert!(!f.guard.is_locked());
}

#[tokio::test]
async fn every_subscription_is_released_once() {
    let f = Fixture::new(SessionConfig::new().with_record_id(EXISTING_ID));
    f.session.load(true).await.unwrap();
    assert_eq!(f.service.subscriber_count(), 0);

    f.session.on_first_render();
    f.session.on_first_render();
    assert_eq!(f.service.subscriber_count(), 2);
    assert!(f.session.is_subscribed());

    f.session.dispose();
    f.session.dispose();
    assert_eq!(f.service.subscriber_count(), 0);
    assert!(f.session.is_disposed());
}

#[tokio::test]
async fn dispose_without_render_is_safe() {
    let f = Fixture::new(SessionConfig::new());
    f.session.dispose();
    assert!(f.session.is_disposed());
    assert_eq!(f.service.subscriber_count(), 0);
}

#[tokio::test]
async fn field_changes_after_dispose_are_ignored() {
    let f = Fixture::existing().await;
    f.session.dispose();

    f.edit(|w| w.name = "Spindle".into());

    assert!(f.session.is_clean());
    assert!(!f.guard.is_locked());
}
