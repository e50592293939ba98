use georemind_core::{
    GeofencePolicy, GeofenceReconciler, InMemoryGeofencingProvider, LocalReminderRepository,
    LocationCapability, ProviderError, ReconcileOutcome, RegistrationOutcome, Reminder,
    ReminderRepository, ReminderValidationError, SqliteReminderStore, StaticLocationAccess,
    TransitionMask,
};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    repo: Arc<LocalReminderRepository>,
    provider: Arc<InMemoryGeofencingProvider>,
    reconciler: GeofenceReconciler,
}

fn fixture_with_access(access: StaticLocationAccess) -> Fixture {
    let store = SqliteReminderStore::open_in_memory().unwrap();
    let repo = Arc::new(LocalReminderRepository::new(Arc::new(store)));
    let provider = Arc::new(InMemoryGeofencingProvider::new());
    let reconciler = GeofenceReconciler::new(
        repo.clone(),
        provider.clone(),
        Arc::new(access),
        GeofencePolicy::default(),
    );
    Fixture {
        repo,
        provider,
        reconciler,
    }
}

fn fixture() -> Fixture {
    fixture_with_access(StaticLocationAccess::all_granted())
}

async fn region_ids(provider: &InMemoryGeofencingProvider) -> Vec<String> {
    provider
        .regions()
        .await
        .into_iter()
        .map(|region| region.region_id)
        .collect()
}

fn completed(outcome: ReconcileOutcome) -> georemind_core::ReconcileSummary {
    match outcome {
        ReconcileOutcome::Completed(summary) => summary,
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn setup_all_registers_eligible_reminders_with_canonical_policy() {
    let fx = fixture();
    fx.repo
        .save_reminder(&Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();
    fx.repo
        .save_reminder(&Reminder::with_id("b", "Bakery").at(48.85, 2.35))
        .await
        .unwrap();

    let summary = completed(fx.reconciler.setup_all_geofences().await);

    assert_eq!(summary.registered, vec!["a".to_string(), "b".to_string()]);
    assert!(summary.skipped.is_empty());
    assert_eq!(fx.provider.register_call_count(), 1);

    let region = fx.provider.region("a").await.unwrap();
    assert_eq!(region.radius_meters, 100.0);
    assert_eq!(region.transition_mask, TransitionMask::ENTER | TransitionMask::DWELL);
    assert_eq!(region.loitering_delay, Duration::from_secs(30));
    assert_eq!(region.center.latitude, 35.0);
}

#[tokio::test]
async fn setup_all_is_idempotent() {
    let fx = fixture();
    fx.repo
        .save_reminder(&Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();

    completed(fx.reconciler.setup_all_geofences().await);
    let first = fx.provider.regions().await;
    let second_summary = completed(fx.reconciler.setup_all_geofences().await);

    assert_eq!(fx.provider.regions().await, first);
    assert!(second_summary.removed.is_empty());
    assert_eq!(fx.reconciler.registered_ids().await, vec!["a".to_string()]);
}

#[tokio::test]
async fn setup_all_skips_ineligible_reminders() {
    let fx = fixture();
    fx.repo
        .save_reminder(&Reminder::with_id("ok", "Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();
    fx.repo
        .save_reminder(&Reminder::with_id("no-location", "Groceries"))
        .await
        .unwrap();
    fx.repo
        .save_reminder(&Reminder::with_id("place-name", "Gym").labelled("Downtown Gym"))
        .await
        .unwrap();

    let summary = completed(fx.reconciler.setup_all_geofences().await);

    assert_eq!(summary.registered, vec!["ok".to_string()]);
    assert_eq!(summary.skipped.len(), 2);
    assert!(summary.skipped.iter().any(|skipped| {
        skipped.reminder_id == "no-location"
            && skipped.reason == ReminderValidationError::MissingLocation
    }));
    assert_eq!(region_ids(&fx.provider).await, vec!["ok".to_string()]);
}

#[tokio::test]
async fn setup_all_with_no_eligible_reminders_makes_no_provider_call() {
    let fx = fixture();
    fx.repo
        .save_reminder(&Reminder::with_id("a", "Groceries"))
        .await
        .unwrap();

    let summary = completed(fx.reconciler.setup_all_geofences().await);

    assert!(summary.registered.is_empty());
    assert_eq!(fx.provider.register_call_count(), 0);
}

#[tokio::test]
async fn missing_location_access_is_a_no_op() {
    let fx = fixture_with_access(StaticLocationAccess::new([LocationCapability::Foreground]));
    fx.repo
        .save_reminder(&Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();

    let outcome = fx.reconciler.setup_all_geofences().await;
    assert_eq!(
        outcome,
        ReconcileOutcome::Skipped {
            missing: vec![LocationCapability::Background]
        }
    );

    let single = fx
        .reconciler
        .add_geofence_for_reminder(&Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await;
    assert!(matches!(single, RegistrationOutcome::Skipped { .. }));
    assert_eq!(fx.provider.register_call_count(), 0);
}

#[tokio::test]
async fn disabled_location_services_close_the_gate() {
    let fx = fixture_with_access(StaticLocationAccess::all_granted().location_disabled());

    let outcome = fx.reconciler.setup_all_geofences().await;
    assert!(matches!(outcome, ReconcileOutcome::Skipped { .. }));
}

#[tokio::test]
async fn provider_failure_keeps_previous_regions() {
    let fx = fixture();
    fx.repo
        .save_reminder(&Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();
    completed(fx.reconciler.setup_all_geofences().await);

    fx.repo
        .save_reminder(&Reminder::with_id("b", "Bakery").at(48.85, 2.35))
        .await
        .unwrap();
    let error = ProviderError::Rejected {
        code: 1000,
        message: "geofence not available".to_string(),
    };
    fx.provider.fail_with(error.clone()).await;

    let summary = completed(fx.reconciler.setup_all_geofences().await);

    assert_eq!(summary.register_error, Some(error));
    assert!(summary.has_provider_error());
    assert!(summary.registered.is_empty());
    assert_eq!(region_ids(&fx.provider).await, vec!["a".to_string()]);
    assert_eq!(fx.reconciler.registered_ids().await, vec!["a".to_string()]);

    fx.provider.clear_failure().await;
    let retried = completed(fx.reconciler.setup_all_geofences().await);
    assert_eq!(retried.registered, vec!["a".to_string(), "b".to_string()]);
    assert!(!retried.has_provider_error());
    assert_eq!(fx.provider.regions().await.len(), 2);
}

#[tokio::test]
async fn delete_all_then_setup_removes_stale_regions() {
    let fx = fixture();
    fx.repo
        .save_reminder(&Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();
    completed(fx.reconciler.setup_all_geofences().await);

    fx.repo.delete_all_reminders().await.unwrap();
    let summary = completed(fx.reconciler.setup_all_geofences().await);

    assert_eq!(summary.removed, vec!["a".to_string()]);
    assert!(fx.provider.regions().await.is_empty());
    assert!(fx.reconciler.registered_ids().await.is_empty());
    assert_eq!(fx.provider.remove_call_count(), 1);
}

#[tokio::test]
async fn remove_failure_is_reported_and_region_kept() {
    let fx = fixture();
    fx.repo
        .save_reminder(&Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();
    completed(fx.reconciler.setup_all_geofences().await);

    fx.repo.delete_all_reminders().await.unwrap();
    fx.provider
        .fail_with(ProviderError::Unavailable("service down".to_string()))
        .await;
    let summary = completed(fx.reconciler.setup_all_geofences().await);

    assert!(summary.has_provider_error());
    assert!(summary.remove_error.is_some());
    assert!(summary.removed.is_empty());
    assert_eq!(fx.reconciler.registered_ids().await, vec!["a".to_string()]);
}

#[tokio::test]
async fn add_single_registers_or_declines() {
    let fx = fixture();

    let registered = fx
        .reconciler
        .add_geofence_for_reminder(&Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await;
    assert_eq!(
        registered,
        RegistrationOutcome::Registered {
            region_id: "a".to_string()
        }
    );

    let declined = fx
        .reconciler
        .add_geofence_for_reminder(&Reminder::with_id("b", "Gym"))
        .await;
    assert_eq!(
        declined,
        RegistrationOutcome::Declined(ReminderValidationError::MissingLocation)
    );
    assert_eq!(region_ids(&fx.provider).await, vec!["a".to_string()]);
}

#[tokio::test]
async fn re_adding_a_reminder_replaces_its_region() {
    let fx = fixture();

    fx.reconciler
        .add_geofence_for_reminder(&Reminder::with_id("a", "Pharmacy").at(1.0, 1.0))
        .await;
    fx.reconciler
        .add_geofence_for_reminder(&Reminder::with_id("a", "Pharmacy").at(2.0, 2.0))
        .await;

    let regions = fx.provider.regions().await;
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].center.latitude, 2.0);
}

#[tokio::test]
async fn add_single_reports_provider_failure() {
    let fx = fixture();
    fx.provider
        .fail_with(ProviderError::Unavailable("service down".to_string()))
        .await;

    let outcome = fx
        .reconciler
        .add_geofence_for_reminder(&Reminder::with_id("a", "Pharmacy").at(1.0, 1.0))
        .await;

    assert!(matches!(outcome, RegistrationOutcome::ProviderFailed(_)));
    assert!(fx.reconciler.registered_ids().await.is_empty());
}
