use georemind_core::{
    GeofencePolicy, GeofenceReconciler, InMemoryGeofencingProvider, LocalReminderRepository,
    ReconcileOutcome, RegistrationOutcome, Reminder, ReminderRepository, ReminderService,
    ReminderValidationError, SaveDecision, SqliteReminderStore, StaticLocationAccess,
};
use std::sync::Arc;

struct Fixture {
    repo: Arc<LocalReminderRepository>,
    provider: Arc<InMemoryGeofencingProvider>,
    service: ReminderService,
}

fn fixture(access: StaticLocationAccess) -> Fixture {
    let store = SqliteReminderStore::open_in_memory().unwrap();
    let repo = Arc::new(LocalReminderRepository::new(Arc::new(store)));
    let provider = Arc::new(InMemoryGeofencingProvider::new());
    let reconciler = Arc::new(GeofenceReconciler::new(
        repo.clone(),
        provider.clone(),
        Arc::new(access),
        GeofencePolicy::default(),
    ));
    let service = ReminderService::new(repo.clone(), reconciler);
    Fixture {
        repo,
        provider,
        service,
    }
}

#[tokio::test]
async fn save_persists_and_registers_geofence() {
    let fx = fixture(StaticLocationAccess::all_granted());

    let decision = fx
        .service
        .validate_and_save(Reminder::new("Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();

    let SaveDecision::Saved {
        reminder_id,
        geofence,
    } = decision
    else {
        panic!("reminder should be saved");
    };
    assert_eq!(
        geofence,
        RegistrationOutcome::Registered {
            region_id: reminder_id.clone()
        }
    );
    assert!(fx.repo.get_reminder(&reminder_id).await.is_success());
    assert!(fx.provider.region(&reminder_id).await.is_some());
}

#[tokio::test]
async fn save_assigns_id_when_blank() {
    let fx = fixture(StaticLocationAccess::all_granted());

    let decision = fx
        .service
        .validate_and_save(Reminder::with_id("", "Bakery").at(48.85, 2.35))
        .await
        .unwrap();

    match decision {
        SaveDecision::Saved { reminder_id, .. } => assert!(!reminder_id.is_empty()),
        other => panic!("unexpected decision: {other:?}"),
    }
}

#[tokio::test]
async fn save_declines_invalid_input_without_writing() {
    let fx = fixture(StaticLocationAccess::all_granted());

    let no_title = fx
        .service
        .validate_and_save(Reminder::with_id("a", "  ").labelled("35.0,139.0"))
        .await
        .unwrap();
    assert_eq!(
        no_title,
        SaveDecision::Declined(ReminderValidationError::MissingTitle)
    );

    let no_location = fx
        .service
        .validate_and_save(Reminder::with_id("b", "Groceries"))
        .await
        .unwrap();
    assert_eq!(
        no_location,
        SaveDecision::Declined(ReminderValidationError::MissingLocation)
    );

    assert!(fx.repo.get_reminders().await.success().unwrap().is_empty());
    assert_eq!(fx.provider.register_call_count(), 0);
}

#[tokio::test]
async fn place_name_label_is_saved_but_not_geofenced() {
    let fx = fixture(StaticLocationAccess::all_granted());

    let decision = fx
        .service
        .validate_and_save(Reminder::with_id("gym", "Gym").labelled("Downtown Gym"))
        .await
        .unwrap();

    assert!(matches!(
        decision,
        SaveDecision::Saved {
            geofence: RegistrationOutcome::Declined(ReminderValidationError::InvalidCoordinates(_)),
            ..
        }
    ));
    assert!(fx.repo.get_reminder("gym").await.is_success());
    assert!(fx.provider.regions().await.is_empty());
}

#[tokio::test]
async fn save_without_location_access_still_persists() {
    let fx = fixture(StaticLocationAccess::denied());

    let decision = fx
        .service
        .validate_and_save(Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();

    assert!(matches!(
        decision,
        SaveDecision::Saved {
            geofence: RegistrationOutcome::Skipped { .. },
            ..
        }
    ));
    assert!(fx.repo.get_reminder("a").await.is_success());
}

#[tokio::test]
async fn listing_reports_empty_state() {
    let fx = fixture(StaticLocationAccess::all_granted());

    let empty = fx.service.list_reminders().await.success().unwrap();
    assert!(empty.show_no_data);
    assert!(empty.items.is_empty());

    fx.service
        .validate_and_save(Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();
    fx.service
        .validate_and_save(Reminder::with_id("b", "Bakery").at(48.85, 2.35))
        .await
        .unwrap();

    let listing = fx.service.list_reminders().await.success().unwrap();
    assert!(!listing.show_no_data);
    assert_eq!(listing.items.len(), 2);
}

#[tokio::test]
async fn delete_all_clears_store_and_regions() {
    let fx = fixture(StaticLocationAccess::all_granted());
    fx.service
        .validate_and_save(Reminder::with_id("a", "Pharmacy").labelled("35.0,139.0"))
        .await
        .unwrap();

    let outcome = fx.service.delete_all_reminders().await.unwrap();

    let ReconcileOutcome::Completed(summary) = outcome else {
        panic!("reconcile should complete");
    };
    assert_eq!(summary.removed, vec!["a".to_string()]);
    assert!(fx.provider.regions().await.is_empty());
    assert!(fx.service.list_reminders().await.success().unwrap().show_no_data);
}

#[tokio::test]
async fn sync_registers_reminders_saved_elsewhere() {
    let fx = fixture(StaticLocationAccess::all_granted());
    fx.repo
        .save_reminder(&Reminder::with_id("imported", "Library").at(51.5, -0.12))
        .await
        .unwrap();

    let outcome = fx.service.sync_geofences().await;

    assert!(matches!(outcome, ReconcileOutcome::Completed(_)));
    assert!(fx.provider.region("imported").await.is_some());
}
