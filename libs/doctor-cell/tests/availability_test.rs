use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Weekday;
use uuid::Uuid;

use doctor_cell::models::{
    AvailabilityWindow, CreateAvailabilityRequest, DoctorError, UpdateAvailabilityRequest,
};
use doctor_cell::services::{AvailabilityService, ScheduleService};
use doctor_cell::store::{AvailabilityStore, InMemoryAvailabilityStore};
use shared_models::auth::Actor;
use shared_utils::test_utils::{hm, test_date_for, test_monday, RecordingAuditor, TestActor};

struct Fixture {
    store: Arc<InMemoryAvailabilityStore>,
    audit: Arc<RecordingAuditor>,
    checker: AvailabilityService,
    schedule: ScheduleService,
    doctor_id: Uuid,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(InMemoryAvailabilityStore::new());
        let audit = RecordingAuditor::new();
        Self {
            checker: AvailabilityService::new(store.clone()),
            schedule: ScheduleService::new(store.clone(), audit.clone()),
            store,
            audit,
            doctor_id: Uuid::new_v4(),
        }
    }

    async fn seed(&self, day_of_week: i32, start: (u32, u32), end: (u32, u32)) -> AvailabilityWindow {
        let window = AvailabilityWindow::new(self.doctor_id, day_of_week, hm(start.0, start.1), hm(end.0, end.1));
        self.store.insert(window).await.unwrap()
    }

    fn doctor(&self) -> Actor {
        TestActor::doctor(self.doctor_id).actor
    }
}

fn create_request(day_of_week: i32, start: &str, end: &str) -> CreateAvailabilityRequest {
    CreateAvailabilityRequest {
        day_of_week,
        start_time: start.to_string(),
        end_time: end.to_string(),
        is_available: None,
    }
}

// ==============================================================================
// AVAILABILITY CHECKER
// ==============================================================================

#[tokio::test]
async fn slot_inside_window_is_available() {
    let fx = Fixture::new();
    fx.seed(1, (9, 0), (12, 0)).await;

    let monday = test_monday();
    assert!(fx.checker.is_available(fx.doctor_id, monday, hm(9, 0), hm(9, 30)).await.unwrap());
    assert!(fx.checker.is_available(fx.doctor_id, monday, hm(11, 30), hm(12, 0)).await.unwrap());
}

#[tokio::test]
async fn slot_spanning_adjacent_windows_is_unavailable() {
    let fx = Fixture::new();
    fx.seed(1, (9, 0), (12, 0)).await;
    fx.seed(1, (13, 0), (17, 0)).await;

    let available = fx
        .checker
        .is_available(fx.doctor_id, test_monday(), hm(11, 45), hm(12, 15))
        .await
        .unwrap();
    assert!(!available);
}

#[tokio::test]
async fn slot_on_other_weekday_is_unavailable() {
    let fx = Fixture::new();
    fx.seed(1, (9, 0), (12, 0)).await;

    let tuesday = test_date_for(Weekday::Tue);
    assert!(!fx.checker.is_available(fx.doctor_id, tuesday, hm(9, 0), hm(9, 30)).await.unwrap());
}

#[tokio::test]
async fn inactive_window_does_not_count() {
    let fx = Fixture::new();
    let mut window = fx.seed(1, (9, 0), (12, 0)).await;
    window.is_available = false;
    fx.store.update(window).await.unwrap();

    assert!(!fx.checker.is_available(fx.doctor_id, test_monday(), hm(9, 0), hm(9, 30)).await.unwrap());
    assert!(fx.checker.windows_for_date(fx.doctor_id, test_monday()).await.unwrap().is_empty());
}

#[tokio::test]
async fn other_doctors_windows_are_ignored() {
    let fx = Fixture::new();
    fx.seed(1, (9, 0), (12, 0)).await;

    let stranger = Uuid::new_v4();
    assert!(!fx.checker.is_available(stranger, test_monday(), hm(9, 0), hm(9, 30)).await.unwrap());
}

// ==============================================================================
// WINDOW MANAGEMENT
// ==============================================================================

#[tokio::test]
async fn doctor_creates_window_and_it_is_audited() {
    let fx = Fixture::new();

    let window = fx
        .schedule
        .create_window(&fx.doctor(), fx.doctor_id, create_request(1, "09:00", "12:00"))
        .await
        .unwrap();

    assert_eq!(window.start_time, hm(9, 0));
    assert_eq!(window.end_time, hm(12, 0));
    assert!(window.is_available);

    let audit = fx.audit.entries_for_resource(window.id).await;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, "AVAILABILITY_CREATED");
}

#[tokio::test]
async fn overlapping_window_on_same_day_is_rejected() {
    let fx = Fixture::new();
    fx.seed(1, (9, 0), (12, 0)).await;

    let result = fx
        .schedule
        .create_window(&fx.doctor(), fx.doctor_id, create_request(1, "11:00", "13:00"))
        .await;
    assert_matches!(result, Err(DoctorError::OverlappingWindow));

    // Touching windows and other weekdays are fine.
    assert!(fx
        .schedule
        .create_window(&fx.doctor(), fx.doctor_id, create_request(1, "12:00", "13:00"))
        .await
        .is_ok());
    assert!(fx
        .schedule
        .create_window(&fx.doctor(), fx.doctor_id, create_request(2, "11:00", "13:00"))
        .await
        .is_ok());
}

#[tokio::test]
async fn malformed_window_requests_fail_validation() {
    let fx = Fixture::new();
    let doctor = fx.doctor();

    for request in [
        create_request(7, "09:00", "12:00"),
        create_request(1, "9:00", "12:00"),
        create_request(1, "12:00", "09:00"),
        create_request(1, "09:00", "09:00"),
    ] {
        let result = fx.schedule.create_window(&doctor, fx.doctor_id, request).await;
        assert_matches!(result, Err(DoctorError::ValidationError(_)));
    }
}

#[tokio::test]
async fn only_owning_doctor_or_admin_may_manage_windows() {
    let fx = Fixture::new();

    let other_doctor = TestActor::doctor(Uuid::new_v4()).actor;
    let patient = TestActor::patient().actor;
    for actor in [other_doctor, patient] {
        let result = fx
            .schedule
            .create_window(&actor, fx.doctor_id, create_request(1, "09:00", "12:00"))
            .await;
        assert_matches!(result, Err(DoctorError::Forbidden));
    }

    let admin = TestActor::admin().actor;
    assert!(fx
        .schedule
        .create_window(&admin, fx.doctor_id, create_request(1, "09:00", "12:00"))
        .await
        .is_ok());
}

#[tokio::test]
async fn update_can_deactivate_and_move_window() {
    let fx = Fixture::new();
    let window = fx.seed(1, (9, 0), (12, 0)).await;
    fx.seed(1, (13, 0), (17, 0)).await;

    let updated = fx
        .schedule
        .update_window(
            &fx.doctor(),
            fx.doctor_id,
            window.id,
            UpdateAvailabilityRequest {
                end_time: Some("12:30".to_string()),
                is_available: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.end_time, hm(12, 30));
    assert!(!updated.is_available);

    let clash = fx
        .schedule
        .update_window(
            &fx.doctor(),
            fx.doctor_id,
            window.id,
            UpdateAvailabilityRequest {
                end_time: Some("14:00".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(clash, Err(DoctorError::OverlappingWindow));
}

#[tokio::test]
async fn update_of_unknown_or_foreign_window_is_not_found() {
    let fx = Fixture::new();
    let window = fx.seed(1, (9, 0), (12, 0)).await;

    let unknown = fx
        .schedule
        .update_window(&fx.doctor(), fx.doctor_id, Uuid::new_v4(), UpdateAvailabilityRequest::default())
        .await;
    assert_matches!(unknown, Err(DoctorError::NotFound));

    let other_doctor = Uuid::new_v4();
    let foreign = fx
        .schedule
        .update_window(
            &TestActor::doctor(other_doctor).actor,
            other_doctor,
            window.id,
            UpdateAvailabilityRequest::default(),
        )
        .await;
    assert_matches!(foreign, Err(DoctorError::NotFound));
}

#[tokio::test]
async fn list_windows_orders_by_day_then_start() {
    let fx = Fixture::new();
    fx.seed(3, (10, 0), (16, 0)).await;
    fx.seed(1, (14, 0), (17, 0)).await;
    fx.seed(1, (9, 0), (12, 0)).await;

    let windows = fx.schedule.list_windows(fx.doctor_id).await.unwrap();
    let order: Vec<(i32, _)> = windows.iter().map(|w| (w.day_of_week, w.start_time)).collect();
    assert_eq!(order, vec![(1, hm(9, 0)), (1, hm(14, 0)), (3, hm(10, 0))]);
}
