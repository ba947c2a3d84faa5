mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::router::{appointment_routes, slot_routes};
use shared_utils::test_utils::TestActor;

use common::Clinic;

async fn create_test_app() -> (Router, Clinic) {
    let clinic = Clinic::new();
    clinic.open_window(1, (9, 0), (12, 0)).await;

    let app = Router::new()
        .nest("/appointments", appointment_routes(clinic.booking.clone()))
        .nest("/doctors", slot_routes(clinic.slots.clone()));
    (app, clinic)
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, actor: Option<&TestActor>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(actor) = actor {
        builder = actor.apply(builder);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, actor: Option<&TestActor>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(actor) = actor {
        builder = actor.apply(builder);
    }
    builder.body(Body::empty()).unwrap()
}

fn booking_body(doctor_id: Uuid, time: &str) -> Value {
    json!({
        "doctor_id": doctor_id,
        "date": "2030-01-07",
        "time": time,
        "appointment_type": "consultation",
        "notes": "Recurring headaches"
    })
}

#[tokio::test]
async fn test_book_appointment_returns_created() {
    let (app, clinic) = create_test_app().await;
    let patient = TestActor::patient();

    let response = app
        .oneshot(json_request(
            "POST",
            "/appointments",
            Some(&patient),
            booking_body(clinic.doctor_id, "09:00"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "REQUESTED");
    assert_eq!(body["patient_id"], patient.patient_id().to_string());
    assert_eq!(body["date"], "2030-01-07");
    assert_eq!(body["notes"], "Recurring headaches");
}

#[tokio::test]
async fn test_booking_without_identity_is_unauthorized() {
    let (app, clinic) = create_test_app().await;

    let response = app
        .oneshot(json_request("POST", "/appointments", None, booking_body(clinic.doctor_id, "09:00")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_errors_map_to_statuses() {
    let (app, clinic) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/appointments",
            Some(&TestActor::patient()),
            booking_body(clinic.doctor_id, "09:00"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cases = [
        (booking_body(clinic.doctor_id, "09:00"), StatusCode::CONFLICT),
        (booking_body(clinic.doctor_id, "13:00"), StatusCode::UNPROCESSABLE_ENTITY),
        (booking_body(clinic.doctor_id, "25:00"), StatusCode::BAD_REQUEST),
    ];
    for (body, expected) in cases {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/appointments", Some(&TestActor::patient()), body))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
        let error = body_json(response).await;
        assert!(error["error"].is_string());
    }

    let response = app
        .oneshot(json_request(
            "POST",
            "/appointments",
            Some(&TestActor::doctor(clinic.doctor_id)),
            booking_body(clinic.doctor_id, "10:00"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_and_reschedule_flow() {
    let (app, clinic) = create_test_app().await;
    let patient = TestActor::patient();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/appointments",
            Some(&patient),
            booking_body(clinic.doctor_id, "09:00"),
        ))
        .await
        .unwrap();
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/appointments/{}/reschedule", id),
            Some(&patient),
            json!({ "date": "2030-01-07", "time": "10:30" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let moved = body_json(response).await;
    assert_eq!(moved["start_time"], created["start_time"].as_str().unwrap().replace("09:00", "10:30"));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/appointments/{}/cancel", id),
            Some(&patient),
            json!({ "reason": "Travelling that week" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled = body_json(response).await;
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(cancelled["cancel_reason"], "Travelling that week");

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/appointments/{}/reschedule", id),
            Some(&patient),
            json!({ "date": "2030-01-07", "time": "11:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_appointment_permissions() {
    let (app, clinic) = create_test_app().await;
    let patient = TestActor::patient();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/appointments",
            Some(&patient),
            booking_body(clinic.doctor_id, "11:00"),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["id"].as_str().unwrap().to_string();
    let uri = format!("/appointments/{}", id);

    let response = app.clone().oneshot(get_request(&uri, Some(&patient))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request(&uri, Some(&TestActor::patient())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get_request(&format!("/appointments/{}", Uuid::new_v4()), Some(&patient)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_appointments_for_doctor() {
    let (app, clinic) = create_test_app().await;

    for time in ["09:00", "09:30"] {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/appointments",
                Some(&TestActor::patient()),
                booking_body(clinic.doctor_id, time),
            ))
            .await
            .unwrap();
    }

    let doctor = TestActor::doctor(clinic.doctor_id);
    let response = app
        .oneshot(get_request("/appointments?date=2030-01-07&status=REQUESTED", Some(&doctor)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_available_slots_is_public() {
    let (app, clinic) = create_test_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/appointments",
            Some(&TestActor::patient()),
            booking_body(clinic.doctor_id, "09:00"),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/doctors/{}/available-slots?date=2030-01-07", clinic.doctor_id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 5);
    assert_eq!(body["slots"][0]["start_time"], "2030-01-07T09:30:00Z");

    let response = app
        .oneshot(get_request(
            &format!("/doctors/{}/available-slots?date=07-01-2030", clinic.doctor_id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_available_slots_rejects_out_of_range_durations() {
    let (app, clinic) = create_test_app().await;

    for duration in ["9223372036854775807", "-30", "1440", "60000"] {
        let response = app
            .clone()
            .oneshot(get_request(
                &format!(
                    "/doctors/{}/available-slots?date=2030-01-07&duration_minutes={}",
                    clinic.doctor_id, duration
                ),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "duration_minutes={}", duration);
    }

    let response = app
        .oneshot(get_request(
            &format!(
                "/doctors/{}/available-slots?date=2030-01-07&duration_minutes=60",
                clinic.doctor_id
            ),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["total"], 3);
}
