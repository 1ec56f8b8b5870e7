//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{InventoryTypeId, RateId};
use metrics_exporter_prometheus::PrometheusHandle;
use providers::{
    BookingApi, Building, InMemoryBookingApi, InMemoryPaymentGateway, NotificationSink,
    PaymentGateway, PropertyAvailability, RateOffer, RecordingNotifier,
};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (
    axum::Router,
    Arc<InMemoryBookingApi>,
    Arc<InMemoryPaymentGateway>,
) {
    let booking_api = Arc::new(InMemoryBookingApi::new());
    let gateway = Arc::new(InMemoryPaymentGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let mut config = api::Config::from_env();
    config.rate_codes = vec!["BAR".to_string(), "WKLY".to_string()];

    let state = api::create_state(
        Arc::clone(&booking_api) as Arc<dyn BookingApi>,
        Arc::clone(&gateway) as Arc<dyn PaymentGateway>,
        Arc::clone(&notifier) as Arc<dyn NotificationSink>,
        &config,
    );
    let app = api::create_app(state, get_metrics_handle());
    (app, booking_api, gateway)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn booking_body(intent_id: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "guestDetails": {
            "firstName": "Astrid",
            "lastName": "Lind",
            "email": "astrid@example.com",
            "phone": "+46701234567"
        },
        "stayDetails": {
            "startDate": "2026-09-01",
            "endDate": "2026-09-05",
            "adults": 2
        },
        "unitDetails": {
            "rateId": 11,
            "inventoryTypeId": 42,
            "buildingName": "Strandgatan 1",
            "unitName": "Studio 2B"
        },
        "paymentDetails": {
            "amount": 500.0,
            "currency": "SEK"
        }
    });
    if let Some(id) = intent_id {
        body["stripePaymentIntentId"] = serde_json::Value::String(id.to_string());
    }
    body
}

#[tokio::test]
async fn health_check() {
    let (app, _, _) = setup();

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "booking-api");
}

#[tokio::test]
async fn create_with_payment_confirms_on_the_stripe_rail() {
    let (app, _, gateway) = setup();
    gateway.script_succeeded("pi_test", common::Money::from_major(500.0), "SEK");

    let response = app
        .oneshot(post_json(
            "/booking/create-with-payment",
            booking_body(Some("pi_test")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "confirmed");
    assert_eq!(json["data"]["paymentReference"], "pi_test");
    assert_eq!(json["data"]["guestName"], "Astrid Lind");
    assert_eq!(json["data"]["invoicePosted"], true);
    assert_eq!(json["data"]["webhookSent"], true);
}

#[tokio::test]
async fn create_with_payment_rejects_missing_rail() {
    let (app, booking_api, _) = setup();

    let response = app
        .oneshot(post_json(
            "/booking/create-with-payment",
            booking_body(None),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "validation_error");
    assert!(booking_api.calls().is_empty());
}

#[tokio::test]
async fn card_rail_failure_reports_partial_state() {
    let (app, booking_api, _) = setup();
    booking_api.set_fail_on_status_update(true);

    let mut body = booking_body(None);
    body["paymentDetails"]["cardNumber"] = serde_json::json!("4111111111111111");

    let response = app
        .oneshot(post_json("/booking/create-with-payment", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "status_update_failed");
    assert_eq!(json["debug"]["contactCreated"], true);
    assert_eq!(json["debug"]["bookingCreated"], true);
    assert!(json["debug"]["bookingId"].is_i64());
    assert!(json.get("warning").is_none());
}

#[tokio::test]
async fn failure_after_charge_carries_the_payment_reference() {
    let (app, booking_api, gateway) = setup();
    gateway.script_succeeded("pi_charged", common::Money::from_major(500.0), "SEK");
    booking_api.set_fail_on_contact(true);

    let response = app
        .oneshot(post_json(
            "/booking/create-with-payment",
            booking_body(Some("pi_charged")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "contact_creation_failed");
    assert!(
        json["warning"]
            .as_str()
            .is_some_and(|w| w.contains("pi_charged"))
    );
}

#[tokio::test]
async fn legacy_create_returns_an_enquiry() {
    let (app, _, _) = setup();

    let mut body = booking_body(None);
    body.as_object_mut().unwrap().remove("paymentDetails");

    let response = app
        .oneshot(post_json("/booking/create", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "enquiry");
    assert!(json["data"].get("paymentReference").is_none());
}

#[tokio::test]
async fn booking_reads_reject_non_numeric_ids() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(get_request("/booking/not-a-number"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn created_bookings_can_be_read_back_with_payments() {
    let (app, _, gateway) = setup();
    gateway.script_succeeded("pi_read", common::Money::from_major(500.0), "SEK");

    let create = app
        .clone()
        .oneshot(post_json(
            "/booking/create-with-payment",
            booking_body(Some("pi_read")),
        ))
        .await
        .unwrap();
    let created = body_json(create).await;
    let booking_id = created["data"]["bookingId"].as_i64().unwrap();

    let read = app
        .clone()
        .oneshot(get_request(&format!("/booking/{booking_id}")))
        .await
        .unwrap();
    assert_eq!(read.status(), StatusCode::OK);
    let booking = body_json(read).await;
    assert_eq!(booking["data"]["id"], booking_id);

    let payments = app
        .oneshot(get_request(&format!("/booking/{booking_id}/payments")))
        .await
        .unwrap();
    assert_eq!(payments.status(), StatusCode::OK);
    let payments = body_json(payments).await;
    assert_eq!(payments["total"], 1);
    assert_eq!(payments["data"][0]["paymentReference"], "pi_read");
}

#[tokio::test]
async fn unknown_booking_reads_return_not_found() {
    let (app, _, _) = setup();

    let response = app.oneshot(get_request("/booking/999999")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn availability_search_reports_failed_rate_codes() {
    let (app, booking_api, _) = setup();
    booking_api.seed_availability(
        "BAR",
        vec![PropertyAvailability {
            building_id: Some(1),
            building_name: Some("Strandgatan 1".to_string()),
            inventory_type_id: InventoryTypeId::new(42),
            inventory_type_name: Some("Studio".to_string()),
            rates: vec![RateOffer {
                rate_id: RateId::new(11),
                rate_code: "BAR".to_string(),
                rate_name: "Best available".to_string(),
                currency: "SEK".to_string(),
                total_price: 2000.0,
                avg_nightly_rate: 500.0,
                nights: 4,
                description: None,
            }],
        }],
    );
    booking_api.set_rate_code_failing("WKLY", true);

    let response = app
        .oneshot(get_request(
            "/availability/search?startDate=2026-09-01&endDate=2026-09-05&guests=2",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["total"], 1);
    assert_eq!(json["failedRateCodes"], serde_json::json!(["WKLY"]));
    assert_eq!(json["searchParams"]["nights"], 4);
}

#[tokio::test]
async fn building_list_passes_through_the_provider() {
    let (app, booking_api, _) = setup();
    booking_api.seed_buildings(vec![
        Building {
            id: 1,
            name: "Strandgatan 1".to_string(),
            address: Some("Strandgatan 1, Floor 3".to_string()),
            city: Some("Stockholm".to_string()),
            post_code: Some("111 22".to_string()),
        },
        Building {
            id: 2,
            name: "Parkvagen 8".to_string(),
            address: None,
            city: None,
            post_code: None,
        },
    ]);

    let response = app
        .oneshot(get_request("/availability/buildings"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["total"], 2);
    assert_eq!(json["data"][0]["name"], "Strandgatan 1");
    assert_eq!(json["data"][0]["address"], "Strandgatan 1, Floor 3");
    assert!(json["data"][1].get("address").is_none());
}

#[tokio::test]
async fn availability_search_rejects_inverted_dates() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(get_request(
            "/availability/search?startDate=2026-09-05&endDate=2026-09-01",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payment_intents_round_trip_through_the_gateway() {
    let (app, _, _) = setup();

    let create = app
        .clone()
        .oneshot(post_json(
            "/payment/create-intent",
            serde_json::json!({ "amount": 500.0, "currency": "SEK" }),
        ))
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::OK);
    let created = body_json(create).await;
    let intent_id = created["data"]["paymentIntentId"].as_str().unwrap().to_string();
    assert!(created["data"]["clientSecret"].as_str().is_some());

    let verify = app
        .oneshot(post_json(
            "/payment/verify",
            serde_json::json!({ "paymentIntentId": intent_id }),
        ))
        .await
        .unwrap();
    assert_eq!(verify.status(), StatusCode::OK);
    let verified = body_json(verify).await;
    assert_eq!(verified["data"]["verified"], false);
    assert_eq!(verified["data"]["amount"], 500.0);
}

#[tokio::test]
async fn payment_intents_require_a_positive_amount() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(post_json(
            "/payment/create-intent",
            serde_json::json!({ "amount": -1.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let (app, _, _) = setup();

    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
