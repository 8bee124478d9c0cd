use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::housing::eligibility::EligibilityPolicy;
use crate::workflows::housing::portal::HousingPortal;
use crate::workflows::housing::repository::HousingStores;
use crate::workflows::housing::router::{housing_router, visible_projects_handler, ProjectsQuery};

fn acacia_router() -> Router {
    housing_router(Arc::new(acacia_harness().portal))
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .body(Body::empty())
        .expect("request builds")
}

async fn assert_error(response: Response, status: StatusCode, kind: &str) {
    assert_eq!(response.status(), status);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind").and_then(Value::as_str), Some(kind));
    assert!(payload.get("error").and_then(Value::as_str).is_some());
}

#[tokio::test]
async fn projects_route_lists_visible_projects() {
    let router = acacia_router();
    let uri = format!(
        "/api/v1/projects?applicant={}&today=2024-06-15",
        married_applicant().nric
    );

    let response = send(&router, get(&uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let listed = payload.as_array().expect("array of projects");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].get("name"), Some(&json!(ACACIA)));
    assert_eq!(
        listed[0]
            .pointer("/flats/2-room/remaining_units")
            .and_then(Value::as_u64),
        Some(10)
    );
}

#[tokio::test]
async fn unknown_or_malformed_actors_are_rejected() {
    let router = acacia_router();

    let response = send(&router, get("/api/v1/projects?applicant=not-an-nric")).await;
    assert_error(response, StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR").await;

    let response = send(&router, get("/api/v1/projects?applicant=S0000000Z")).await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND_ERROR").await;
}

#[tokio::test]
async fn create_project_route_checks_the_acting_role() {
    let router = acacia_router();
    let draft = json!({
        "name": BEGONIA,
        "neighborhood": "Boon Lay",
        "open_date": "01/08/2024",
        "close_date": "31/08/2024",
        "officer_slots": 1,
        "visible": true,
        "flats": [{ "flat_type": "2-room", "units": "2", "price": "250000" }],
    });

    let mut as_officer = draft.clone();
    as_officer["manager"] = json!(officer().nric.as_str());
    let response = send(&router, post_json("/api/v1/projects", as_officer)).await;
    assert_error(response, StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR").await;

    let mut as_manager = draft;
    as_manager["manager"] = json!(manager().nric.as_str());
    let response = send(&router, post_json("/api/v1/projects", as_manager)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("open_date"), Some(&json!("2024-08-01")));
    assert_eq!(payload.get("manager"), Some(&json!(manager().nric.as_str())));
}

#[tokio::test]
async fn acacia_booking_flows_through_the_router() {
    let router = acacia_router();
    let applicant = married_applicant().nric;

    let response = send(
        &router,
        post_json(
            "/api/v1/applications",
            json!({
                "applicant": applicant.as_str(),
                "project": ACACIA,
                "flat_type": "2-room",
                "today": "2024-06-15",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("PENDING")));

    let response = send(
        &router,
        post_json(
            &format!("/api/v1/applications/{applicant}/approve"),
            json!({ "actor": manager().nric.as_str() }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("APPROVED")));

    let response = send(
        &router,
        post_json(
            &format!("/api/v1/applications/{applicant}/book"),
            json!({ "actor": officer().nric.as_str(), "today": "2024-06-20" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("BOOKED")));

    let response = send(
        &router,
        get(&format!("/api/v1/applications/{applicant}/receipt")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("price").and_then(Value::as_u64), Some(300_000));
    assert_eq!(payload.get("booked_on"), Some(&json!("2024-06-20")));
}

#[tokio::test]
async fn business_rule_failures_map_to_conflict() {
    let router = acacia_router();

    let response = send(
        &router,
        post_json(
            "/api/v1/applications",
            json!({
                "applicant": young_single().nric.as_str(),
                "project": ACACIA,
                "flat_type": "3-room",
                "today": "2024-06-15",
            }),
        ),
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "BUSINESS_RULE_ERROR").await;

    let response = send(
        &router,
        post_json(
            &format!("/api/v1/applications/{}/withdraw", married_applicant().nric),
            json!({}),
        ),
    )
    .await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND_ERROR").await;
}

#[tokio::test]
async fn enquiry_routes_submit_and_reply() {
    let router = acacia_router();

    let response = send(
        &router,
        post_json(
            "/api/v1/enquiries",
            json!({
                "applicant": married_applicant().nric.as_str(),
                "project": ACACIA,
                "message": "Is there a shuttle bus?",
                "today": "2024-06-15",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    let id = payload
        .get("id")
        .and_then(Value::as_str)
        .expect("enquiry id")
        .to_string();
    assert_eq!(payload.get("status"), Some(&json!("PENDING")));

    let replies = format!("/api/v1/enquiries/{id}/replies");
    let response = send(
        &router,
        post_json(
            &replies,
            json!({ "actor": other_officer().nric.as_str(), "content": "Maybe" }),
        ),
    )
    .await;
    assert_error(response, StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR").await;

    let response = send(
        &router,
        post_json(
            &replies,
            json!({ "actor": officer().nric.as_str(), "content": "Yes, to the MRT." }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("ANSWERED")));
    assert_eq!(
        payload.pointer("/replies/0/content"),
        Some(&json!("Yes, to the MRT."))
    );
}

#[tokio::test]
async fn registration_route_creates_pending_requests() {
    let router = acacia_router();

    let response = send(
        &router,
        post_json(
            "/api/v1/registrations",
            json!({
                "officer": other_officer().nric.as_str(),
                "project": ACACIA,
                "today": "2024-05-25",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("PENDING")));
    assert_eq!(payload.get("requested_on"), Some(&json!("2024-05-25")));

    let response = send(
        &router,
        post_json(
            "/api/v1/registrations",
            json!({ "officer": other_officer().nric.as_str(), "project": ACACIA }),
        ),
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "BUSINESS_RULE_ERROR").await;
}

#[tokio::test]
async fn store_outages_map_to_internal_errors() {
    let stores = HousingStores {
        users: Arc::new(OfflineRepository),
        ..HousingStores::in_memory()
    };
    let portal = Arc::new(HousingPortal::new(stores, EligibilityPolicy::default()));

    let response = visible_projects_handler(
        State(portal),
        Query(ProjectsQuery {
            applicant: married_applicant().nric.to_string(),
            today: None,
        }),
    )
    .await
    .into_response();

    assert_error(response, StatusCode::INTERNAL_SERVER_ERROR, "SYSTEM_ERROR").await;
}
