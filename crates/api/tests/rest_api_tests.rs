mod common;

use std::net::SocketAddr;

use api::app::build_router;
use api::gql::build_schema;
use api::reservations::{service, NewReservation};
use api::AppState;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::*;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn router(app_state: &AppState) -> Router {
    build_router(app_state.clone(), build_schema(app_state.clone()))
}

/// A request as the server sees it, with the peer address the rate limiter keys on.
fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let mut req = builder.body(body).expect("valid request");
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    req
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(req).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    (status, headers, body.to_vec())
}

fn json_of(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("body is JSON")
}

fn booking_body(tables: &[Uuid], from: (u32, u32), to: (u32, u32)) -> Value {
    json!({
        "tables": tables,
        "time": { "from": at(from.0, from.1).timestamp(), "to": at(to.0, to.1).timestamp() },
        "userName": "Margaret Hamilton",
        "userEmail": "margaret@example.com",
    })
}

#[tokio::test]
#[ignore = "needs PostgreSQL at TEST_DATABASE_URL"]
async fn test_rest_reservation_lifecycle() {
    let app_state = setup_test_db().await;
    let app = router(&app_state);
    let (_, tables) = create_test_restaurant(&app_state, &unique_name("Rest"), &[4]).await;

    let (status, _, body) = send(
        &app,
        request(
            Method::POST,
            "/api/reservation",
            Some(booking_body(&tables, (18, 0), (20, 0))),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created = json_of(&body);
    assert_eq!(created["tables"], json!(tables));
    assert_eq!(created["confirmed"], json!(false));
    assert_eq!(
        created["time"],
        json!({ "from": at(18, 0).timestamp(), "to": at(20, 0).timestamp() })
    );
    assert!(!String::from_utf8_lossy(&body).to_lowercase().contains("token"));
    let id = created["id"].as_str().expect("id is a string").to_string();

    let (status, _, body) = send(
        &app,
        request(
            Method::POST,
            "/api/reservation",
            Some(booking_body(&tables, (19, 0), (21, 0))),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json_of(&body)["error"].is_string());

    let (status, headers, body) =
        send(&app, request(Method::GET, &format!("/api/reservation/{id}/ics"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/calendar; charset=utf-8");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"reservation.ics\""
    );
    let ics = String::from_utf8(body).expect("calendar is UTF-8");
    assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(ics.contains(&id));

    let (status, _, _) = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/reservation/{id}?confirmationToken=wrong"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) =
        send(&app, request(Method::GET, &format!("/api/reservation/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["confirmed"], json!(false));

    let (status, _, body) =
        send(&app, request(Method::DELETE, &format!("/api/reservation/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["id"], json!(id));

    let (status, _, _) =
        send(&app, request(Method::DELETE, &format!("/api/reservation/{id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) =
        send(&app, request(Method::GET, &format!("/api/reservation/{id}/ics"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "needs PostgreSQL at TEST_DATABASE_URL"]
async fn test_rest_confirmation_with_token() {
    let app_state = setup_test_db().await;
    let app = router(&app_state);
    let (_, tables) = create_test_restaurant(&app_state, &unique_name("RestConfirm"), &[2]).await;

    // The token only travels by mail, so book through the service to learn it
    let created = service::create_reservation(
        &app_state,
        NewReservation {
            table_ids: tables,
            from: at(12, 0),
            to: at(13, 0),
            user_name: "Radia Perlman".to_string(),
            user_email: "radia@example.com".to_string(),
        },
    )
    .await
    .expect("booking succeeds");
    let id = created.details.reservation.id;
    let uri = format!(
        "/api/reservation/{id}?confirmationToken={}",
        created.confirmation_token
    );

    let (status, _, body) = send(&app, request(Method::PATCH, &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["confirmed"], json!(true));

    // Confirming again is accepted and changes nothing
    let (status, _, body) = send(&app, request(Method::PATCH, &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["confirmed"], json!(true));

    let (status, _, _) = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/reservation/{}?confirmationToken=x", Uuid::new_v4()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_requests_are_rate_limited_per_client() {
    let app_state = offline_state();
    let app = router(&app_state);

    // Rejected before any database access, but each one still spends a token
    for _ in 0..10 {
        let (status, _, body) = send(
            &app,
            request(
                Method::POST,
                "/api/reservation",
                Some(booking_body(&[], (12, 0), (13, 0))),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json_of(&body)["error"].is_string());
    }

    let (status, _, _) = send(
        &app,
        request(
            Method::POST,
            "/api/reservation",
            Some(booking_body(&[], (12, 0), (13, 0))),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_malformed_reservation_id_is_rejected() {
    let app = router(&offline_state());

    let (status, _, _) =
        send(&app, request(Method::GET, "/api/reservation/not-a-uuid", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        request(Method::PATCH, &format!("/api/reservation/{}", Uuid::new_v4()), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
