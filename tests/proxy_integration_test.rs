// Integration tests for the /api/v1 proxy and the health endpoint
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::{json, Value};
use smarthire_auth::handlers::{configure_services, HealthResponse};
use smarthire_auth::settings::SmartHireSettings;
use smarthire_auth::testing::TestFixtures;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

macro_rules! proxy_app {
    ($settings:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($settings))
                .configure(configure_services),
        )
        .await
    };
}

#[actix_web::test]
async fn test_get_is_forwarded_with_allow_listed_headers_only() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recruiter/profile"))
        .and(query_param("expand", "company"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Ada" })))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = proxy_app!(TestFixtures::settings(&upstream.uri()));
    let req = test::TestRequest::get()
        .uri("/api/v1/recruiter/profile?expand=company")
        .insert_header((header::AUTHORIZATION, "Bearer tok_123"))
        .insert_header((header::ACCEPT, "application/json"))
        .insert_header((header::COOKIE, "tracking=1"))
        .insert_header(("x-forwarded-for", "10.0.0.1"))
        .set_payload("ignored for GET")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "name": "Ada" }));

    let received = upstream.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let forwarded = &received[0];
    assert_eq!(
        forwarded.headers.get("authorization").unwrap().to_str().unwrap(),
        "Bearer tok_123"
    );
    assert_eq!(
        forwarded.headers.get("accept").unwrap().to_str().unwrap(),
        "application/json"
    );
    assert!(forwarded.headers.get("cookie").is_none());
    assert!(forwarded.headers.get("x-forwarded-for").is_none());
    assert!(forwarded.body.is_empty());
}

#[actix_web::test]
async fn test_post_body_and_upstream_status_are_relayed() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 42 })))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = proxy_app!(TestFixtures::settings(&upstream.uri()));
    let payload = json!({ "title": "Rust engineer", "remote": true });
    let req = test::TestRequest::post()
        .uri("/api/v1/jobs")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "id": 42 }));

    let received = upstream.received_requests().await.unwrap();
    let forwarded: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(forwarded, payload);
    assert_eq!(
        received[0].headers.get("content-type").unwrap().to_str().unwrap(),
        "application/json"
    );
}

#[actix_web::test]
async fn test_upstream_json_errors_keep_their_status() {
    let upstream = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/jobs/7"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found" })))
        .mount(&upstream)
        .await;

    let app = proxy_app!(TestFixtures::settings(&upstream.uri()));
    let req = test::TestRequest::delete().uri("/api/v1/jobs/7").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Not found");
}

#[actix_web::test]
async fn test_non_json_upstream_body_is_relayed_as_text() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_raw("<h1>maintenance</h1>", "text/html; charset=utf-8"),
        )
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pong".to_vec()))
        .mount(&upstream)
        .await;

    let app = proxy_app!(TestFixtures::settings(&upstream.uri()));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/status").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(test::read_body(resp).await, "<h1>maintenance</h1>");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/plain").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "pong");
}

#[actix_web::test]
async fn test_extension_methods_are_forwarded() {
    let upstream = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(207).set_body_json(json!({ "entries": [] })))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = proxy_app!(TestFixtures::settings(&upstream.uri()));
    let req = test::TestRequest::default()
        .method(actix_web::http::Method::from_bytes(b"PROPFIND").unwrap())
        .uri("/api/v1/files")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "entries": [] }));
}

#[actix_web::test]
async fn test_missing_api_base_is_a_server_error() {
    let app = proxy_app!(SmartHireSettings::default());
    let req = test::TestRequest::get().uri("/api/v1/jobs").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "API_BASE is not defined in env" }));
}

#[actix_web::test]
async fn test_unreachable_upstream_is_a_bad_gateway() {
    // Nothing listens on port 1
    let app = proxy_app!(TestFixtures::settings("http://127.0.0.1:1"));
    let req = test::TestRequest::get().uri("/api/v1/jobs").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Upstream request failed");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
}

#[actix_web::test]
async fn test_health_endpoint() {
    let app = proxy_app!(SmartHireSettings::default());
    let req = test::TestRequest::get().uri("/ping").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: HealthResponse = test::read_body_json(resp).await;
    assert_eq!(body.status, "ok");
}
