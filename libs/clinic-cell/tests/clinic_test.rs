use assert_matches::assert_matches;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{body_partial_json, method, path, query_param};

use clinic_cell::{clinic_routes, dentist_routes, ClinicError, DentistListQuery, UpdateDentistRequest};
use clinic_cell::services::{ClinicService, DentistService};
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn call(router: Router, secret: &str, method_name: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let token = JwtTestUtils::create_test_token(&TestUser::admin("yonetici@klinik.com"), secret, None);

    let request = Request::builder()
        .method(method_name)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };

    (status, body)
}

#[tokio::test]
async fn test_dentist_list_is_active_only_and_scoped_to_clinic() {
    let server = MockServer::start().await;
    let clinic_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/dentists"))
        .and(query_param("is_active", "eq.true"))
        .and(query_param("clinic_id", format!("eq.{}", clinic_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::dentist_row(Uuid::new_v4(), clinic_id, "Ayşe Yılmaz")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = DentistService::new(&TestConfig::with_supabase_url(server.uri()).to_app_config());
    let dentists = service
        .list_dentists(DentistListQuery { clinic: Some(clinic_id) }, "token")
        .await
        .unwrap();

    assert_eq!(dentists.len(), 1);
    assert_eq!(dentists[0].specialty, "Ortodonti");
}

#[tokio::test]
async fn test_deactivating_dentist_patches_flag() {
    let server = MockServer::start().await;
    let clinic_id = Uuid::new_v4();
    let dentist_id = Uuid::new_v4();

    let mut row = MockSupabaseResponses::dentist_row(dentist_id, clinic_id, "Ayşe Yılmaz");
    row["is_active"] = json!(false);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/dentists"))
        .and(query_param("id", format!("eq.{}", dentist_id)))
        .and(body_partial_json(json!({ "is_active": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .expect(1)
        .mount(&server)
        .await;

    let service = DentistService::new(&TestConfig::with_supabase_url(server.uri()).to_app_config());
    let request = UpdateDentistRequest { is_active: Some(false), ..Default::default() };
    let dentist = service.update_dentist(dentist_id, request, "token").await.unwrap();

    assert!(!dentist.is_active);
}

#[tokio::test]
async fn test_get_unknown_clinic_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/clinics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = ClinicService::new(&TestConfig::with_supabase_url(server.uri()).to_app_config());
    let err = service.get_clinic(Uuid::new_v4(), "token").await.unwrap_err();

    assert_matches!(err.downcast_ref::<ClinicError>(), Some(ClinicError::ClinicNotFound));
}

#[tokio::test]
async fn test_route_create_clinic_returns_created() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/clinics"))
        .and(body_partial_json(json!({ "name": "Gülüş Diş Kliniği" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::clinic_row(Uuid::new_v4(), "Gülüş Diş Kliniği")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(server.uri());
    let (status, body) = call(
        clinic_routes(config.to_arc()),
        &config.jwt_secret,
        "POST",
        "/",
        Some(json!({ "name": " Gülüş Diş Kliniği ", "phone": "02165550000" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Gülüş Diş Kliniği");
}

#[tokio::test]
async fn test_route_blank_clinic_name_is_rejected_without_write() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(server.uri());
    let (status, body) = call(
        clinic_routes(config.to_arc()),
        &config.jwt_secret,
        "POST",
        "/",
        Some(json!({ "name": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name is required");
}

#[tokio::test]
async fn test_route_delete_unknown_dentist_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/dentists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(server.uri());
    let (status, body) = call(
        dentist_routes(config.to_arc()),
        &config.jwt_secret,
        "DELETE",
        &format!("/{}", Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Dentist not found");
}

#[tokio::test]
async fn test_dentist_routes_reject_missing_token() {
    let response = dentist_routes(TestConfig::default().to_arc())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_route_blank_clinic_filter_lists_all_active_dentists() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/dentists"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(server.uri());
    let (status, body) = call(dentist_routes(config.to_arc()), &config.jwt_secret, "GET", "/?clinic=", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
