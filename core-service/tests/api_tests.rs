use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::config::{
    BoxCredentials, BrokerConfig, FeatureFlags, FolderIds, FrontendConfig, MetadataTemplates,
};
use core_service::{router, AppState};
use http_body_util::BodyExt;
use mockall::mock;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

const TOKEN_URL: &str = "https://box.test/oauth2/token";
const API_BASE: &str = "https://box.test/2.0";
const INSTANCE_URL: &str =
    "https://box.test/2.0/files/12345/metadata/enterprise_998877/wealthDocuments";

fn config(features: FeatureFlags, static_dir: &Path) -> BrokerConfig {
    BrokerConfig::builder()
        .credentials(BoxCredentials::new("client-id", "client-secret", "998877"))
        .folder_ids(FolderIds {
            root: "0".to_string(),
            documents: "111".to_string(),
            client_portal: "222".to_string(),
            forms: "333".to_string(),
        })
        .metadata_templates(MetadataTemplates {
            wealth_documents: "enterprise_998877.wealthDocuments".to_string(),
            client_info: "enterprise_998877.clientInfo".to_string(),
        })
        .form_url("https://app.box.com/forms/42")
        .endpoints(API_BASE, TOKEN_URL)
        .static_dir(static_dir)
        .features(features)
        .build()
        .unwrap()
}

fn app(mock: MockHttpClient, features: FeatureFlags, static_dir: &Path) -> Router {
    router(AppState::new(config(features, static_dir), Arc::new(mock)))
}

fn json_response(status: u16, body: Value) -> HttpResponse {
    HttpResponse::new(status, body.to_string())
}

fn form_field(request: &HttpRequest, key: &str) -> Option<String> {
    let body = request.body.as_ref()?;
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).ok()?;
    pairs.into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

fn json_body(request: &HttpRequest) -> Value {
    request
        .body
        .as_ref()
        .and_then(|body| serde_json::from_slice(body).ok())
        .unwrap_or(Value::Null)
}

fn is_client_credentials(request: &HttpRequest) -> bool {
    request.url == TOKEN_URL
        && form_field(request, "grant_type").as_deref() == Some("client_credentials")
}

fn expect_service_token(mock: &mut MockHttpClient, times: usize) {
    mock.expect_execute()
        .withf(is_client_credentials)
        .times(times)
        .returning(|_| {
            Ok(json_response(
                200,
                json!({"access_token": "svc-token", "expires_in": 4000, "token_type": "bearer"}),
            ))
        });
}

fn expect_file(mock: &mut MockHttpClient, file_id: &'static str, name: &'static str) {
    mock.expect_execute()
        .withf(move |req| {
            req.method == HttpMethod::Get && req.url == format!("{}/files/{}", API_BASE, file_id)
        })
        .returning(move |_| {
            Ok(json_response(
                200,
                json!({"type": "file", "id": file_id, "name": name}),
            ))
        });
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn upload_callback(app: &Router, body: &str) -> (StatusCode, Value) {
    send(app, post_json("/api/upload-callback", body)).await
}

fn static_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Wealth Portal</h1>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('portal');").unwrap();
    dir
}

#[tokio::test]
async fn test_config_returns_static_configuration_without_external_calls() {
    let dir = static_dir();
    let app = app(MockHttpClient::new(), FeatureFlags::default(), dir.path());

    let (status, body) = send(&app, get("/api/config")).await;

    assert_eq!(status, StatusCode::OK);
    let returned: FrontendConfig = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(
        returned,
        config(FeatureFlags::default(), dir.path()).frontend_config()
    );
    assert_eq!(body["folder_ids"]["client_portal"], "222");
    assert_eq!(body["client_id"], "client-id");
    assert!(body.get("client_secret").is_none());
}

#[tokio::test]
async fn test_token_returns_fixed_expiry() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 3);
    let app = app(mock, FeatureFlags::default(), dir.path());

    for body in [
        "",
        r#"{}"#,
        r#"{"folder_id": "111", "scopes": ["item_preview"]}"#,
    ] {
        let (status, response) = send(&app, post_json("/api/token", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["access_token"], "svc-token");
        assert_eq!(response["expires_in"], 3600);
    }
}

#[tokio::test]
async fn test_token_ignores_mistyped_scopes() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 3);
    let app = app(mock, FeatureFlags::default(), dir.path());

    for body in [
        r#"{"scopes": "item_preview"}"#,
        r#"{"folder_id": "1", "scopes": [1]}"#,
        r#"{"folder_id": [], "scopes": {"item_preview": true}}"#,
    ] {
        let (status, response) = send(&app, post_json("/api/token", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["access_token"], "svc-token");
        assert_eq!(response["expires_in"], 3600);
    }
}

#[tokio::test]
async fn test_token_malformed_json_is_rejected() {
    let dir = static_dir();
    let app = app(MockHttpClient::new(), FeatureFlags::default(), dir.path());

    let (status, body) = send(&app, post_json("/api/token", "{folder_id")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid JSON"));
}

#[tokio::test]
async fn test_token_authentication_failure_is_500() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    mock.expect_execute().returning(|_| {
        Ok(json_response(
            400,
            json!({
                "error": "invalid_client",
                "error_description": "The client credentials are invalid"
            }),
        ))
    });
    let app = app(mock, FeatureFlags::default(), dir.path());

    let (status, body) = send(&app, post_json("/api/token", "{}")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("The client credentials are invalid"));
}

#[tokio::test]
async fn test_token_downscoped_to_folder() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 1);
    mock.expect_execute()
        .withf(|req| {
            req.url == TOKEN_URL
                && form_field(req, "grant_type").as_deref()
                    == Some("urn:ietf:params:oauth:grant-type:token-exchange")
                && form_field(req, "subject_token").as_deref() == Some("svc-token")
                && form_field(req, "scope").as_deref() == Some("item_preview item_upload")
                && form_field(req, "resource").as_deref()
                    == Some("https://box.test/2.0/folders/111")
        })
        .times(1)
        .returning(|_| {
            Ok(json_response(
                200,
                json!({"access_token": "narrow-token", "expires_in": 4000}),
            ))
        });
    let features = FeatureFlags {
        downscope_tokens: true,
        ..FeatureFlags::default()
    };
    let app = app(mock, features, dir.path());

    let (status, body) = send(
        &app,
        post_json(
            "/api/token",
            r#"{"folder_id": 111, "scopes": ["item_preview", "item_upload"]}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_token"], "narrow-token");
    assert_eq!(body["expires_in"], 3600);
}

#[tokio::test]
async fn test_token_downscope_uses_default_scopes_and_root() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 2);
    mock.expect_execute()
        .withf(|req| {
            form_field(req, "scope").as_deref()
                == Some("root_readwrite item_preview item_upload item_share item_download")
                && form_field(req, "resource").as_deref()
                    == Some("https://box.test/2.0/folders/0")
        })
        .times(2)
        .returning(|_| Ok(json_response(200, json!({"access_token": "narrow-token"}))));
    let features = FeatureFlags {
        downscope_tokens: true,
        ..FeatureFlags::default()
    };
    let app = app(mock, features, dir.path());

    for body in ["", r#"{"scopes": "item_preview"}"#] {
        let (status, _) = send(&app, post_json("/api/token", body)).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_fresh_provider_authenticates_per_request() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 2);
    let app = app(mock, FeatureFlags::default(), dir.path());

    send(&app, post_json("/api/token", "{}")).await;
    send(&app, post_json("/api/token", "{}")).await;
}

#[tokio::test]
async fn test_cached_provider_authenticates_once() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 1);
    let features = FeatureFlags {
        cache_tokens: true,
        ..FeatureFlags::default()
    };
    let app = app(mock, features, dir.path());

    for _ in 0..3 {
        let (status, _) = send(&app, post_json("/api/token", "{}")).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_upload_callback_requires_file_id() {
    let dir = static_dir();
    let app = app(MockHttpClient::new(), FeatureFlags::default(), dir.path());

    for body in [
        "",
        r#"{}"#,
        r#"{"file_id": null}"#,
        r#"{"file_id": "", "file_name": "q3.pdf"}"#,
    ] {
        let (status, response) = upload_callback(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!({"error": "No file_id provided"}));
    }
}

#[tokio::test]
async fn test_upload_callback_malformed_json() {
    let dir = static_dir();
    let app = app(MockHttpClient::new(), FeatureFlags::default(), dir.path());

    let (status, body) = upload_callback(&app, "not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_upload_callback_derives_type_from_box_name() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 1);
    expect_file(&mut mock, "12345", "report.PDF");
    let app = app(mock, FeatureFlags::default(), dir.path());

    let (status, body) = upload_callback(
        &app,
        r#"{"file_id": 12345, "file_name": "client-report.pdf", "folder_id": "111"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["file_id"], "12345");
    assert_eq!(body["metadata_applied"]["fileType"], "PDF");
    assert_eq!(body["metadata_applied"]["fileName"], "client-report.pdf");

    let upload_date = body["metadata_applied"]["uploadDate"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(upload_date).is_ok());
}

#[tokio::test]
async fn test_upload_callback_unknown_type_and_missing_name() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 2);
    expect_file(&mut mock, "777", "README");
    let app = app(mock, FeatureFlags::default(), dir.path());

    for request in [
        r#"{"file_id": "777"}"#,
        r#"{"file_id": "777", "file_name": 42}"#,
    ] {
        let (status, body) = upload_callback(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata_applied"]["fileType"], "unknown");
        assert_eq!(body["metadata_applied"]["fileName"], Value::Null);
    }
}

#[tokio::test]
async fn test_upload_callback_missing_file_is_500() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 1);
    mock.expect_execute()
        .withf(|req| req.url.ends_with("/files/404"))
        .returning(|_| {
            Ok(json_response(
                404,
                json!({"type": "error", "code": "not_found", "message": "Not Found"}),
            ))
        });
    let app = app(mock, FeatureFlags::default(), dir.path());

    let (status, body) = upload_callback(&app, r#"{"file_id": "404"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("not_found"));
}

#[tokio::test]
async fn test_upload_callback_writes_metadata_and_updates_on_conflict() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 1);
    expect_file(&mut mock, "12345", "q3.xlsx");
    mock.expect_execute()
        .withf(|req| {
            let values = json_body(req);
            req.method == HttpMethod::Post
                && req.url == INSTANCE_URL
                && values["fileType"] == "xlsx"
                && values["uploadDate"].is_string()
                && values.get("fileName").is_none()
        })
        .times(1)
        .returning(|_| Ok(json_response(409, json!({"code": "tuple_already_exists"}))));
    mock.expect_execute()
        .withf(|req| req.method == HttpMethod::Get && req.url == INSTANCE_URL)
        .times(1)
        .returning(|_| {
            Ok(json_response(
                200,
                json!({"$id": "instance-1", "$template": "wealthDocuments", "fileType": "doc"}),
            ))
        });
    mock.expect_execute()
        .withf(|req| {
            let ops = json_body(req);
            let op_at = |path: &str| {
                ops.as_array()
                    .and_then(|ops| ops.iter().find(|op| op["path"] == path))
                    .map(|op| op["op"].clone())
            };
            req.method == HttpMethod::Put
                && req.url == INSTANCE_URL
                && ops.as_array().map(Vec::len) == Some(2)
                && op_at("/fileType") == Some(json!("replace"))
                && op_at("/uploadDate") == Some(json!("add"))
        })
        .times(1)
        .returning(|_| Ok(json_response(200, json!({"fileType": "xlsx"}))));
    let features = FeatureFlags {
        apply_upload_metadata: true,
        ..FeatureFlags::default()
    };
    let app = app(mock, features, dir.path());

    let (status, body) = upload_callback(&app, r#"{"file_id": "12345"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata_applied"]["fileType"], "xlsx");
    assert_eq!(body["metadata_applied"]["fileName"], Value::Null);
}

#[tokio::test]
async fn test_upload_callback_skips_unusable_template() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 1);
    expect_file(&mut mock, "12345", "q3.xlsx");

    let mut config = config(
        FeatureFlags {
            apply_upload_metadata: true,
            ..FeatureFlags::default()
        },
        dir.path(),
    );
    config.metadata_templates.wealth_documents = "YOUR_METADATA_TEMPLATE_HERE".to_string();
    let app = router(AppState::new(config, Arc::new(mock)));

    let (status, body) = upload_callback(&app, r#"{"file_id": "12345"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_file_metadata_is_stable_across_reads() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 2);
    expect_file(&mut mock, "12345", "report.pdf");
    mock.expect_execute()
        .withf(|req| req.url == "https://box.test/2.0/files/12345/metadata")
        .times(2)
        .returning(|_| {
            Ok(json_response(
                200,
                json!({
                    "entries": [{"$template": "wealthDocuments", "fileType": "pdf"}],
                    "limit": 100
                }),
            ))
        });
    let app = app(mock, FeatureFlags::default(), dir.path());

    let (first_status, first) = send(&app, get("/api/files/12345/metadata")).await;
    let (second_status, second) = send(&app, get("/api/files/12345/metadata")).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first["file_id"], "12345");
    assert_eq!(first["metadata"][0]["fileType"], "pdf");
}

#[tokio::test]
async fn test_file_metadata_error_is_500() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 1);
    mock.expect_execute()
        .withf(|req| req.url.ends_with("/files/999"))
        .returning(|_| {
            Ok(json_response(
                403,
                json!({
                    "code": "access_denied_insufficient_permissions",
                    "message": "Access denied"
                }),
            ))
        });
    let app = app(mock, FeatureFlags::default(), dir.path());

    let (status, body) = send(&app, get("/api/files/999/metadata")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("403"));
}

#[tokio::test]
async fn test_folder_metadata_omits_failed_items() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 1);
    mock.expect_execute()
        .withf(|req| req.url.starts_with("https://box.test/2.0/folders/111/items"))
        .times(1)
        .returning(|_| {
            Ok(json_response(
                200,
                json!({"total_count": 3, "entries": [
                    {"type": "file", "id": "1", "name": "a.pdf"},
                    {"type": "file", "id": "2", "name": "b.pdf"},
                    {"type": "file", "id": "3", "name": "c.pdf"}
                ], "offset": 0, "limit": 1000}),
            ))
        });
    mock.expect_execute()
        .withf(|req| req.url == "https://box.test/2.0/files/2/metadata")
        .returning(|_| Ok(json_response(500, json!({"code": "internal_server_error"}))));
    mock.expect_execute()
        .withf(|req| req.url.ends_with("/metadata"))
        .times(2)
        .returning(|_| Ok(json_response(200, json!({"entries": []}))));
    let app = app(mock, FeatureFlags::default(), dir.path());

    let (status, body) = send(&app, get("/api/folders/111/metadata")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["folder_id"], "111");
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["file_id"], "1");
    assert_eq!(items[1]["file_id"], "3");
    assert_eq!(items[1]["file_name"], "c.pdf");
}

#[tokio::test]
async fn test_folder_metadata_listing_failure_is_500() {
    let dir = static_dir();
    let mut mock = MockHttpClient::new();
    expect_service_token(&mut mock, 1);
    mock.expect_execute()
        .withf(|req| req.url.contains("/folders/"))
        .returning(|_| {
            Ok(json_response(404, json!({"code": "not_found", "message": "Not Found"})))
        });
    let app = app(mock, FeatureFlags::default(), dir.path());

    let (status, body) = send(&app, get("/api/folders/missing/metadata")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_index_served_from_static_dir() {
    let dir = static_dir();
    let app = app(MockHttpClient::new(), FeatureFlags::default(), dir.path());

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<h1>Wealth Portal</h1>");

    let response = app.clone().oneshot(get("/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/missing.css")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let dir = static_dir();
    let app = app(MockHttpClient::new(), FeatureFlags::default(), dir.path());

    let request = Request::builder()
        .uri("/api/config")
        .header("origin", "https://portal.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
