use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::StatusCode, test, web, App};
use mockito::{Server, ServerGuard};
use serde_json::{json, Value};

use treepack::server::app_config;
use treepack::{Pipeline, TokenEstimator, TreeFetcher};

struct CharCount;

impl TokenEstimator for CharCount {
    fn estimate(&self, text: &str) -> anyhow::Result<usize> {
        Ok(text.chars().count())
    }
}

fn pipeline(server: &ServerGuard) -> web::Data<Pipeline> {
    let fetcher = TreeFetcher::new(None, "treepack-test").unwrap();
    web::Data::new(Pipeline::new(server.url(), fetcher, Arc::new(CharCount)))
}

async fn mock_small_repo(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let listing = json!([
        {
            "path": "main.py",
            "type": "file",
            "url": format!("{}/repos/owner/repo/contents/main.py", server.url()),
            "download_url": format!("{}/raw/main.py", server.url()),
        },
        {
            "path": "notes.txt",
            "type": "file",
            "url": format!("{}/repos/owner/repo/contents/notes.txt", server.url()),
            "download_url": format!("{}/raw/notes.txt", server.url()),
        }
    ]);

    vec![
        server
            .mock("GET", "/repos/owner/repo/contents")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(listing.to_string())
            .create_async()
            .await,
        server
            .mock("GET", "/raw/main.py")
            .with_body("print(1)")
            .create_async()
            .await,
        server
            .mock("GET", "/raw/notes.txt")
            .with_body("todo")
            .create_async()
            .await,
    ]
}

#[actix_web::test]
async fn test_fetch_repo_returns_envelope() {
    let mut server = Server::new_async().await;
    let _mocks = mock_small_repo(&mut server).await;
    let app = test::init_service(
        App::new()
            .app_data(pipeline(&server))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/fetchRepo")
        .set_json(json!({
            "repoUrl": "https://github.com/owner/repo",
            "filterMode": "whitelist",
            "filterExtensions": "py"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["directoryStructure"], "└── main.py");
    assert_eq!(
        body["repoContents"],
        "====== File: main.py ======\nprint(1)\n\n"
    );
    assert_eq!(body["tokenEstimates"]["directoryTokens"], 11);
    assert_eq!(body["tokenEstimates"]["contentTokens"], 38);
}

#[actix_web::test]
async fn test_filter_fields_are_optional() {
    let mut server = Server::new_async().await;
    let _mocks = mock_small_repo(&mut server).await;
    let app = test::init_service(
        App::new()
            .app_data(pipeline(&server))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/fetchRepo")
        .set_json(json!({ "repoUrl": "https://github.com/owner/repo" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["directoryStructure"], "├── main.py\n└── notes.txt");
}

#[actix_web::test]
async fn test_missing_repo_url_is_bad_request() {
    let server = Server::new_async().await;
    let app = test::init_service(
        App::new()
            .app_data(pipeline(&server))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/fetchRepo")
        .set_json(json!({ "filterMode": "whitelist" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Repository URL is required.");
}

#[actix_web::test]
async fn test_unknown_filter_mode_is_bad_request() {
    let mut server = Server::new_async().await;
    let listing = server
        .mock("GET", "/repos/owner/repo/contents")
        .expect(0)
        .create_async()
        .await;
    let app = test::init_service(
        App::new()
            .app_data(pipeline(&server))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/fetchRepo")
        .set_json(json!({
            "repoUrl": "https://github.com/owner/repo",
            "filterMode": "greylist",
            "filterExtensions": "py"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("greylist"));
    listing.assert_async().await;
}

#[actix_web::test]
async fn test_malformed_body_is_bad_request() {
    let server = Server::new_async().await;
    let app = test::init_service(
        App::new()
            .app_data(pipeline(&server))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/fetchRepo")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[actix_web::test]
async fn test_no_matching_files_is_not_found() {
    let mut server = Server::new_async().await;
    let _mocks = mock_small_repo(&mut server).await;
    let app = test::init_service(
        App::new()
            .app_data(pipeline(&server))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/fetchRepo")
        .set_json(json!({
            "repoUrl": "https://github.com/owner/repo",
            "filterExtensions": "rs,toml"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["detail"],
        "No files found or unable to fetch repository contents."
    );
}

#[actix_web::test]
async fn test_upstream_failure_is_bad_gateway() {
    let mut server = Server::new_async().await;
    let _listing = server
        .mock("GET", "/repos/owner/repo/contents")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;
    let app = test::init_service(
        App::new()
            .app_data(pipeline(&server))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/fetchRepo")
        .set_json(json!({ "repoUrl": "https://github.com/owner/repo" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn test_get_is_method_not_allowed() {
    let server = Server::new_async().await;
    let app = test::init_service(
        App::new()
            .app_data(pipeline(&server))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::get().uri("/fetchRepo").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[actix_web::test]
async fn test_health_and_cors() {
    let server = Server::new_async().await;
    let app = test::init_service(
        App::new()
            .app_data(pipeline(&server))
            .wrap(Cors::permissive())
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("origin", "http://localhost:3000"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );

    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), b"OK");
}
