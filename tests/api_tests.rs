//! API integration tests against an in-memory database

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use livraria_server::{
    api,
    config::{AppConfig, DatabaseConfig},
    models::user::AccountClaims,
    repository::Repository,
    services::Services,
    AppState,
};

const JWT_SECRET: &str = "integration-secret";

async fn test_app() -> Router {
    app_with_database(DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..DatabaseConfig::default()
    })
    .await
}

/// App on a database file with the default pool size
async fn file_app(dir: &tempfile::TempDir) -> Router {
    app_with_database(DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("livros.db").display()),
        ..DatabaseConfig::default()
    })
    .await
}

async fn app_with_database(database: DatabaseConfig) -> Router {
    let mut config = AppConfig::default();
    config.database = database;
    config.auth.jwt_secret = JWT_SECRET.to_string();

    let repository = Repository::connect(&config.database).await.unwrap();
    repository.init_schema().await.unwrap();

    let services = Services::new(repository, config.auth.clone());
    api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Register an account, log in and return the bearer token
async fn get_auth_token(app: &Router) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/register",
        None,
        Some(json!({"username": "ana", "email": "ana@example.com", "senha": "segredo"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({"email": "ana@example.com", "senha": "segredo"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_and_token_gate() {
    let app = test_app().await;
    let token = get_auth_token(&app).await;

    let (status, _) = send(&app, Method::GET, "/livros", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/livros", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");

    let (status, _) = send(&app, Method::GET, "/livros", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = test_app().await;
    get_auth_token(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({"email": "ana@example.com", "senha": "errada"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = test_app().await;
    get_auth_token(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({"username": "outra", "email": "ana@example.com", "senha": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Duplicate");
}

#[tokio::test]
async fn test_create_book() {
    let app = test_app().await;
    let token = get_auth_token(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/livros",
        Some(&token),
        Some(json!({"titulo": "Dune", "autor": "Frank Herbert", "ano": 1965})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({"id": 1, "titulo": "Dune", "autor": "Frank Herbert", "categorias": [], "ano": 1965})
    );

    let (status, fetched) = send(&app, Method::GET, "/livros/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn test_author_created_once() {
    let app = test_app().await;
    let token = get_auth_token(&app).await;

    for titulo in ["Dune", "Dune Messiah"] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/livros",
            Some(&token),
            Some(json!({"titulo": titulo, "autor": "Frank Herbert", "categorias": ["Ficção"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, authors) = send(&app, Method::GET, "/autores", Some(&token), None).await;
    let authors = authors.as_array().unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0]["nome"], "Frank Herbert");
    assert_eq!(authors[0]["quantidade_livros"], 2);

    let (_, categories) = send(&app, Method::GET, "/categorias", Some(&token), None).await;
    assert_eq!(categories.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_author_removes_books() {
    let app = test_app().await;
    let token = get_auth_token(&app).await;

    let (_, book) = send(
        &app,
        Method::POST,
        "/livros",
        Some(&token),
        Some(json!({"titulo": "Dune", "autor": "Frank Herbert"})),
    )
    .await;
    let (_, authors) = send(&app, Method::GET, "/autores", Some(&token), None).await;
    let author_id = authors[0]["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::DELETE, &format!("/autores/{}", author_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["mensagem"].is_string());

    let (status, _) = send(&app, Method::GET, &format!("/livros/{}", book["id"]), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_title_only() {
    let app = test_app().await;
    let token = get_auth_token(&app).await;

    send(
        &app,
        Method::POST,
        "/livros",
        Some(&token),
        Some(json!({"titulo": "Dune", "autor": "Frank Herbert", "ano": 1965, "categorias": ["Ficção", "Clássico"]})),
    )
    .await;

    let (status, body) = send(&app, Method::PUT, "/livros/1", Some(&token), Some(json!({"titulo": "Duna"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"id": 1, "titulo": "Duna", "autor": "Frank Herbert", "categorias": ["Ficção", "Clássico"], "ano": 1965})
    );
}

#[tokio::test]
async fn test_create_author_empty_name() {
    let app = test_app().await;
    let token = get_auth_token(&app).await;

    let (status, body) = send(&app, Method::POST, "/autores", Some(&token), Some(json!({"nome": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("nome"));

    let (_, authors) = send(&app, Method::GET, "/autores", Some(&token), None).await;
    assert!(authors.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json() {
    let app = test_app().await;
    let token = get_auth_token(&app).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/livros")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"titulo\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_resources() {
    let app = test_app().await;
    let token = get_auth_token(&app).await;

    for uri in ["/livros/42", "/autores/42", "/categorias/42"] {
        let (status, body) = send(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"], "NoSuchData");
    }
}

#[tokio::test]
async fn test_non_numeric_id() {
    let app = test_app().await;
    let token = get_auth_token(&app).await;

    for uri in ["/livros/abc", "/autores/abc", "/categorias/abc"] {
        let (status, body) = send(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "BadValue");
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn test_token_signed_with_other_secret() {
    let app = test_app().await;
    get_auth_token(&app).await;

    let now = chrono::Utc::now().timestamp();
    let claims = AccountClaims {
        sub: "1".into(),
        user_id: 1,
        email: "ana@example.com".into(),
        exp: now + 3600,
        iat: now,
    };

    let forged = claims.create_token("some-other-secret").unwrap();
    let (status, _) = send(&app, Method::GET, "/livros", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let genuine = claims.create_token(JWT_SECRET).unwrap();
    let (status, _) = send(&app, Method::GET, "/livros", Some(&genuine), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_book_creation() {
    let dir = tempfile::tempdir().unwrap();
    let app = file_app(&dir).await;
    let token = get_auth_token(&app).await;

    let handles: Vec<_> = (0..30)
        .map(|i| {
            let app = app.clone();
            let token = token.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    Method::POST,
                    "/livros",
                    Some(&token),
                    Some(json!({"titulo": format!("Dune {}", i), "autor": "Frank Herbert", "categorias": ["Ficção"]})),
                )
                .await
            })
        })
        .collect();

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (_, books) = send(&app, Method::GET, "/livros", Some(&token), None).await;
    assert_eq!(books.as_array().unwrap().len(), 30);

    let (_, authors) = send(&app, Method::GET, "/autores", Some(&token), None).await;
    assert_eq!(authors.as_array().unwrap().len(), 1);
    assert_eq!(authors[0]["quantidade_livros"], 30);
}
