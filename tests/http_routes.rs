use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use check_balance::auth::TokenIssuer;
use check_balance::server::create_server;
use check_balance::service::BudgetService;
use check_balance::storage::InMemoryStorage;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn service() -> BudgetService {
    BudgetService::new(
        Arc::new(InMemoryStorage::new()),
        TokenIssuer::new("http-secret", Duration::days(30)),
        4,
    )
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Ok((status, body))
}

fn graphql(query: &str, authorization: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    Ok(builder.body(Body::from(json!({ "query": query }).to_string()))?)
}

#[tokio::test]
async fn health_reports_service_and_version() -> Result<()> {
    let app = create_server(service());
    let (status, body) = send(&app, Request::get("/health").body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["service"], json!("check_balance"));
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[tokio::test]
async fn graphiql_is_served_on_get() -> Result<()> {
    let app = create_server(service());
    let response = app
        .clone()
        .oneshot(Request::get("/graphiql").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    assert!(String::from_utf8_lossy(&bytes).contains("graphiql"));
    Ok(())
}

#[tokio::test]
async fn authorization_header_identifies_the_viewer() -> Result<()> {
    let app = create_server(service());

    let (_, body) = send(
        &app,
        graphql(
            r#"mutation { register(username: "test1", email: "test1@test.com", password: "testpassword") { token } }"#,
            None,
        )?,
    )
    .await?;
    let token = body["data"]["register"]["token"].as_str().unwrap_or_default().to_string();
    assert!(!token.is_empty());

    for prefix in ["Bearer", "JWT"] {
        let auth = format!("{prefix} {token}");
        let (status, body) = send(&app, graphql("{ me { username } }", Some(&auth))?).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["me"]["username"], json!("test1"));
    }

    // A bad token degrades to an anonymous request.
    let (_, body) = send(&app, graphql("{ me { username } }", Some("Bearer nonsense"))?).await?;
    assert_eq!(body["errors"][0]["extensions"]["code"], json!("UNAUTHORIZED"));
    Ok(())
}

#[tokio::test]
async fn summary_endpoint_requires_a_token() -> Result<()> {
    let service = service();
    let payload = service.register("test1", "test1@test.com", "testpassword").await?;
    let app = create_server(service);

    let (status, body) = send(&app, Request::get("/api/summary").body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("UNAUTHORIZED"));

    send(
        &app,
        graphql(
            r#"mutation { createTransaction(amount: 900, group: Income) { id } }"#,
            Some(&format!("Bearer {}", payload.token)),
        )?,
    )
    .await?;

    let request = Request::get("/api/summary")
        .header(header::AUTHORIZATION, format!("Bearer {}", payload.token))
        .body(Body::empty())?;
    let (status, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "total_income": 900, "total_expenses": 0, "total_savings": 0, "balance": 900 })
    );

    let request = Request::get("/api/summary?month=42")
        .header(header::AUTHORIZATION, format!("Bearer {}", payload.token))
        .body(Body::empty())?;
    let (status, _) = send(&app, request).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
