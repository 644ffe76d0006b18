use crate::auth::{token_from_header, Viewer};
use crate::error::BudgetError;
use crate::graphql::{create_schema, GraphQLSchema};
use crate::service::BudgetService;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::Query,
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub schema: GraphQLSchema,
    pub service: BudgetService,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "check_balance",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Resolve the `Authorization` header to a viewer. Missing, malformed or
/// rejected tokens leave the request anonymous.
async fn viewer_from_headers(service: &BudgetService, headers: &HeaderMap) -> Option<Viewer> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = token_from_header(value)?;
    match service.authenticate(token).await {
        Ok(viewer) => Some(viewer),
        Err(e) => {
            warn!("Rejected bearer token: {}", e);
            None
        }
    }
}

async fn graphql_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();
    if let Some(viewer) = viewer_from_headers(&state.service, &headers).await {
        request = request.data(viewer);
    }
    state.schema.execute(request).await.into()
}

/// GraphiQL UI
async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

fn error_response(err: BudgetError) -> Response {
    let status = match &err {
        BudgetError::Unauthorized | BudgetError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        BudgetError::NotFound(_) => StatusCode::NOT_FOUND,
        BudgetError::Forbidden(_) => StatusCode::FORBIDDEN,
        BudgetError::Validation(_) | BudgetError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Json(serde_json::json!({
        "detail": err.to_string(),
        "code": err.code(),
    }));
    (status, body).into_response()
}

#[derive(Debug, Deserialize)]
struct SummaryParams {
    month: Option<i64>,
}

/// Income, expense and savings totals as plain JSON
async fn summary(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Query(params): Query<SummaryParams>,
) -> Response {
    let Some(viewer) = viewer_from_headers(&state.service, &headers).await else {
        return error_response(BudgetError::Unauthorized);
    };
    match state.service.summary(viewer, params.month).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response(e),
    }
}

/// Create the HTTP router with all routes, including GraphQL
pub fn create_server(service: BudgetService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let state = AppState {
        schema: create_schema(service.clone()),
        service,
    };

    Router::new()
        .route("/health", get(health))
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/graphiql", get(graphiql))
        .route("/api/summary", get(summary))
        .layer(Extension(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Start the HTTP server on the given address
pub async fn start_server(service: BudgetService, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_server(service);

    info!("HTTP server running on http://{addr}");
    info!("GraphQL:     http://{addr}/graphql");
    info!("GraphiQL UI: http://{addr}/graphiql");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
