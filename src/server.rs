//! HTTP surface over the scrape service.

use crate::Scraper;
use crate::service::{self, HealthResponse, ScrapeRequest, ServiceError};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Create the router with the scrape and health endpoints
pub fn create_router(scraper: Scraper) -> Router {
    Router::new()
        .route("/api/scrape", post(scrape))
        .route("/api/healthz", get(health))
        .layer(CorsLayer::permissive())
        .with_state(scraper)
}

async fn scrape(
    State(scraper): State<Scraper>,
    Json(request): Json<ScrapeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    ::log::info!("Scrape requested for {}", request.url);
    let response = service::handle_scrape(&scraper, request).await?;
    Ok(Json(response))
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse::current())
}

/// Start the server and run until it fails
pub async fn serve(scraper: Scraper, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(scraper);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    ::log::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
