use std::path::Path;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::customers::CustomerRequest;
use super::ServiceError;
use crate::models::customers::{NewCustomer, NewReferral};

#[derive(Clone)]
pub struct AppState {
    pub customer_channel: mpsc::Sender<CustomerRequest>,
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<NewCustomer>,
) -> impl IntoResponse {
    let (signup_tx, signup_rx) = oneshot::channel();

    let send_result = state
        .customer_channel
        .send(CustomerRequest::Signup {
            new_customer: req,
            response: signup_tx,
        })
        .await;

    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Failed to process request: {}", e)})),
        );
    }

    match signup_rx.await {
        Ok(Ok(confirmation)) => (StatusCode::OK, Json(json!(confirmation))),
        Ok(Err(ServiceError::InvalidRequest(message))) => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
        }
        Ok(Err(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error"})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Failed to receive response: {}", e)})),
        ),
    }
}

async fn top10(State(state): State<AppState>) -> impl IntoResponse {
    let (top_tx, top_rx) = oneshot::channel();

    let send_result = state
        .customer_channel
        .send(CustomerRequest::TopReferrers { response: top_tx })
        .await;

    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Failed to process request: {}", e)})),
        );
    }

    match top_rx.await {
        Ok(Ok(top)) => (StatusCode::OK, Json(json!(top))),
        Ok(Err(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error"})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Failed to receive response: {}", e)})),
        ),
    }
}

async fn referral(
    State(state): State<AppState>,
    Json(req): Json<NewReferral>,
) -> impl IntoResponse {
    let (referral_tx, referral_rx) = oneshot::channel();

    let send_result = state
        .customer_channel
        .send(CustomerRequest::RecordReferral {
            referral: req,
            response: referral_tx,
        })
        .await;

    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Failed to process request: {}", e)})),
        );
    }

    match referral_rx.await {
        Ok(Ok(position)) => (StatusCode::OK, Json(json!({"referrerPosition": position}))),
        Ok(Err(ServiceError::InvalidRequest(message))) => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
        }
        Ok(Err(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error"})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Failed to receive response: {}", e)})),
        ),
    }
}

async fn rank_data(State(state): State<AppState>) -> impl IntoResponse {
    let (rank_tx, rank_rx) = oneshot::channel();

    let send_result = state
        .customer_channel
        .send(CustomerRequest::RankData { response: rank_tx })
        .await;

    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Failed to process request: {}", e)})),
        );
    }

    match rank_rx.await {
        Ok(Ok(entries)) => (StatusCode::OK, Json(json!(entries))),
        Ok(Err(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error"})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Failed to receive response: {}", e)})),
        ),
    }
}

pub fn app(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/top10", get(top10))
        .route("/referral", post(referral))
        .route("/rank-data", get(rank_data))
        .route("/health", get(|| async { "OK" }))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service("/rank", ServeFile::new(static_dir.join("rank.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(
    listen: &str,
    static_dir: &str,
    customer_channel: mpsc::Sender<CustomerRequest>,
) -> Result<(), anyhow::Error> {
    let app_state = AppState { customer_channel };
    let app = app(app_state, Path::new(static_dir));

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
