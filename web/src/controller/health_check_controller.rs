use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET liveness probe
#[utoipa::path(
    get,
    path = "/ping",
    responses(
        (status = 200, description = "API router is up and responding to requests", body = String),
    )
)]
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}
