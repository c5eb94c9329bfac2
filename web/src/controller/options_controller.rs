//! Answers `OPTIONS` on every resource with the methods it supports.
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;

fn allow(methods: &'static str) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::ALLOW, HeaderValue::from_static(methods))],
    )
}

pub async fn events() -> impl IntoResponse {
    allow("POST,OPTIONS")
}

pub async fn sensors() -> impl IntoResponse {
    allow("GET,POST,OPTIONS,HEAD")
}

pub async fn sensor() -> impl IntoResponse {
    allow("GET,OPTIONS,HEAD")
}

pub async fn users() -> impl IntoResponse {
    allow("POST,OPTIONS")
}

pub async fn user_sensors() -> impl IntoResponse {
    allow("POST,GET,OPTIONS,HEAD")
}
