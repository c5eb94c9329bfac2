use axum::{
    extract::Request,
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Requires `Accept: application/json` on GET and HEAD (406 otherwise) and
/// `Content-Type: application/json` on POST (415 otherwise).
///
/// WebSocket upgrade requests and every other method pass through untouched.
pub async fn require_json(request: Request, next: Next) -> Response {
    let headers = request.headers();

    if is_websocket_upgrade(headers) {
        return next.run(request).await;
    }

    match *request.method() {
        Method::GET | Method::HEAD if !accepts_json(headers) => reject(
            StatusCode::NOT_ACCEPTABLE,
            "Accept must be 'application/json'",
        ),
        Method::POST if !has_json_content_type(headers) => reject(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Content-Type must be 'application/json'",
        ),
        _ => next.run(request).await,
    }
}

fn reject(status: StatusCode, reason: &str) -> Response {
    (status, Json(json!({ "reason": reason }))).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let connection_upgrade = header_str(headers, header::CONNECTION).is_some_and(|connection| {
        connection
            .split(',')
            .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
    });
    let upgrade_websocket = header_str(headers, header::UPGRADE)
        .is_some_and(|upgrade| upgrade.trim().eq_ignore_ascii_case("websocket"));

    connection_upgrade && upgrade_websocket
}

fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or_default().trim()
}

fn accepts_json(headers: &HeaderMap) -> bool {
    header_str(headers, header::ACCEPT).is_some_and(|accept| {
        accept
            .split(',')
            .any(|range| media_type(range).eq_ignore_ascii_case(JSON_MEDIA_TYPE))
    })
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    header_str(headers, header::CONTENT_TYPE)
        .is_some_and(|content_type| media_type(content_type).eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}
