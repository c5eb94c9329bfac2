use crate::controller::ApiResponse;
use crate::params::{self, sensor::CreateParams, sensor::HistoryParams};
use crate::{AppState, Error};
use axum::extract::{rejection::JsonRejection, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{events, sensors};

use log::*;

/// POST register a new Sensor
///
/// Registering a serial number that is already known returns the stored
/// sensor unchanged.
#[utoipa::path(
    post,
    path = "/sensors",
    request_body = CreateParams,
    responses(
        (status = 200, description = "Successfully registered a Sensor", body = sensors::Model),
        (status = 406, description = "Accept header is not application/json"),
        (status = 415, description = "Content-Type is not application/json"),
        (status = 422, description = "Invalid serial number or sensor type"),
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateParams>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let params = params::json_body(payload)?;
    debug!("POST Register Sensor from: {params:?}");

    let ctx = app_state.request_context();
    let sensor = app_state.services.sensors.register(&ctx, params.into()).await?;

    debug!("Registered Sensor: {sensor:?}");

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), sensor)))
}

/// GET all Sensors
#[utoipa::path(
    get,
    path = "/sensors",
    responses(
        (status = 200, description = "Successfully retrieved all Sensors", body = [sensors::Model]),
        (status = 406, description = "Accept header is not application/json"),
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    debug!("GET all Sensors");

    let ctx = app_state.request_context();
    let sensors = app_state.services.sensors.list(&ctx).await?;

    debug!("Found {} Sensors", sensors.len());

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), sensors)))
}

/// GET a particular Sensor specified by its id.
#[utoipa::path(
    get,
    path = "/sensors/{id}",
    params(
        ("id" = i64, Path, description = "Sensor id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved a Sensor", body = sensors::Model),
        (status = 404, description = "Sensor not found"),
        (status = 406, description = "Accept header is not application/json"),
        (status = 422, description = "Malformed sensor id"),
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let id = params::parse_id(&id)?;
    debug!("GET Sensor by id: {id}");

    let ctx = app_state.request_context();
    let sensor = app_state.services.sensors.find_by_id(&ctx, id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), sensor)))
}

/// GET the recorded Events of a Sensor within an inclusive time window.
#[utoipa::path(
    get,
    path = "/sensors/{id}/history",
    params(
        ("id" = i64, Path, description = "Sensor id whose history to retrieve"),
        HistoryParams,
    ),
    responses(
        (status = 200, description = "Successfully retrieved the Sensor's history", body = [events::Model]),
        (status = 404, description = "Sensor not found"),
        (status = 406, description = "Accept header is not application/json"),
        (status = 422, description = "Malformed sensor id or date bounds"),
    )
)]
pub async fn history(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, Error> {
    let id = params::parse_id(&id)?;
    debug!("GET history of Sensor {id} with: {params:?}");

    let (start, end) = params.range()?;
    let ctx = app_state.request_context();
    let events = app_state
        .services
        .events
        .history(&ctx, id, start, end)
        .await?;

    debug!("Found {} Events for Sensor {id}", events.len());

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), events)))
}
