use crate::controller::ApiResponse;
use crate::params::{self, event::CreateParams};
use crate::{AppState, Error};
use axum::extract::{rejection::JsonRejection, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::events;

use log::*;

/// POST a new Event reported by a Sensor
#[utoipa::path(
    post,
    path = "/events",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully recorded an Event", body = events::Model),
        (status = 404, description = "No Sensor with the given serial number"),
        (status = 406, description = "Accept header is not application/json"),
        (status = 415, description = "Content-Type is not application/json"),
        (status = 422, description = "Malformed request body"),
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateParams>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let params = params::json_body(payload)?;
    debug!("POST Event from: {params:?}");

    let ctx = app_state.request_context();
    let event = app_state
        .services
        .events
        .receive(&ctx, &params.sensor_serial_number, params.payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), event)),
    ))
}
