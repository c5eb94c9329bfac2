use crate::controller::ApiResponse;
use crate::params::{self, user::SensorBindingParams};
use crate::{AppState, Error};
use axum::extract::{rejection::JsonRejection, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{sensors, sensors_users};

use log::*;

/// GET all Sensors owned by a User
#[utoipa::path(
    get,
    path = "/users/{user_id}/sensors",
    params(
        ("user_id" = i64, Path, description = "User id whose Sensors to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the User's Sensors", body = [sensors::Model]),
        (status = 404, description = "User not found"),
        (status = 406, description = "Accept header is not application/json"),
        (status = 422, description = "Malformed user id"),
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let user_id = params::parse_id(&user_id)?;
    debug!("GET Sensors of User {user_id}");

    let ctx = app_state.request_context();
    let sensors = app_state.services.users.sensors_of(&ctx, user_id).await?;

    debug!("Found {} Sensors for User {user_id}", sensors.len());

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), sensors)))
}

/// POST attach an existing Sensor to a User
#[utoipa::path(
    post,
    path = "/users/{user_id}/sensors",
    params(
        ("user_id" = i64, Path, description = "User id that claims the Sensor")
    ),
    request_body = SensorBindingParams,
    responses(
        (status = 201, description = "Successfully attached the Sensor", body = sensors_users::Model),
        (status = 404, description = "User or Sensor not found"),
        (status = 415, description = "Content-Type is not application/json"),
        (status = 422, description = "Malformed user id or sensor id"),
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<SensorBindingParams>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let user_id = params::parse_id(&user_id)?;
    let binding = params::json_body(payload)?.validated()?;
    debug!("POST attach Sensor {} to User {user_id}", binding.sensor_id);

    let ctx = app_state.request_context();
    let link = app_state
        .services
        .users
        .attach_sensor(&ctx, user_id, binding.sensor_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), link)),
    ))
}
