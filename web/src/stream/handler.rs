use crate::params;
use crate::{AppState, Error};
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use domain::Id;
use futures_util::StreamExt;
use live::error::Error as LiveError;
use std::sync::Arc;

use log::*;

/// GET a live stream of a Sensor's latest Event
///
/// Upgrades to a WebSocket that receives the sensor's most recent event as a
/// JSON text frame on every push interval.
#[utoipa::path(
    get,
    path = "/sensors/{id}/events",
    params(
        ("id" = i64, Path, description = "Sensor id to stream")
    ),
    responses(
        (status = 101, description = "Switched to the WebSocket protocol"),
        (status = 404, description = "Sensor not found"),
        (status = 409, description = "Sensor already has an active stream"),
        (status = 422, description = "Malformed sensor id"),
        (status = 500, description = "WebSocket upgrade failed"),
    )
)]
pub(crate) async fn event_stream(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, Error> {
    let sensor_id = params::parse_id(&id)?;

    let ctx = app_state.request_context();
    app_state.services.sensors.find_by_id(&ctx, sensor_id).await?;

    let upgrade = upgrade.map_err(LiveError::upgrade_failed)?;

    if app_state.live.is_active(sensor_id) {
        debug!("Sensor {sensor_id} is already streaming");
        return Err(LiveError::conflict().into());
    }

    let manager = Arc::clone(&app_state.live);
    Ok(upgrade
        .on_failed_upgrade(move |err| warn!("WebSocket upgrade for sensor {sensor_id} failed: {err}"))
        .on_upgrade(move |socket| serve(manager, sensor_id, socket)))
}

async fn serve(manager: Arc<live::Manager>, sensor_id: Id, socket: WebSocket) {
    info!("Live stream opened for sensor {sensor_id}");

    let (writer, reader) = socket.split();
    match manager.run(sensor_id, writer, reader).await {
        Ok(ending) => info!("Live stream for sensor {sensor_id} ended: {ending:?}"),
        Err(err) => warn!("Live stream for sensor {sensor_id} refused: {err}"),
    }
}
