use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CreateParams {
    /// Serial number of the reporting sensor.
    pub(crate) sensor_serial_number: String,
    pub(crate) payload: i64,
}
