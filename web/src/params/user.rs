use domain::error::Error as DomainError;
use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CreateParams {
    pub(crate) name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct SensorBindingParams {
    pub(crate) sensor_id: Id,
}

impl SensorBindingParams {
    pub(crate) fn validated(self) -> Result<Self, DomainError> {
        if self.sensor_id <= 0 {
            return Err(DomainError::invalid("sensor_id must be greater than zero"));
        }
        Ok(self)
    }
}
