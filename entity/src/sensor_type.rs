use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// The closed set of sensor kinds the platform accepts.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, EnumIter, Deserialize, Serialize, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "sensor_type")]
pub enum SensorType {
    /// Contact closure: reports open/closed.
    #[serde(rename = "cc")]
    #[sea_orm(string_value = "cc")]
    ContactClosure,
    /// Analog to digital converter: reports a sampled level.
    #[serde(rename = "adc")]
    #[sea_orm(string_value = "adc")]
    Adc,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SensorTypeParseError(pub String);

impl std::fmt::Display for SensorTypeParseError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "unknown sensor type '{}', expected 'cc' or 'adc'", self.0)
    }
}

impl std::error::Error for SensorTypeParseError {}

impl FromStr for SensorType {
    type Err = SensorTypeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cc" => Ok(SensorType::ContactClosure),
            "adc" => Ok(SensorType::Adc),
            other => Err(SensorTypeParseError(other.to_owned())),
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorType::ContactClosure => write!(fmt, "cc"),
            SensorType::Adc => write!(fmt, "adc"),
        }
    }
}
