use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use domain::error::Error as DomainError;
use domain::sensor::NewSensor;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Format of the `start_date` and `end_date` history bounds, read as UTC.
pub(crate) const HISTORY_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CreateParams {
    /// Exactly 10 characters.
    pub(crate) serial_number: String,
    /// `cc` (contact closure) or `adc` (analog-to-digital converter).
    #[serde(rename = "type")]
    pub(crate) sensor_type: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) is_active: bool,
}

impl From<CreateParams> for NewSensor {
    fn from(params: CreateParams) -> Self {
        NewSensor {
            serial_number: params.serial_number,
            sensor_type: params.sensor_type,
            description: params.description,
            is_active: params.is_active,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct HistoryParams {
    /// Inclusive lower bound, `YYYY-MM-DDTHH:MM:SS` in UTC.
    pub(crate) start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DDTHH:MM:SS` in UTC.
    pub(crate) end_date: Option<String>,
}

impl HistoryParams {
    pub(crate) fn range(
        &self,
    ) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), DomainError> {
        match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) => Ok((
                parse_date("start_date", start)?,
                parse_date("end_date", end)?,
            )),
            _ => Err(DomainError::invalid("start_date and end_date are required")),
        }
    }
}

fn parse_date(name: &str, raw: &str) -> Result<DateTime<FixedOffset>, DomainError> {
    NaiveDateTime::parse_from_str(raw, HISTORY_DATE_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
        .map_err(|_| {
            DomainError::invalid(format!("{name} must be formatted as YYYY-MM-DDTHH:MM:SS"))
        })
}
