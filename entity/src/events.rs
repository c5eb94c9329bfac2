use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single reading reported by a sensor. The wire form of this model is also
/// the frame pushed to live stream subscribers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, ToSchema, Serialize, Deserialize)]
#[schema(as = domain::events::Model)] // OpenAPI schema
#[sea_orm(schema_name = "sensor_platform", table_name = "events")]
pub struct Model {
    #[serde(skip)]
    #[sea_orm(primary_key)]
    pub id: Id,
    /// Assigned by the server at ingestion.
    #[schema(value_type = String, format = DateTime)] // Applies to OpenAPI schema
    pub timestamp: DateTimeWithTimeZone,
    pub sensor_serial_number: String,
    pub sensor_id: Id,
    pub payload: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sensors::Entity",
        from = "Column::SensorId",
        to = "super::sensors::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Sensors,
}

impl Related<super::sensors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sensors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
