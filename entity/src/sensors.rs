use crate::sensor_type::SensorType;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, ToSchema, Serialize, Deserialize)]
#[schema(as = domain::sensors::Model)] // OpenAPI schema
#[sea_orm(schema_name = "sensor_platform", table_name = "sensors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Id,
    #[sea_orm(unique)]
    pub serial_number: String,
    #[serde(rename = "type")]
    #[sea_orm(column_name = "type")]
    pub sensor_type: SensorType,
    /// Payload of the most recently accepted event.
    pub current_state: i64,
    pub description: String,
    pub is_active: bool,
    #[schema(value_type = String, format = DateTime)] // Applies to OpenAPI schema
    pub registered_at: DateTimeWithTimeZone,
    /// Unset until the sensor reports its first event.
    #[schema(value_type = Option<String>, format = DateTime)] // Applies to OpenAPI schema
    pub last_activity: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::events::Entity")]
    Events,
    #[sea_orm(has_many = "super::sensors_users::Entity")]
    SensorsUsers,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl Related<super::sensors_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SensorsUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
