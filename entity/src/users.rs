use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, ToSchema, Serialize, Deserialize)]
#[schema(as = domain::users::Model)] // OpenAPI schema
#[sea_orm(schema_name = "sensor_platform", table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Id,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sensors_users::Entity")]
    SensorsUsers,
}

impl Related<super::sensors_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SensorsUsers.def()
    }
}

impl Related<super::sensors::Entity> for Entity {
    fn to() -> RelationDef {
        super::sensors_users::Relation::Sensors.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::sensors_users::Relation::Users.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
