use super::error::Error;
use entity::sensors_users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, DatabaseConnection, QueryOrder, TryIntoModel,
};

use log::*;

/// Links `sensor_id` to `user_id`. Linking a pair that is already linked
/// returns the existing link instead of inserting a duplicate.
pub async fn create(db: &DatabaseConnection, user_id: Id, sensor_id: Id) -> Result<Model, Error> {
    let existing = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::SensorId.eq(sensor_id))
        .one(db)
        .await?;

    if let Some(link) = existing {
        debug!("Sensor {sensor_id} is already owned by user {user_id}");
        return Ok(link);
    }

    let active_model: ActiveModel = ActiveModel {
        user_id: Set(user_id),
        sensor_id: Set(sensor_id),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

pub async fn find_by_user_id(db: &DatabaseConnection, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}
