use super::error::Error;
use super::record_not_found;
use entity::events::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, DatabaseConnection, PaginatorTrait, QueryOrder,
    TryIntoModel,
};

use log::*;

pub async fn create(db: &DatabaseConnection, event_model: Model) -> Result<Model, Error> {
    debug!("New Event Model to be inserted: {:?}", event_model);

    let event_active_model: ActiveModel = ActiveModel {
        timestamp: Set(event_model.timestamp),
        sensor_serial_number: Set(event_model.sensor_serial_number),
        sensor_id: Set(event_model.sensor_id),
        payload: Set(event_model.payload),
        ..Default::default()
    };

    Ok(event_active_model.save(db).await?.try_into_model()?)
}

/// The most recent event of a sensor. Equal timestamps resolve to the event
/// inserted last.
pub async fn find_latest_by_sensor_id(db: &DatabaseConnection, sensor_id: Id) -> Result<Model, Error> {
    Entity::find()
        .filter(Column::SensorId.eq(sensor_id))
        .order_by_desc(Column::Timestamp)
        .order_by_desc(Column::Id)
        .one(db)
        .await?
        .ok_or_else(record_not_found)
}

/// Events of a sensor with `start <= timestamp <= end`, oldest first.
pub async fn find_by_sensor_id_in_range(
    db: &DatabaseConnection,
    sensor_id: Id,
    start: DateTimeWithTimeZone,
    end: DateTimeWithTimeZone,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::SensorId.eq(sensor_id))
        .filter(Column::Timestamp.between(start, end))
        .order_by_asc(Column::Timestamp)
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}

/// Whether the sensor has reported at least one event.
pub async fn exists_for_sensor(db: &DatabaseConnection, sensor_id: Id) -> Result<bool, Error> {
    let count = Entity::find()
        .filter(Column::SensorId.eq(sensor_id))
        .count(db)
        .await?;

    Ok(count > 0)
}
