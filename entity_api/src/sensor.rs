use super::error::Error;
use super::record_not_found;
use entity::sensors::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*,
    sea_query::Expr,
    ActiveValue::{Set, Unchanged},
    Condition, DatabaseConnection, QueryOrder, TryIntoModel,
};

use log::*;

/// Inserts a new sensor. The id is assigned by the database and the
/// registration time by this function; both values in `sensor_model` are ignored.
pub async fn create(db: &DatabaseConnection, sensor_model: Model) -> Result<Model, Error> {
    debug!("New Sensor Model to be inserted: {:?}", sensor_model);

    let sensor_active_model: ActiveModel = ActiveModel {
        serial_number: Set(sensor_model.serial_number),
        sensor_type: Set(sensor_model.sensor_type),
        current_state: Set(sensor_model.current_state),
        description: Set(sensor_model.description),
        is_active: Set(sensor_model.is_active),
        registered_at: Set(chrono::Utc::now().into()),
        last_activity: Set(sensor_model.last_activity),
        ..Default::default()
    };

    Ok(sensor_active_model.save(db).await?.try_into_model()?)
}

/// Updates the mutable state of an existing sensor. Identity, serial number,
/// type and registration time never change.
pub async fn update(db: &DatabaseConnection, id: Id, model: Model) -> Result<Model, Error> {
    let sensor = find_by_id(db, id).await?;

    debug!("Existing Sensor model to be Updated: {:?}", sensor);

    let active_model: ActiveModel = ActiveModel {
        id: Unchanged(sensor.id),
        serial_number: Unchanged(sensor.serial_number),
        sensor_type: Unchanged(sensor.sensor_type),
        current_state: Set(model.current_state),
        description: Set(model.description),
        is_active: Set(model.is_active),
        registered_at: Unchanged(sensor.registered_at),
        last_activity: Set(model.last_activity),
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

/// Sets the sensor's current state from an event taken at `at`, unless the
/// sensor already reflects a later event. The guard is part of the UPDATE so
/// that concurrent writers cannot move the sensor backwards.
///
/// Returns whether the row changed.
pub async fn record_activity(
    db: &DatabaseConnection,
    id: Id,
    current_state: i64,
    at: DateTimeWithTimeZone,
) -> Result<bool, Error> {
    let result = Entity::update_many()
        .col_expr(Column::CurrentState, Expr::value(current_state))
        .col_expr(Column::LastActivity, Expr::value(at))
        .filter(Column::Id.eq(id))
        .filter(
            Condition::any()
                .add(Column::LastActivity.is_null())
                .add(Column::LastActivity.lte(at)),
        )
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        // Either stale or missing; only the latter is an error.
        find_by_id(db, id).await?;
        debug!("Skipping stale activity for Sensor {id} at {at}");
        return Ok(false);
    }

    Ok(true)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(record_not_found)
}

pub async fn find_by_serial_number(
    db: &DatabaseConnection,
    serial_number: &str,
) -> Result<Model, Error> {
    Entity::find()
        .filter(Column::SerialNumber.eq(serial_number))
        .one(db)
        .await?
        .ok_or_else(record_not_found)
}

pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}
