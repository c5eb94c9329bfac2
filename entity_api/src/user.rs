use super::error::Error;
use super::record_not_found;
use entity::users::{ActiveModel, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection, TryIntoModel};

use log::*;

pub async fn create(db: &DatabaseConnection, user_model: Model) -> Result<Model, Error> {
    debug!("New User Model to be inserted: {:?}", user_model);

    let user_active_model: ActiveModel = ActiveModel {
        name: Set(user_model.name),
        ..Default::default()
    };

    Ok(user_active_model.save(db).await?.try_into_model()?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(record_not_found)
}
