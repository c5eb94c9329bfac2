//! Repositories backed by Postgres through the `entity_api` functions.
use super::{EventRepository, SensorOwnerRepository, SensorRepository, UserRepository};
use crate::context::Context;
use crate::error::Error;
use crate::{events, sensors, sensors_users, users, Id};
use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// One handle implementing every repository trait over a shared connection pool.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    db: Arc<DatabaseConnection>,
}

impl PostgresRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventRepository for PostgresRepository {
    async fn save_event(&self, ctx: &Context, event: events::Model) -> Result<events::Model, Error> {
        ctx.run(async { Ok(entity_api::event::create(&self.db, event).await?) })
            .await
    }

    async fn get_last_event_by_sensor_id(
        &self,
        ctx: &Context,
        sensor_id: Id,
    ) -> Result<events::Model, Error> {
        ctx.run(async {
            Ok(entity_api::event::find_latest_by_sensor_id(&self.db, sensor_id).await?)
        })
        .await
    }

    async fn get_events_in_range(
        &self,
        ctx: &Context,
        sensor_id: Id,
        start: DateTimeWithTimeZone,
        end: DateTimeWithTimeZone,
    ) -> Result<Vec<events::Model>, Error> {
        ctx.run(async {
            let events =
                entity_api::event::find_by_sensor_id_in_range(&self.db, sensor_id, start, end)
                    .await?;

            if events.is_empty()
                && !entity_api::event::exists_for_sensor(&self.db, sensor_id).await?
            {
                return Err(Error::not_found());
            }

            Ok(events)
        })
        .await
    }
}

#[async_trait]
impl SensorRepository for PostgresRepository {
    async fn save_sensor(
        &self,
        ctx: &Context,
        sensor: sensors::Model,
    ) -> Result<sensors::Model, Error> {
        ctx.run(async {
            let saved = match sensor.id {
                0 => entity_api::sensor::create(&self.db, sensor).await?,
                id => entity_api::sensor::update(&self.db, id, sensor).await?,
            };
            Ok(saved)
        })
        .await
    }

    async fn record_activity(
        &self,
        ctx: &Context,
        sensor_id: Id,
        current_state: i64,
        at: DateTimeWithTimeZone,
    ) -> Result<bool, Error> {
        ctx.run(async {
            Ok(entity_api::sensor::record_activity(&self.db, sensor_id, current_state, at).await?)
        })
        .await
    }

    async fn get_sensors(&self, ctx: &Context) -> Result<Vec<sensors::Model>, Error> {
        ctx.run(async { Ok(entity_api::sensor::find_all(&self.db).await?) })
            .await
    }

    async fn get_sensor_by_id(&self, ctx: &Context, id: Id) -> Result<sensors::Model, Error> {
        ctx.run(async { Ok(entity_api::sensor::find_by_id(&self.db, id).await?) })
            .await
    }

    async fn get_sensor_by_serial_number(
        &self,
        ctx: &Context,
        serial_number: &str,
    ) -> Result<sensors::Model, Error> {
        ctx.run(async {
            Ok(entity_api::sensor::find_by_serial_number(&self.db, serial_number).await?)
        })
        .await
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn save_user(&self, ctx: &Context, user: users::Model) -> Result<users::Model, Error> {
        ctx.run(async { Ok(entity_api::user::create(&self.db, user).await?) })
            .await
    }

    async fn get_user_by_id(&self, ctx: &Context, id: Id) -> Result<users::Model, Error> {
        ctx.run(async { Ok(entity_api::user::find_by_id(&self.db, id).await?) })
            .await
    }
}

#[async_trait]
impl SensorOwnerRepository for PostgresRepository {
    async fn save_sensor_owner(
        &self,
        ctx: &Context,
        user_id: Id,
        sensor_id: Id,
    ) -> Result<sensors_users::Model, Error> {
        ctx.run(async { Ok(entity_api::sensors_user::create(&self.db, user_id, sensor_id).await?) })
            .await
    }

    async fn get_sensors_by_user_id(
        &self,
        ctx: &Context,
        user_id: Id,
    ) -> Result<Vec<sensors_users::Model>, Error> {
        ctx.run(async { Ok(entity_api::sensors_user::find_by_user_id(&self.db, user_id).await?) })
            .await
    }
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn empty_range_of_a_sensor_without_history_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<events::Model>::new()])
            .append_query_results(vec![vec![std::collections::BTreeMap::from([(
                "num_items".to_string(),
                sea_orm::Value::BigInt(Some(0)),
            )])]])
            .into_connection();
        let repo = PostgresRepository::new(Arc::new(db));
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();

        let err = repo
            .get_events_in_range(&Context::background(), 1, now, now)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn canceled_context_never_reaches_the_database() {
        // No query results are queued; any query would fail with a mock error.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PostgresRepository::new(Arc::new(db));
        let ctx = Context::background();
        ctx.cancel();

        let err = repo.get_sensors(&ctx).await.unwrap_err();

        assert_eq!(
            err.error_kind,
            crate::error::DomainErrorKind::Context(crate::error::ContextErrorKind::Canceled)
        );
    }
}
