//! Storage seams used by the domain services and the live delivery sessions.
//!
//! Every operation takes the caller's `Context` and fails immediately with
//! `Canceled` or `DeadlineExceeded` when that context has already ended.
use crate::context::Context;
use crate::error::Error;
use crate::{events, sensors, sensors_users, users, Id};
use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Appends an event to its sensor's history and returns it with its id.
    async fn save_event(&self, ctx: &Context, event: events::Model) -> Result<events::Model, Error>;

    /// The event with the greatest timestamp, `NotFound` when the sensor has none.
    async fn get_last_event_by_sensor_id(
        &self,
        ctx: &Context,
        sensor_id: Id,
    ) -> Result<events::Model, Error>;

    /// Events with `start <= timestamp <= end`, oldest first. `NotFound` when
    /// the sensor has no events at all.
    async fn get_events_in_range(
        &self,
        ctx: &Context,
        sensor_id: Id,
        start: DateTimeWithTimeZone,
        end: DateTimeWithTimeZone,
    ) -> Result<Vec<events::Model>, Error>;
}

#[async_trait]
pub trait SensorRepository: Send + Sync {
    /// Inserts the sensor when its id is 0, otherwise updates its mutable state.
    async fn save_sensor(
        &self,
        ctx: &Context,
        sensor: sensors::Model,
    ) -> Result<sensors::Model, Error>;

    /// Makes `current_state` the sensor's state as of `at`, unless the sensor
    /// already reflects a later event. Returns whether the sensor changed.
    async fn record_activity(
        &self,
        ctx: &Context,
        sensor_id: Id,
        current_state: i64,
        at: DateTimeWithTimeZone,
    ) -> Result<bool, Error>;

    async fn get_sensors(&self, ctx: &Context) -> Result<Vec<sensors::Model>, Error>;

    async fn get_sensor_by_id(&self, ctx: &Context, id: Id) -> Result<sensors::Model, Error>;

    async fn get_sensor_by_serial_number(
        &self,
        ctx: &Context,
        serial_number: &str,
    ) -> Result<sensors::Model, Error>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save_user(&self, ctx: &Context, user: users::Model) -> Result<users::Model, Error>;

    async fn get_user_by_id(&self, ctx: &Context, id: Id) -> Result<users::Model, Error>;
}

#[async_trait]
pub trait SensorOwnerRepository: Send + Sync {
    /// Records that `user_id` owns `sensor_id`. Saving an existing pair is a no-op.
    async fn save_sensor_owner(
        &self,
        ctx: &Context,
        user_id: Id,
        sensor_id: Id,
    ) -> Result<sensors_users::Model, Error>;

    async fn get_sensors_by_user_id(
        &self,
        ctx: &Context,
        user_id: Id,
    ) -> Result<Vec<sensors_users::Model>, Error>;
}
