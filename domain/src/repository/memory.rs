//! Process-local repositories. Each instance owns its own id sequence and
//! guards its maps with a `RwLock`, so readers never observe a half-applied write.
use super::{EventRepository, SensorOwnerRepository, SensorRepository, UserRepository};
use crate::context::Context;
use crate::error::Error;
use crate::{events, sensors, sensors_users, users, Id};
use async_trait::async_trait;
use log::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Sequence(AtomicI64);

impl Sequence {
    fn next(&self) -> Id {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Debug, Default)]
pub struct MemoryEventRepository {
    ids: Sequence,
    history: RwLock<HashMap<Id, Vec<events::Model>>>,
}

impl MemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for MemoryEventRepository {
    async fn save_event(
        &self,
        ctx: &Context,
        mut event: events::Model,
    ) -> Result<events::Model, Error> {
        ctx.check()?;

        event.id = self.ids.next();
        self.history
            .write()
            .await
            .entry(event.sensor_id)
            .or_default()
            .push(event.clone());

        Ok(event)
    }

    async fn get_last_event_by_sensor_id(
        &self,
        ctx: &Context,
        sensor_id: Id,
    ) -> Result<events::Model, Error> {
        ctx.check()?;

        let history = self.history.read().await;
        history
            .get(&sensor_id)
            // `max_by_key` keeps the last of equal maxima, so the later append wins ties.
            .and_then(|events| events.iter().max_by_key(|event| event.timestamp))
            .cloned()
            .ok_or_else(Error::not_found)
    }

    async fn get_events_in_range(
        &self,
        ctx: &Context,
        sensor_id: Id,
        start: DateTimeWithTimeZone,
        end: DateTimeWithTimeZone,
    ) -> Result<Vec<events::Model>, Error> {
        ctx.check()?;

        let history = self.history.read().await;
        let events = match history.get(&sensor_id) {
            Some(events) if !events.is_empty() => events,
            _ => return Err(Error::not_found()),
        };

        let mut in_range: Vec<events::Model> = events
            .iter()
            .filter(|event| event.timestamp >= start && event.timestamp <= end)
            .cloned()
            .collect();
        in_range.sort_by_key(|event| event.timestamp);

        Ok(in_range)
    }
}

#[derive(Debug, Default)]
pub struct MemorySensorRepository {
    ids: Sequence,
    sensors: RwLock<BTreeMap<Id, sensors::Model>>,
}

impl MemorySensorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SensorRepository for MemorySensorRepository {
    async fn save_sensor(
        &self,
        ctx: &Context,
        mut sensor: sensors::Model,
    ) -> Result<sensors::Model, Error> {
        ctx.check()?;

        let mut sensors = self.sensors.write().await;

        if sensor.id == 0 {
            if sensors
                .values()
                .any(|existing| existing.serial_number == sensor.serial_number)
            {
                return Err(Error::conflict());
            }

            sensor.id = self.ids.next();
            sensor.registered_at = chrono::Utc::now().into();
            debug!("Registering sensor {} as {}", sensor.serial_number, sensor.id);
            sensors.insert(sensor.id, sensor.clone());
            return Ok(sensor);
        }

        let existing = sensors.get_mut(&sensor.id).ok_or_else(Error::not_found)?;
        existing.current_state = sensor.current_state;
        existing.description = sensor.description;
        existing.is_active = sensor.is_active;
        existing.last_activity = sensor.last_activity;

        Ok(existing.clone())
    }

    async fn record_activity(
        &self,
        ctx: &Context,
        sensor_id: Id,
        current_state: i64,
        at: DateTimeWithTimeZone,
    ) -> Result<bool, Error> {
        ctx.check()?;

        let mut sensors = self.sensors.write().await;
        let sensor = sensors.get_mut(&sensor_id).ok_or_else(Error::not_found)?;

        if sensor.last_activity.is_some_and(|last| last > at) {
            trace!("Skipping stale activity for sensor {sensor_id} at {at}");
            return Ok(false);
        }

        sensor.current_state = current_state;
        sensor.last_activity = Some(at);

        Ok(true)
    }

    async fn get_sensors(&self, ctx: &Context) -> Result<Vec<sensors::Model>, Error> {
        ctx.check()?;

        Ok(self.sensors.read().await.values().cloned().collect())
    }

    async fn get_sensor_by_id(&self, ctx: &Context, id: Id) -> Result<sensors::Model, Error> {
        ctx.check()?;

        self.sensors
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(Error::not_found)
    }

    async fn get_sensor_by_serial_number(
        &self,
        ctx: &Context,
        serial_number: &str,
    ) -> Result<sensors::Model, Error> {
        ctx.check()?;

        self.sensors
            .read()
            .await
            .values()
            .find(|sensor| sensor.serial_number == serial_number)
            .cloned()
            .ok_or_else(Error::not_found)
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    ids: Sequence,
    users: RwLock<HashMap<Id, users::Model>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn save_user(&self, ctx: &Context, mut user: users::Model) -> Result<users::Model, Error> {
        ctx.check()?;

        user.id = self.ids.next();
        self.users.write().await.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_user_by_id(&self, ctx: &Context, id: Id) -> Result<users::Model, Error> {
        ctx.check()?;

        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(Error::not_found)
    }
}

#[derive(Debug, Default)]
pub struct MemorySensorOwnerRepository {
    ids: Sequence,
    owners: RwLock<Vec<sensors_users::Model>>,
}

impl MemorySensorOwnerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SensorOwnerRepository for MemorySensorOwnerRepository {
    async fn save_sensor_owner(
        &self,
        ctx: &Context,
        user_id: Id,
        sensor_id: Id,
    ) -> Result<sensors_users::Model, Error> {
        ctx.check()?;

        let mut owners = self.owners.write().await;

        if let Some(link) = owners
            .iter()
            .find(|link| link.user_id == user_id && link.sensor_id == sensor_id)
        {
            return Ok(link.clone());
        }

        let link = sensors_users::Model {
            id: self.ids.next(),
            user_id,
            sensor_id,
        };
        owners.push(link.clone());

        Ok(link)
    }

    async fn get_sensors_by_user_id(
        &self,
        ctx: &Context,
        user_id: Id,
    ) -> Result<Vec<sensors_users::Model>, Error> {
        ctx.check()?;

        Ok(self
            .owners
            .read()
            .await
            .iter()
            .filter(|link| link.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContextErrorKind, DomainErrorKind};
    use crate::sensor_type::SensorType;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn at(secs: i64) -> DateTimeWithTimeZone {
        Utc.timestamp_opt(1_700_000_000 + secs, 0)
            .single()
            .unwrap()
            .into()
    }

    fn event(sensor_id: Id, secs: i64, payload: i64) -> events::Model {
        events::Model {
            id: 0,
            timestamp: at(secs),
            sensor_serial_number: "0123456789".to_string(),
            sensor_id,
            payload,
        }
    }

    fn new_sensor(serial_number: &str) -> sensors::Model {
        sensors::Model {
            id: 0,
            serial_number: serial_number.to_string(),
            sensor_type: SensorType::ContactClosure,
            current_state: 0,
            description: String::new(),
            is_active: true,
            registered_at: at(0),
            last_activity: None,
        }
    }

    #[tokio::test]
    async fn latest_event_is_the_one_with_the_greatest_timestamp() {
        let repo = MemoryEventRepository::new();
        let ctx = Context::background();

        repo.save_event(&ctx, event(1, 10, 1)).await.unwrap();
        repo.save_event(&ctx, event(1, 30, 3)).await.unwrap();
        repo.save_event(&ctx, event(1, 20, 2)).await.unwrap();

        let latest = repo.get_last_event_by_sensor_id(&ctx, 1).await.unwrap();
        assert_eq!(latest.payload, 3);
    }

    #[tokio::test]
    async fn equal_timestamps_resolve_to_the_later_append() {
        let repo = MemoryEventRepository::new();
        let ctx = Context::background();

        repo.save_event(&ctx, event(1, 10, 1)).await.unwrap();
        repo.save_event(&ctx, event(1, 10, 2)).await.unwrap();

        let latest = repo.get_last_event_by_sensor_id(&ctx, 1).await.unwrap();
        assert_eq!(latest.payload, 2);
    }

    #[tokio::test]
    async fn sensor_without_events_has_no_latest_event() {
        let repo = MemoryEventRepository::new();

        let err = repo
            .get_last_event_by_sensor_id(&Context::background(), 42)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn canceled_context_fails_without_touching_storage() {
        let repo = MemoryEventRepository::new();
        let ctx = Context::background();
        ctx.cancel();

        let err = repo.save_event(&ctx, event(1, 1, 1)).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Context(ContextErrorKind::Canceled)
        );

        let err = repo
            .get_last_event_by_sensor_id(&Context::background(), 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn expired_context_reports_deadline_exceeded() {
        let repo = MemorySensorRepository::new();
        let ctx = Context::background().with_deadline(tokio::time::Instant::now());

        let err = repo.get_sensors(&ctx).await.unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Context(ContextErrorKind::DeadlineExceeded)
        );
    }

    #[tokio::test]
    async fn range_is_inclusive_and_ordered() {
        let repo = MemoryEventRepository::new();
        let ctx = Context::background();

        for (secs, payload) in [(40, 4), (10, 1), (30, 3), (20, 2), (50, 5)] {
            repo.save_event(&ctx, event(7, secs, payload)).await.unwrap();
        }

        let events = repo
            .get_events_in_range(&ctx, 7, at(20), at(40))
            .await
            .unwrap();

        let payloads: Vec<i64> = events.iter().map(|event| event.payload).collect();
        assert_eq!(payloads, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn range_distinguishes_unknown_history_from_empty_window() {
        let repo = MemoryEventRepository::new();
        let ctx = Context::background();

        let err = repo
            .get_events_in_range(&ctx, 7, at(0), at(100))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        repo.save_event(&ctx, event(7, 500, 1)).await.unwrap();
        let events = repo
            .get_events_in_range(&ctx, 7, at(0), at(100))
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_never_lost() {
        let repo = Arc::new(MemoryEventRepository::new());

        let tasks: Vec<_> = (0..1000)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.save_event(&Context::background(), event(3, i, i))
                        .await
                        .unwrap()
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        let ctx = Context::background();
        let latest = repo.get_last_event_by_sensor_id(&ctx, 3).await.unwrap();
        assert_eq!(latest.payload, 999);

        let all = repo
            .get_events_in_range(&ctx, 3, at(0), at(0) + Duration::seconds(999))
            .await
            .unwrap();
        assert_eq!(all.len(), 1000);
    }

    #[tokio::test]
    async fn sensor_ids_come_from_a_per_instance_sequence() {
        let first = MemorySensorRepository::new();
        let second = MemorySensorRepository::new();
        let ctx = Context::background();

        let a = first.save_sensor(&ctx, new_sensor("0000000001")).await.unwrap();
        let b = first.save_sensor(&ctx, new_sensor("0000000002")).await.unwrap();
        let c = second.save_sensor(&ctx, new_sensor("0000000001")).await.unwrap();

        assert_eq!((a.id, b.id, c.id), (1, 2, 1));
    }

    #[tokio::test]
    async fn updating_a_sensor_keeps_its_identity_and_registration() {
        let repo = MemorySensorRepository::new();
        let ctx = Context::background();

        let sensor = repo.save_sensor(&ctx, new_sensor("0123456789")).await.unwrap();
        let updated = repo
            .save_sensor(
                &ctx,
                sensors::Model {
                    current_state: 12,
                    last_activity: Some(at(60)),
                    serial_number: "ignored!!!".to_string(),
                    registered_at: at(99),
                    ..sensor.clone()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.current_state, 12);
        assert_eq!(updated.serial_number, sensor.serial_number);
        assert_eq!(updated.registered_at, sensor.registered_at);
    }

    #[tokio::test]
    async fn duplicate_serial_numbers_conflict() {
        let repo = MemorySensorRepository::new();
        let ctx = Context::background();

        repo.save_sensor(&ctx, new_sensor("0123456789")).await.unwrap();
        let err = repo
            .save_sensor(&ctx, new_sensor("0123456789"))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(crate::error::InternalErrorKind::Entity(
                crate::error::EntityErrorKind::Conflict
            ))
        );
    }

    #[tokio::test]
    async fn activity_never_moves_a_sensor_backwards() {
        let repo = MemorySensorRepository::new();
        let ctx = Context::background();
        let sensor = repo.save_sensor(&ctx, new_sensor("0123456789")).await.unwrap();

        assert!(repo.record_activity(&ctx, sensor.id, 2, at(20)).await.unwrap());
        assert!(!repo.record_activity(&ctx, sensor.id, 1, at(10)).await.unwrap());

        let sensor = repo.get_sensor_by_id(&ctx, sensor.id).await.unwrap();
        assert_eq!(sensor.current_state, 2);
        assert_eq!(sensor.last_activity, Some(at(20)));

        let err = repo.record_activity(&ctx, 99, 1, at(30)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn saving_an_existing_owner_pair_is_a_no_op() {
        let repo = MemorySensorOwnerRepository::new();
        let ctx = Context::background();

        let first = repo.save_sensor_owner(&ctx, 1, 2).await.unwrap();
        let second = repo.save_sensor_owner(&ctx, 1, 2).await.unwrap();
        repo.save_sensor_owner(&ctx, 1, 3).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.get_sensors_by_user_id(&ctx, 1).await.unwrap().len(), 2);
    }
}
