use crate::context::Context;
use crate::error::Error;
use crate::repository::{EventRepository, SensorRepository};
use crate::{events, Id};
use log::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use std::sync::Arc;

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventRepository>,
    sensors: Arc<dyn SensorRepository>,
}

impl EventService {
    pub fn new(events: Arc<dyn EventRepository>, sensors: Arc<dyn SensorRepository>) -> Self {
        Self { events, sensors }
    }

    /// Records a reading for the sensor with `serial_number`, stamped with the
    /// server's clock, and makes it the sensor's current state unless a
    /// later event already did.
    pub async fn receive(
        &self,
        ctx: &Context,
        serial_number: &str,
        payload: i64,
    ) -> Result<events::Model, Error> {
        let sensor = self
            .sensors
            .get_sensor_by_serial_number(ctx, serial_number)
            .await?;

        let event = events::Model {
            id: 0,
            timestamp: chrono::Utc::now().into(),
            sensor_serial_number: serial_number.to_string(),
            sensor_id: sensor.id,
            payload,
        };
        let event = self.events.save_event(ctx, event).await?;

        self.sensors
            .record_activity(ctx, sensor.id, event.payload, event.timestamp)
            .await?;

        trace!("Received event {:?}", event);

        Ok(event)
    }

    pub async fn latest(&self, ctx: &Context, sensor_id: Id) -> Result<events::Model, Error> {
        self.events.get_last_event_by_sensor_id(ctx, sensor_id).await
    }

    /// Events of a known sensor between `start` and `end`, both inclusive. A
    /// sensor that never reported yields an empty history.
    pub async fn history(
        &self,
        ctx: &Context,
        sensor_id: Id,
        start: DateTimeWithTimeZone,
        end: DateTimeWithTimeZone,
    ) -> Result<Vec<events::Model>, Error> {
        if start > end {
            return Err(Error::invalid("start date must not be after end date"));
        }

        self.sensors.get_sensor_by_id(ctx, sensor_id).await?;

        match self
            .events
            .get_events_in_range(ctx, sensor_id, start, end)
            .await
        {
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::{MemoryEventRepository, MemorySensorRepository};
    use crate::sensor::{NewSensor, SensorService};
    use crate::sensors;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Fixture {
        sensors: SensorService,
        events: EventService,
    }

    fn fixture() -> Fixture {
        let sensor_repository = Arc::new(MemorySensorRepository::new());
        Fixture {
            sensors: SensorService::new(sensor_repository.clone()),
            events: EventService::new(Arc::new(MemoryEventRepository::new()), sensor_repository),
        }
    }

    async fn register(fixture: &Fixture, serial_number: &str) -> crate::sensors::Model {
        fixture
            .sensors
            .register(
                &Context::background(),
                NewSensor {
                    serial_number: serial_number.to_string(),
                    sensor_type: "adc".to_string(),
                    description: String::new(),
                    is_active: true,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn receive_updates_the_sensor_state() {
        let fixture = fixture();
        let ctx = Context::background();
        let sensor = register(&fixture, "0123456789").await;

        let event = fixture
            .events
            .receive(&ctx, "0123456789", 17)
            .await
            .unwrap();

        assert_eq!(event.sensor_id, sensor.id);

        let sensor = fixture.sensors.find_by_id(&ctx, sensor.id).await.unwrap();
        assert_eq!(sensor.current_state, 17);
        assert_eq!(sensor.last_activity, Some(event.timestamp));

        let latest = fixture.events.latest(&ctx, sensor.id).await.unwrap();
        assert_eq!(latest, event);
    }

    #[tokio::test]
    async fn receive_for_an_unknown_serial_number_is_not_found() {
        let err = fixture()
            .events
            .receive(&Context::background(), "9999999999", 1)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn history_rejects_inverted_ranges() {
        let fixture = fixture();
        let now: DateTimeWithTimeZone = Utc::now().into();

        let err = fixture
            .events
            .history(&Context::background(), 1, now, now - Duration::seconds(1))
            .await
            .unwrap_err();

        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn history_of_a_silent_sensor_is_empty() {
        let fixture = fixture();
        let sensor = register(&fixture, "0123456789").await;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let events = fixture
            .events
            .history(
                &Context::background(),
                sensor.id,
                now - Duration::hours(1),
                now,
            )
            .await
            .unwrap();

        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn history_of_an_unknown_sensor_is_not_found() {
        let now: DateTimeWithTimeZone = Utc::now().into();

        let err = fixture()
            .events
            .history(&Context::background(), 5, now, now)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn history_contains_received_events() {
        let fixture = fixture();
        let ctx = Context::background();
        let sensor = register(&fixture, "0123456789").await;
        let before: DateTimeWithTimeZone = Utc::now().into();

        fixture.events.receive(&ctx, "0123456789", 1).await.unwrap();
        fixture.events.receive(&ctx, "0123456789", 2).await.unwrap();

        let after: DateTimeWithTimeZone = Utc::now().into();
        let events = fixture
            .events
            .history(&ctx, sensor.id, before, after)
            .await
            .unwrap();

        let payloads: Vec<i64> = events.iter().map(|event| event.payload).collect();
        assert_eq!(payloads, vec![1, 2]);
    }

    /// Holds back the first activity update so that a later event overtakes it.
    struct SlowFirstUpdate {
        inner: MemorySensorRepository,
        delayed: AtomicBool,
    }

    #[async_trait]
    impl SensorRepository for SlowFirstUpdate {
        async fn save_sensor(
            &self,
            ctx: &Context,
            sensor: sensors::Model,
        ) -> Result<sensors::Model, Error> {
            self.inner.save_sensor(ctx, sensor).await
        }

        async fn record_activity(
            &self,
            ctx: &Context,
            sensor_id: Id,
            current_state: i64,
            at: DateTimeWithTimeZone,
        ) -> Result<bool, Error> {
            if !self.delayed.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            self.inner
                .record_activity(ctx, sensor_id, current_state, at)
                .await
        }

        async fn get_sensors(&self, ctx: &Context) -> Result<Vec<sensors::Model>, Error> {
            self.inner.get_sensors(ctx).await
        }

        async fn get_sensor_by_id(&self, ctx: &Context, id: Id) -> Result<sensors::Model, Error> {
            self.inner.get_sensor_by_id(ctx, id).await
        }

        async fn get_sensor_by_serial_number(
            &self,
            ctx: &Context,
            serial_number: &str,
        ) -> Result<sensors::Model, Error> {
            self.inner.get_sensor_by_serial_number(ctx, serial_number).await
        }
    }

    #[tokio::test]
    async fn overtaken_receive_does_not_roll_the_sensor_back() {
        let sensor_repository = Arc::new(SlowFirstUpdate {
            inner: MemorySensorRepository::new(),
            delayed: AtomicBool::new(false),
        });
        let sensors = SensorService::new(sensor_repository.clone());
        let events = EventService::new(Arc::new(MemoryEventRepository::new()), sensor_repository);
        let ctx = Context::background();

        let sensor = sensors
            .register(
                &ctx,
                NewSensor {
                    serial_number: "0123456789".to_string(),
                    sensor_type: "cc".to_string(),
                    description: String::new(),
                    is_active: true,
                },
            )
            .await
            .unwrap();

        let (first, second) = tokio::join!(events.receive(&ctx, "0123456789", 1), async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            events.receive(&ctx, "0123456789", 2).await
        });
        first.unwrap();
        let second = second.unwrap();

        let latest = events.latest(&ctx, sensor.id).await.unwrap();
        let sensor = sensors.find_by_id(&ctx, sensor.id).await.unwrap();
        assert_eq!(latest, second);
        assert_eq!(sensor.current_state, 2);
        assert_eq!(sensor.last_activity, Some(second.timestamp));
    }
}
