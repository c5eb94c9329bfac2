use crate::context::Context;
use crate::error::Error;
use crate::repository::SensorRepository;
use crate::sensor_type::SensorType;
use crate::{sensors, Id};
use log::*;
use std::str::FromStr;
use std::sync::Arc;

/// Length every sensor serial number must have.
pub const SERIAL_NUMBER_LEN: usize = 10;

/// Registration request for a sensor, as submitted by a client.
#[derive(Clone, Debug)]
pub struct NewSensor {
    pub serial_number: String,
    pub sensor_type: String,
    pub description: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct SensorService {
    sensors: Arc<dyn SensorRepository>,
}

impl SensorService {
    pub fn new(sensors: Arc<dyn SensorRepository>) -> Self {
        Self { sensors }
    }

    /// Registers a sensor. Registering a serial number that is already known
    /// returns the stored sensor unchanged.
    pub async fn register(
        &self,
        ctx: &Context,
        new_sensor: NewSensor,
    ) -> Result<sensors::Model, Error> {
        if new_sensor.serial_number.chars().count() != SERIAL_NUMBER_LEN {
            return Err(Error::invalid(format!(
                "serial number must be exactly {SERIAL_NUMBER_LEN} characters"
            )));
        }

        let sensor_type = SensorType::from_str(&new_sensor.sensor_type)
            .map_err(|err| Error::invalid(err.to_string()))?;

        match self
            .sensors
            .get_sensor_by_serial_number(ctx, &new_sensor.serial_number)
            .await
        {
            Ok(existing) => {
                debug!(
                    "Sensor {} is already registered as {}",
                    existing.serial_number, existing.id
                );
                return Ok(existing);
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let serial_number = new_sensor.serial_number;
        let sensor = sensors::Model {
            id: 0,
            serial_number: serial_number.clone(),
            sensor_type,
            current_state: 0,
            description: new_sensor.description,
            is_active: new_sensor.is_active,
            registered_at: chrono::Utc::now().into(),
            last_activity: None,
        };

        match self.sensors.save_sensor(ctx, sensor).await {
            Ok(sensor) => {
                info!("Registered sensor {} ({})", sensor.id, sensor.serial_number);
                Ok(sensor)
            }
            // A concurrent registration of the same serial won the insert.
            Err(err) if err.is_conflict() => {
                debug!("Sensor {serial_number} was registered concurrently");
                self.sensors
                    .get_sensor_by_serial_number(ctx, &serial_number)
                    .await
            }
            Err(err) => Err(err),
        }
    }

    pub async fn list(&self, ctx: &Context) -> Result<Vec<sensors::Model>, Error> {
        self.sensors.get_sensors(ctx).await
    }

    pub async fn find_by_id(&self, ctx: &Context, id: Id) -> Result<sensors::Model, Error> {
        self.sensors.get_sensor_by_id(ctx, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use crate::repository::memory::MemorySensorRepository;
    use async_trait::async_trait;
    use sea_orm::prelude::DateTimeWithTimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Misses the first serial lookup, as if another registration inserted
    /// the sensor right after it.
    struct LateLookup {
        inner: MemorySensorRepository,
        missed: AtomicBool,
    }

    #[async_trait]
    impl SensorRepository for LateLookup {
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
            if !self.missed.swap(true, Ordering::SeqCst) {
                return Err(Error::not_found());
            }
            self.inner.get_sensor_by_serial_number(ctx, serial_number).await
        }
    }

    fn service() -> SensorService {
        SensorService::new(Arc::new(MemorySensorRepository::new()))
    }

    fn new_sensor(serial_number: &str, sensor_type: &str) -> NewSensor {
        NewSensor {
            serial_number: serial_number.to_string(),
            sensor_type: sensor_type.to_string(),
            description: "hallway door".to_string(),
            is_active: true,
        }
    }

    fn is_invalid(err: &Error) -> bool {
        matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid(_)))
        )
    }

    #[tokio::test]
    async fn register_assigns_an_id_and_registration_time() {
        let service = service();
        let ctx = Context::background();

        let sensor = service
            .register(&ctx, new_sensor("0123456789", "cc"))
            .await
            .unwrap();

        assert_eq!(sensor.id, 1);
        assert_eq!(sensor.sensor_type, SensorType::ContactClosure);
        assert!(sensor.last_activity.is_none());
        assert_eq!(service.find_by_id(&ctx, 1).await.unwrap(), sensor);
    }

    #[tokio::test]
    async fn register_rejects_serial_numbers_of_the_wrong_length() {
        let err = service()
            .register(&Context::background(), new_sensor("12345", "adc"))
            .await
            .unwrap_err();

        assert!(is_invalid(&err));
    }

    #[tokio::test]
    async fn register_rejects_unknown_sensor_types() {
        let err = service()
            .register(&Context::background(), new_sensor("0123456789", "thermo"))
            .await
            .unwrap_err();

        assert!(is_invalid(&err));
    }

    #[tokio::test]
    async fn registering_a_known_serial_number_returns_the_stored_sensor() {
        let service = service();
        let ctx = Context::background();

        let first = service
            .register(&ctx, new_sensor("0123456789", "cc"))
            .await
            .unwrap();
        let second = service
            .register(&ctx, new_sensor("0123456789", "adc"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(service.list(&ctx).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_by_id_of_an_unknown_sensor_is_not_found() {
        let err = service()
            .find_by_id(&Context::background(), 404)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn losing_a_registration_race_returns_the_winner() {
        let repository = Arc::new(LateLookup {
            inner: MemorySensorRepository::new(),
            missed: AtomicBool::new(false),
        });
        let ctx = Context::background();
        let service = SensorService::new(repository.clone());

        let winner = repository
            .inner
            .save_sensor(
                &ctx,
                sensors::Model {
                    id: 0,
                    serial_number: "0123456789".to_string(),
                    sensor_type: SensorType::Adc,
                    current_state: 0,
                    description: "first".to_string(),
                    is_active: true,
                    registered_at: chrono::Utc::now().into(),
                    last_activity: None,
                },
            )
            .await
            .unwrap();

        let registered = service
            .register(&ctx, new_sensor("0123456789", "cc"))
            .await
            .unwrap();

        assert_eq!(registered, winner);
        assert_eq!(service.list(&ctx).await.unwrap().len(), 1);
    }
}
