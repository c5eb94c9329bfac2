use crate::context::Context;
use crate::error::Error;
use crate::repository::{SensorOwnerRepository, SensorRepository, UserRepository};
use crate::{sensors, sensors_users, users, Id};
use log::*;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    owners: Arc<dyn SensorOwnerRepository>,
    sensors: Arc<dyn SensorRepository>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        owners: Arc<dyn SensorOwnerRepository>,
        sensors: Arc<dyn SensorRepository>,
    ) -> Self {
        Self {
            users,
            owners,
            sensors,
        }
    }

    pub async fn register(&self, ctx: &Context, name: &str) -> Result<users::Model, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid("user name must not be empty"));
        }

        let user = self
            .users
            .save_user(
                ctx,
                users::Model {
                    id: 0,
                    name: name.to_string(),
                },
            )
            .await?;
        info!("Registered user {}", user.id);

        Ok(user)
    }

    /// Makes `user_id` an owner of `sensor_id`. Both must already exist.
    pub async fn attach_sensor(
        &self,
        ctx: &Context,
        user_id: Id,
        sensor_id: Id,
    ) -> Result<sensors_users::Model, Error> {
        self.users.get_user_by_id(ctx, user_id).await?;
        self.sensors.get_sensor_by_id(ctx, sensor_id).await?;

        self.owners.save_sensor_owner(ctx, user_id, sensor_id).await
    }

    pub async fn sensors_of(
        &self,
        ctx: &Context,
        user_id: Id,
    ) -> Result<Vec<sensors::Model>, Error> {
        self.users.get_user_by_id(ctx, user_id).await?;

        let links = self.owners.get_sensors_by_user_id(ctx, user_id).await?;
        let mut sensors = Vec::with_capacity(links.len());
        for link in links {
            sensors.push(self.sensors.get_sensor_by_id(ctx, link.sensor_id).await?);
        }

        Ok(sensors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::NewSensor;
    use crate::Services;

    async fn sensor(services: &Services, serial_number: &str) -> sensors::Model {
        services
            .sensors
            .register(
                &Context::background(),
                NewSensor {
                    serial_number: serial_number.to_string(),
                    sensor_type: "cc".to_string(),
                    description: String::new(),
                    is_active: true,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn register_trims_the_name() {
        let services = Services::in_memory();

        let user = services
            .users
            .register(&Context::background(), "  Grace  ")
            .await
            .unwrap();

        assert_eq!(user.name, "Grace");
    }

    #[tokio::test]
    async fn register_rejects_blank_names() {
        let services = Services::in_memory();

        let result = services
            .users
            .register(&Context::background(), "   ")
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn attached_sensors_are_listed_once() {
        let services = Services::in_memory();
        let ctx = Context::background();
        let user = services.users.register(&ctx, "Grace").await.unwrap();
        let first = sensor(&services, "0000000001").await;
        let second = sensor(&services, "0000000002").await;

        services.users.attach_sensor(&ctx, user.id, first.id).await.unwrap();
        services.users.attach_sensor(&ctx, user.id, second.id).await.unwrap();
        services.users.attach_sensor(&ctx, user.id, first.id).await.unwrap();

        let owned = services.users.sensors_of(&ctx, user.id).await.unwrap();
        assert_eq!(owned, vec![first, second]);
    }

    #[tokio::test]
    async fn attaching_requires_an_existing_user_and_sensor() {
        let services = Services::in_memory();
        let ctx = Context::background();
        let user = services.users.register(&ctx, "Grace").await.unwrap();
        let sensor = sensor(&services, "0000000001").await;

        let err = services
            .users
            .attach_sensor(&ctx, user.id + 1, sensor.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = services
            .users
            .attach_sensor(&ctx, user.id, sensor.id + 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn sensors_of_an_unknown_user_is_not_found() {
        let services = Services::in_memory();

        let err = services
            .users
            .sensors_of(&Context::background(), 3)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
