use crate::event::EventService;
use crate::repository::memory::{
    MemoryEventRepository, MemorySensorOwnerRepository, MemorySensorRepository,
    MemoryUserRepository,
};
use crate::repository::postgres::PostgresRepository;
use crate::repository::{EventRepository, SensorOwnerRepository, SensorRepository, UserRepository};
use crate::sensor::SensorService;
use crate::user::UserService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// The use cases of the platform wired to one storage backend.
#[derive(Clone)]
pub struct Services {
    pub sensors: SensorService,
    pub events: EventService,
    pub users: UserService,
    event_store: Arc<dyn EventRepository>,
}

impl Services {
    pub fn new(
        events: Arc<dyn EventRepository>,
        sensors: Arc<dyn SensorRepository>,
        users: Arc<dyn UserRepository>,
        owners: Arc<dyn SensorOwnerRepository>,
    ) -> Self {
        Self {
            sensors: SensorService::new(sensors.clone()),
            events: EventService::new(events.clone(), sensors.clone()),
            users: UserService::new(users, owners, sensors),
            event_store: events,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryEventRepository::new()),
            Arc::new(MemorySensorRepository::new()),
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemorySensorOwnerRepository::new()),
        )
    }

    pub fn postgres(db: Arc<DatabaseConnection>) -> Self {
        let repository = Arc::new(PostgresRepository::new(db));
        Self::new(
            repository.clone(),
            repository.clone(),
            repository.clone(),
            repository,
        )
    }

    /// The event store polled by live delivery sessions.
    pub fn event_store(&self) -> Arc<dyn EventRepository> {
        self.event_store.clone()
    }
}
