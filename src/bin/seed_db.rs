use domain::context::Context;
use domain::error::Error;
use domain::sensor::NewSensor;
use domain::Services;
use log::{error, info};
use migration::{Migrator, MigratorTrait};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

/// Demo sensors as (serial number, type, description).
const SENSORS: &[(&str, &str, &str)] = &[
    ("CC00000001", "cc", "Front door contact"),
    ("CC00000002", "cc", "Garage door contact"),
    ("ADC0000001", "adc", "Water tank level"),
];

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(err) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {err}");
    }

    info!("Seeding database [{}]...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run database migrations: {e}");
        std::process::exit(1);
    }

    let services = Services::postgres(Arc::new(db));
    if let Err(e) = seed(&services, &Context::background()).await {
        error!("Failed to seed database: {e}");
        std::process::exit(1);
    }

    info!("Seeding complete");
}

async fn seed(services: &Services, ctx: &Context) -> Result<(), Error> {
    let user = services.users.register(ctx, "Demo User").await?;
    info!("Seeded user {} ({})", user.name, user.id);

    for (index, (serial_number, sensor_type, description)) in SENSORS.iter().enumerate() {
        let sensor = services
            .sensors
            .register(
                ctx,
                NewSensor {
                    serial_number: serial_number.to_string(),
                    sensor_type: sensor_type.to_string(),
                    description: description.to_string(),
                    is_active: true,
                },
            )
            .await?;

        services.users.attach_sensor(ctx, user.id, sensor.id).await?;

        let base = (index as i64 + 1) * 10;
        for payload in base..base + 3 {
            services.events.receive(ctx, serial_number, payload).await?;
        }

        info!("Seeded sensor {serial_number} ({}) with 3 events", sensor.id);
    }

    Ok(())
}
