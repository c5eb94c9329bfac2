use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r#"
            CREATE TYPE sensor_platform.sensor_type AS ENUM ('cc', 'adc');
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE sensor_platform.sensors (
                id BIGSERIAL PRIMARY KEY,
                serial_number VARCHAR(10) NOT NULL UNIQUE,
                "type" sensor_platform.sensor_type NOT NULL,
                current_state BIGINT NOT NULL DEFAULT 0,
                description TEXT NOT NULL DEFAULT '',
                is_active BOOLEAN NOT NULL DEFAULT FALSE,
                registered_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                last_activity TIMESTAMPTZ
            );
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE sensor_platform.events (
                id BIGSERIAL PRIMARY KEY,
                "timestamp" TIMESTAMPTZ NOT NULL DEFAULT now(),
                sensor_serial_number VARCHAR(10) NOT NULL,
                sensor_id BIGINT NOT NULL
                    REFERENCES sensor_platform.sensors (id) ON DELETE CASCADE,
                payload BIGINT NOT NULL
            );
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE sensor_platform.users (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL
            );
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE sensor_platform.sensors_users (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL
                    REFERENCES sensor_platform.users (id) ON DELETE CASCADE,
                sensor_id BIGINT NOT NULL
                    REFERENCES sensor_platform.sensors (id) ON DELETE CASCADE,
                CONSTRAINT sensors_users_user_sensor_unique UNIQUE (user_id, sensor_id)
            );
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TABLE IF EXISTS sensor_platform.sensors_users;
                DROP TABLE IF EXISTS sensor_platform.users;
                DROP TABLE IF EXISTS sensor_platform.events;
                DROP TABLE IF EXISTS sensor_platform.sensors;
                DROP TYPE IF EXISTS sensor_platform.sensor_type;
                "#,
            )
            .await?;

        Ok(())
    }
}
