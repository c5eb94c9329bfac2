use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Latest-event lookups and history windows both filter by sensor and
        // order by time
        manager
            .create_index(
                Index::create()
                    .name("events_sensor_id_timestamp")
                    .table((Alias::new("sensor_platform"), Alias::new("events")))
                    .col(Alias::new("sensor_id"))
                    .col(Alias::new("timestamp"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("sensors_users_user_id")
                    .table((Alias::new("sensor_platform"), Alias::new("sensors_users")))
                    .col(Alias::new("user_id"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("sensors_users_user_id")
                    .table((Alias::new("sensor_platform"), Alias::new("sensors_users")))
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("events_sensor_id_timestamp")
                    .table((Alias::new("sensor_platform"), Alias::new("events")))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
