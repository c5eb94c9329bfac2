use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS sensor_platform;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO sensor_platform, public;")
            .await?;

        // The application role owns everything inside the schema
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    GRANT ALL ON SCHEMA sensor_platform TO CURRENT_USER;

                    ALTER DEFAULT PRIVILEGES IN SCHEMA sensor_platform GRANT ALL ON TABLES TO CURRENT_USER;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA sensor_platform GRANT ALL ON SEQUENCES TO CURRENT_USER;
                END $$;
            "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS sensor_platform CASCADE;")
            .await?;

        Ok(())
    }
}
