use crate::entities::prelude::*;
use crate::entities::submissions;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Assignments)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Submissions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // One submission row per (user, assignment); re-submission bumps
        // the attempts counter instead of inserting a second row.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-submissions-user-assignment")
                    .table(Submissions)
                    .col(submissions::Column::UserId)
                    .col(submissions::Column::AssignmentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Submissions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignments).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
