//! Migration: Create roles table and seed the default authorities.

use sea_orm_migration::prelude::*;
use uuid::Uuid;

use domain::DEFAULT_ROLES;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roles::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Roles::Authority)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        for authority in DEFAULT_ROLES {
            let insert = Query::insert()
                .into_table(Roles::Table)
                .columns([Roles::Id, Roles::Authority])
                .values([Uuid::new_v4().into(), (*authority).into()])
                .map_err(|e| DbErr::Migration(e.to_string()))?
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Authority,
}
