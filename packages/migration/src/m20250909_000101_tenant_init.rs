use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    Password,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Contacts {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Company,
    Notes,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Deals {
    Table,
    Id,
    Title,
    Amount,
    Status,
    ClosedAt,
    ContactId,
    AssignedTo,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Activities {
    Table,
    Id,
    Type,
    Subject,
    Description,
    HappenedAt,
    ContactId,
    DealId,
    UserId,
    CreatedAt,
    UpdatedAt,
}

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .primary_key()
        .auto_increment()
        .to_owned()
}

fn timestamps<T: IntoIden>(created: T, updated: T) -> [ColumnDef; 2] {
    [
        ColumnDef::new(created)
            .timestamp_with_time_zone()
            .not_null()
            .to_owned(),
        ColumnDef::new(updated)
            .timestamp_with_time_zone()
            .not_null()
            .to_owned(),
    ]
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // users
        let [created, updated] = timestamps(Users::CreatedAt, Users::UpdatedAt);
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(id_col(Users::Id))
                    .col(ColumnDef::new(Users::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Password).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .col(created)
                    .col(updated)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_email_unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // contacts
        let [created, updated] = timestamps(Contacts::CreatedAt, Contacts::UpdatedAt);
        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(id_col(Contacts::Id))
                    .col(ColumnDef::new(Contacts::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Contacts::Email).string_len(255).null())
                    .col(ColumnDef::new(Contacts::Phone).string_len(64).null())
                    .col(ColumnDef::new(Contacts::Company).string_len(255).null())
                    .col(ColumnDef::new(Contacts::Notes).text().null())
                    .col(ColumnDef::new(Contacts::CreatedBy).big_integer().not_null())
                    .col(created)
                    .col(updated)
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contacts_created_by")
                            .from(Contacts::Table, Contacts::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // deals
        let [created, updated] = timestamps(Deals::CreatedAt, Deals::UpdatedAt);
        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(id_col(Deals::Id))
                    .col(ColumnDef::new(Deals::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Deals::Amount).double().not_null().default(0.0))
                    .col(
                        ColumnDef::new(Deals::Status)
                            .string_len(16)
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(Deals::ClosedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Deals::ContactId).big_integer().not_null())
                    .col(ColumnDef::new(Deals::AssignedTo).big_integer().null())
                    .col(ColumnDef::new(Deals::Description).text().null())
                    .col(created)
                    .col(updated)
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deals_contact_id")
                            .from(Deals::Table, Deals::ContactId)
                            .to(Contacts::Table, Contacts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deals_assigned_to")
                            .from(Deals::Table, Deals::AssignedTo)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // activities
        let [created, updated] = timestamps(Activities::CreatedAt, Activities::UpdatedAt);
        manager
            .create_table(
                Table::create()
                    .table(Activities::Table)
                    .if_not_exists()
                    .col(id_col(Activities::Id))
                    .col(ColumnDef::new(Activities::Type).string_len(16).not_null())
                    .col(ColumnDef::new(Activities::Subject).string_len(255).not_null())
                    .col(ColumnDef::new(Activities::Description).text().null())
                    .col(
                        ColumnDef::new(Activities::HappenedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Activities::ContactId).big_integer().null())
                    .col(ColumnDef::new(Activities::DealId).big_integer().null())
                    .col(ColumnDef::new(Activities::UserId).big_integer().not_null())
                    .col(created)
                    .col(updated)
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_contact_id")
                            .from(Activities::Table, Activities::ContactId)
                            .to(Contacts::Table, Contacts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_deal_id")
                            .from(Activities::Table, Activities::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_user_id")
                            .from(Activities::Table, Activities::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activities::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deals::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contacts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
