use sea_orm_migration::prelude::*;

use crate::m20240101_000001_identity::Accounts;

#[derive(DeriveIden)]
enum PendingRegistrations {
    Table,
    Id,
    AccountId,
    EmployeeCode,
    FirstName,
    LastName,
    Email,
    Phone,
    DateOfBirth,
    Gender,
    MaritalStatus,
    Nationality,
    Address,
    City,
    Country,
    EmergencyContactName,
    EmergencyContactPhone,
    WorkEmail,
    Department,
    Designation,
    EmploymentType,
    JoiningDate,
    ReportingManager,
    WorkLocation,
    ProfileImageUrl,
    Documents,
    LinkedinUrl,
    GithubUrl,
    PortfolioUrl,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    EmployeeCode,
    FirstName,
    LastName,
    Email,
    Phone,
    DateOfBirth,
    Gender,
    MaritalStatus,
    Nationality,
    Address,
    City,
    Country,
    EmergencyContactName,
    EmergencyContactPhone,
    WorkEmail,
    Department,
    Designation,
    EmploymentType,
    JoiningDate,
    ReportingManager,
    WorkLocation,
    ProfileImageUrl,
    Documents,
    LinkedinUrl,
    GithubUrl,
    PortfolioUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    Kind,
    Status,
    SourceId,
    TargetId,
    Read,
    Message,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PendingRegistrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingRegistrations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::AccountId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::EmployeeCode)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::FirstName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::LastName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::Email)
                            .string_len(320)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingRegistrations::Phone).string_len(64))
                    .col(ColumnDef::new(PendingRegistrations::DateOfBirth).date())
                    .col(ColumnDef::new(PendingRegistrations::Gender).string_len(32))
                    .col(ColumnDef::new(PendingRegistrations::MaritalStatus).string_len(32))
                    .col(ColumnDef::new(PendingRegistrations::Nationality).string_len(64))
                    .col(ColumnDef::new(PendingRegistrations::Address).text())
                    .col(ColumnDef::new(PendingRegistrations::City).string_len(128))
                    .col(ColumnDef::new(PendingRegistrations::Country).string_len(128))
                    .col(ColumnDef::new(PendingRegistrations::EmergencyContactName).string_len(128))
                    .col(ColumnDef::new(PendingRegistrations::EmergencyContactPhone).string_len(64))
                    .col(ColumnDef::new(PendingRegistrations::WorkEmail).string_len(320))
                    .col(ColumnDef::new(PendingRegistrations::Department).string_len(128))
                    .col(ColumnDef::new(PendingRegistrations::Designation).string_len(128))
                    .col(ColumnDef::new(PendingRegistrations::EmploymentType).string_len(64))
                    .col(ColumnDef::new(PendingRegistrations::JoiningDate).date())
                    .col(ColumnDef::new(PendingRegistrations::ReportingManager).string_len(128))
                    .col(ColumnDef::new(PendingRegistrations::WorkLocation).string_len(128))
                    .col(ColumnDef::new(PendingRegistrations::ProfileImageUrl).string_len(1024))
                    .col(ColumnDef::new(PendingRegistrations::Documents).json().not_null())
                    .col(ColumnDef::new(PendingRegistrations::LinkedinUrl).string_len(512))
                    .col(ColumnDef::new(PendingRegistrations::GithubUrl).string_len(512))
                    .col(ColumnDef::new(PendingRegistrations::PortfolioUrl).string_len(512))
                    .col(
                        ColumnDef::new(PendingRegistrations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pending_registrations_account")
                            .from(PendingRegistrations::Table, PendingRegistrations::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Employees::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Employees::EmployeeCode)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Employees::FirstName).string_len(128).not_null())
                    .col(ColumnDef::new(Employees::LastName).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Employees::Email)
                            .string_len(320)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Employees::Phone).string_len(64).not_null())
                    .col(ColumnDef::new(Employees::DateOfBirth).date().not_null())
                    .col(ColumnDef::new(Employees::Gender).string_len(32).not_null())
                    .col(ColumnDef::new(Employees::MaritalStatus).string_len(32).not_null())
                    .col(ColumnDef::new(Employees::Nationality).string_len(64).not_null())
                    .col(ColumnDef::new(Employees::Address).text().not_null())
                    .col(ColumnDef::new(Employees::City).string_len(128).not_null())
                    .col(ColumnDef::new(Employees::Country).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Employees::EmergencyContactName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Employees::EmergencyContactPhone)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Employees::WorkEmail)
                            .string_len(320)
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Employees::Department).string_len(128).not_null())
                    .col(ColumnDef::new(Employees::Designation).string_len(128).not_null())
                    .col(ColumnDef::new(Employees::EmploymentType).string_len(64).not_null())
                    .col(ColumnDef::new(Employees::JoiningDate).date().not_null())
                    .col(
                        ColumnDef::new(Employees::ReportingManager)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Employees::WorkLocation).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Employees::ProfileImageUrl)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Employees::Documents).json().not_null())
                    .col(ColumnDef::new(Employees::LinkedinUrl).string_len(512).not_null())
                    .col(ColumnDef::new(Employees::GithubUrl).string_len(512).not_null())
                    .col(ColumnDef::new(Employees::PortfolioUrl).string_len(512).not_null())
                    .col(
                        ColumnDef::new(Employees::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Employees::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_account")
                            .from(Employees::Table, Employees::Id)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(Notifications::Status).string_len(16))
                    .col(ColumnDef::new(Notifications::SourceId).uuid())
                    .col(ColumnDef::new(Notifications::TargetId).uuid().not_null())
                    .col(
                        ColumnDef::new(Notifications::Read)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_target")
                            .from(Notifications::Table, Notifications::TargetId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_target_created")
                    .table(Notifications::Table)
                    .col(Notifications::TargetId)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_source")
                    .table(Notifications::Table)
                    .col(Notifications::SourceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employees::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(PendingRegistrations::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}
