use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "notifications")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub status: Option<Status>,
    #[sea_orm(indexed)]
    pub source_id: Option<Uuid>,
    #[sea_orm(indexed)]
    pub target_id: Uuid,
    pub read: bool,
    pub message: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::TargetId",
        to = "super::accounts::Column::Id",
        on_delete = "Cascade"
    )]
    Target,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Target.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    /// Admin work item: approve or reject a pending registration.
    #[sea_orm(string_value = "EMPLOYEE_REQUEST")]
    EmployeeRequest,
    #[sea_orm(string_value = "REQUEST_APPROVED")]
    RequestApproved,
    #[sea_orm(string_value = "REQUEST_REJECTED")]
    RequestRejected,
}

/// Work-item status. Informational notifications carry no status.
#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::EmployeeRequest => "EMPLOYEE_REQUEST",
            Kind::RequestApproved => "REQUEST_APPROVED",
            Kind::RequestRejected => "REQUEST_REJECTED",
        }
    }
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Approved => "APPROVED",
        }
    }
}
