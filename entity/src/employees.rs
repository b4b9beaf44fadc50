use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Confirmed staff member. The primary key is the originating account id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "employees")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    #[serde(rename = "employeeId")]
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: String,
    pub date_of_birth: Date,
    pub gender: String,
    pub marital_status: String,
    pub nationality: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    #[sea_orm(unique)]
    pub work_email: Option<String>,
    pub department: String,
    pub designation: String,
    pub employment_type: String,
    pub joining_date: Date,
    pub reporting_manager: String,
    pub work_location: String,
    pub profile_image_url: String,
    pub documents: Json,
    pub linkedin_url: String,
    pub github_url: String,
    pub portfolio_url: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::Id",
        to = "super::accounts::Column::Id"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
