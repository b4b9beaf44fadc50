use async_graphql::{Enum, InputObject, Json, SimpleObject};
use chrono::{DateTime, FixedOffset, NaiveDate};
use entity::{accounts, employees, notifications, pending_registrations};
use products_hr::{DecisionAction, NotificationScope, UploadStats};
use uuid::Uuid;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum AccountRole {
    User,
    Pending,
    Employee,
    Admin,
}

impl From<accounts::Role> for AccountRole {
    fn from(value: accounts::Role) -> Self {
        match value {
            accounts::Role::User => AccountRole::User,
            accounts::Role::Pending => AccountRole::Pending,
            accounts::Role::Employee => AccountRole::Employee,
            accounts::Role::Admin => AccountRole::Admin,
        }
    }
}

impl From<AccountRole> for accounts::Role {
    fn from(value: AccountRole) -> Self {
        match value {
            AccountRole::User => accounts::Role::User,
            AccountRole::Pending => accounts::Role::Pending,
            AccountRole::Employee => accounts::Role::Employee,
            AccountRole::Admin => accounts::Role::Admin,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum NotificationKind {
    EmployeeRequest,
    RequestApproved,
    RequestRejected,
}

impl From<notifications::Kind> for NotificationKind {
    fn from(value: notifications::Kind) -> Self {
        match value {
            notifications::Kind::EmployeeRequest => NotificationKind::EmployeeRequest,
            notifications::Kind::RequestApproved => NotificationKind::RequestApproved,
            notifications::Kind::RequestRejected => NotificationKind::RequestRejected,
        }
    }
}

impl From<NotificationKind> for notifications::Kind {
    fn from(value: NotificationKind) -> Self {
        match value {
            NotificationKind::EmployeeRequest => notifications::Kind::EmployeeRequest,
            NotificationKind::RequestApproved => notifications::Kind::RequestApproved,
            NotificationKind::RequestRejected => notifications::Kind::RequestRejected,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum NotificationStatus {
    Pending,
    Approved,
}

impl From<notifications::Status> for NotificationStatus {
    fn from(value: notifications::Status) -> Self {
        match value {
            notifications::Status::Pending => NotificationStatus::Pending,
            notifications::Status::Approved => NotificationStatus::Approved,
        }
    }
}

impl From<NotificationStatus> for notifications::Status {
    fn from(value: NotificationStatus) -> Self {
        match value {
            NotificationStatus::Pending => notifications::Status::Pending,
            NotificationStatus::Approved => notifications::Status::Approved,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Default, Eq, PartialEq)]
#[graphql(name = "NotificationScope")]
pub enum NotificationScopeInput {
    #[default]
    Mine,
    All,
}

impl From<NotificationScopeInput> for NotificationScope {
    fn from(value: NotificationScopeInput) -> Self {
        match value {
            NotificationScopeInput::Mine => NotificationScope::Mine,
            NotificationScopeInput::All => NotificationScope::All,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "DecisionAction")]
pub enum DecisionActionInput {
    Approve,
    Reject,
}

impl From<DecisionActionInput> for DecisionAction {
    fn from(value: DecisionActionInput) -> Self {
        match value {
            DecisionActionInput::Approve => DecisionAction::Approve,
            DecisionActionInput::Reject => DecisionAction::Reject,
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct DecideNotificationInput {
    pub notification_id: Uuid,
    pub action: DecisionActionInput,
    pub read: Option<bool>,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct AccountNode {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: AccountRole,
    pub created_at: DateTime<FixedOffset>,
}

impl From<accounts::Model> for AccountNode {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            role: model.role.into(),
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct NotificationNode {
    pub id: Uuid,
    #[graphql(name = "type")]
    pub kind: NotificationKind,
    pub status: Option<NotificationStatus>,
    pub source_id: Option<Uuid>,
    pub target_id: Uuid,
    pub read: bool,
    pub message: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<notifications::Model> for NotificationNode {
    fn from(model: notifications::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind.into(),
            status: model.status.map(Into::into),
            source_id: model.source_id,
            target_id: model.target_id,
            read: model.read,
            message: model.message,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct PendingRegistrationNode {
    pub id: Uuid,
    pub account_id: Uuid,
    #[graphql(name = "employeeId")]
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub work_email: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employment_type: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub reporting_manager: Option<String>,
    pub work_location: Option<String>,
    pub profile_image_url: Option<String>,
    pub documents: Json<serde_json::Value>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<pending_registrations::Model> for PendingRegistrationNode {
    fn from(model: pending_registrations::Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            employee_code: model.employee_code,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            date_of_birth: model.date_of_birth,
            gender: model.gender,
            marital_status: model.marital_status,
            nationality: model.nationality,
            address: model.address,
            city: model.city,
            country: model.country,
            emergency_contact_name: model.emergency_contact_name,
            emergency_contact_phone: model.emergency_contact_phone,
            work_email: model.work_email,
            department: model.department,
            designation: model.designation,
            employment_type: model.employment_type,
            joining_date: model.joining_date,
            reporting_manager: model.reporting_manager,
            work_location: model.work_location,
            profile_image_url: model.profile_image_url,
            documents: Json(model.documents),
            linkedin_url: model.linkedin_url,
            github_url: model.github_url,
            portfolio_url: model.portfolio_url,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct EmployeeNode {
    pub id: Uuid,
    #[graphql(name = "employeeId")]
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub marital_status: String,
    pub nationality: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub work_email: Option<String>,
    pub department: String,
    pub designation: String,
    pub employment_type: String,
    pub joining_date: NaiveDate,
    pub reporting_manager: String,
    pub work_location: String,
    pub profile_image_url: String,
    pub documents: Json<serde_json::Value>,
    pub linkedin_url: String,
    pub github_url: String,
    pub portfolio_url: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<employees::Model> for EmployeeNode {
    fn from(model: employees::Model) -> Self {
        Self {
            id: model.id,
            employee_code: model.employee_code,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            date_of_birth: model.date_of_birth,
            gender: model.gender,
            marital_status: model.marital_status,
            nationality: model.nationality,
            address: model.address,
            city: model.city,
            country: model.country,
            emergency_contact_name: model.emergency_contact_name,
            emergency_contact_phone: model.emergency_contact_phone,
            work_email: model.work_email,
            department: model.department,
            designation: model.designation,
            employment_type: model.employment_type,
            joining_date: model.joining_date,
            reporting_manager: model.reporting_manager,
            work_location: model.work_location,
            profile_image_url: model.profile_image_url,
            documents: Json(model.documents),
            linkedin_url: model.linkedin_url,
            github_url: model.github_url,
            portfolio_url: model.portfolio_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct MePayload {
    pub account: AccountNode,
    pub pending: Option<PendingRegistrationNode>,
    pub employee: Option<EmployeeNode>,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "UploadStats")]
pub struct UploadStatsNode {
    pub total: i32,
    pub successful: i32,
    pub failed: Vec<String>,
}

impl From<UploadStats> for UploadStatsNode {
    fn from(stats: UploadStats) -> Self {
        Self {
            total: i32::try_from(stats.total).unwrap_or(i32::MAX),
            successful: i32::try_from(stats.successful).unwrap_or(i32::MAX),
            failed: stats.failed,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct SubmissionPayload {
    pub message: String,
    pub pending_employee: PendingRegistrationNode,
    pub pending_approval: bool,
    pub upload_stats: UploadStatsNode,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DecisionPayload {
    pub message: String,
    /// Updated notification; absent after a rejection deleted it.
    pub notification: Option<NotificationNode>,
    /// Employee created by this approval, if any.
    pub employee: Option<EmployeeNode>,
}
