//! Admin decisions on registration requests.
//!
//! The pending record is claimed by deleting it and checking the affected row
//! count inside the decision transaction, so two admins deciding the same
//! request concurrently cannot both materialise an employee.

use chrono::Utc;
use entity::notifications::{Kind, Status};
use entity::{employees, notifications, pending_registrations};
use platform_authz::{Action, PolicyEngine, Subject};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{HrError, HrResult};
use crate::state::{self, WorkflowEvent};
use crate::{HrModule, notifications as queue};

const MAX_REASON_LEN: usize = 1000;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Approve,
    Reject,
}

impl DecisionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionAction::Approve => "approve",
            DecisionAction::Reject => "reject",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub notification_id: Uuid,
    pub action: DecisionAction,
    #[serde(default)]
    pub read: Option<bool>,
    /// Shown to the requester when the request is rejected.
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Clone, Debug)]
pub enum DecisionOutcome {
    Approved {
        notification: notifications::Model,
        /// Present when this decision created the employee.
        employee: Option<employees::Model>,
    },
    Rejected {
        message: String,
    },
}

impl HrModule {
    #[tracing::instrument(
        name = "hr.notification.decide",
        skip_all,
        fields(
            admin_id = %subject.account_id,
            notification_id = %request.notification_id,
            action = request.action.as_str()
        )
    )]
    pub async fn decide(
        &self,
        subject: &Subject,
        request: DecisionRequest,
    ) -> HrResult<DecisionOutcome> {
        PolicyEngine.check(subject, Action::DecideNotification)?;
        let reason = reason(request.reason)?;

        let txn = self.db.begin().await?;
        let notification = notifications::Entity::find_by_id(request.notification_id)
            .one(&txn)
            .await?
            .ok_or(HrError::NotFound("notification"))?;

        let outcome = match request.action {
            DecisionAction::Approve => approve(&txn, notification, request.read).await?,
            DecisionAction::Reject => reject(&txn, notification, reason).await?,
        };
        txn.commit().await?;
        Ok(outcome)
    }
}

fn reason(raw: Option<String>) -> HrResult<Option<String>> {
    let reason = raw
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if reason
        .as_ref()
        .is_some_and(|r| r.chars().count() > MAX_REASON_LEN)
    {
        return Err(HrError::invalid(
            format!("reason must be at most {MAX_REASON_LEN} characters"),
            "reason",
        ));
    }
    Ok(reason)
}

async fn approve(
    txn: &DatabaseTransaction,
    notification: notifications::Model,
    read: Option<bool>,
) -> HrResult<DecisionOutcome> {
    let mut employee = None;
    if let Some(source_id) = request_source(&notification) {
        match claim_pending(txn, source_id).await? {
            Some(pending) => {
                let owner = pending.account_id;
                let code = pending.employee_code.clone();
                let created = employee_from_pending(pending, Utc::now())
                    .insert(txn)
                    .await?;
                state::apply(txn, owner, WorkflowEvent::Approve).await?;
                queue::notify_requester(
                    txn,
                    Kind::RequestApproved,
                    owner,
                    format!("Your registration as {code} has been approved"),
                )
                .await?;
                tracing::info!(employee_id = %created.id, employee_code = %code, "registration approved");
                employee = Some(created);
            }
            None => tracing::warn!(
                %source_id,
                "approving a request whose registration was already processed"
            ),
        }
    }

    let mut active: notifications::ActiveModel = notification.into();
    active.status = Set(Some(Status::Approved));
    if let Some(read) = read {
        active.read = Set(read);
    }
    active.updated_at = Set(Utc::now().fixed_offset());
    let notification = active.update(txn).await?;

    Ok(DecisionOutcome::Approved {
        notification,
        employee,
    })
}

async fn reject(
    txn: &DatabaseTransaction,
    notification: notifications::Model,
    reason: Option<String>,
) -> HrResult<DecisionOutcome> {
    notifications::Entity::delete_by_id(notification.id)
        .exec(txn)
        .await?;

    if let Some(source_id) = request_source(&notification) {
        match claim_pending(txn, source_id).await? {
            Some(pending) => {
                state::apply(txn, pending.account_id, WorkflowEvent::Reject).await?;
                let message = match &reason {
                    Some(reason) => format!("Your registration request was rejected: {reason}"),
                    None => "Your registration request was rejected".to_string(),
                };
                queue::notify_requester(txn, Kind::RequestRejected, pending.account_id, message)
                    .await?;
                tracing::info!(
                    account_id = %pending.account_id,
                    employee_code = %pending.employee_code,
                    "registration rejected"
                );
            }
            None => tracing::info!(%source_id, "registration already processed; notification removed"),
        }
    }

    Ok(DecisionOutcome::Rejected {
        message: "Registration request rejected".into(),
    })
}

fn request_source(notification: &notifications::Model) -> Option<Uuid> {
    match notification.kind {
        Kind::EmployeeRequest => notification.source_id,
        Kind::RequestApproved | Kind::RequestRejected => None,
    }
}

/// Deletes the pending record and returns it if this caller removed it.
async fn claim_pending<C: ConnectionTrait>(
    conn: &C,
    pending_id: Uuid,
) -> HrResult<Option<pending_registrations::Model>> {
    let Some(pending) = pending_registrations::Entity::find_by_id(pending_id)
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    let deleted = pending_registrations::Entity::delete_by_id(pending.id)
        .exec(conn)
        .await?;
    Ok((deleted.rows_affected == 1).then_some(pending))
}

/// Employee row for an approved registration. Missing text becomes `""` and
/// missing dates default to the approval day; `work_email` stays NULL so that
/// it does not collide on its unique index.
pub(crate) fn employee_from_pending(
    pending: pending_registrations::Model,
    approved_at: chrono::DateTime<Utc>,
) -> employees::ActiveModel {
    let today = approved_at.date_naive();
    let now = approved_at.fixed_offset();
    let text = Option::<String>::unwrap_or_default;
    employees::ActiveModel {
        id: Set(pending.account_id),
        employee_code: Set(pending.employee_code),
        first_name: Set(pending.first_name),
        last_name: Set(pending.last_name),
        email: Set(pending.email),
        phone: Set(text(pending.phone)),
        date_of_birth: Set(pending.date_of_birth.unwrap_or(today)),
        gender: Set(text(pending.gender)),
        marital_status: Set(text(pending.marital_status)),
        nationality: Set(text(pending.nationality)),
        address: Set(text(pending.address)),
        city: Set(text(pending.city)),
        country: Set(text(pending.country)),
        emergency_contact_name: Set(text(pending.emergency_contact_name)),
        emergency_contact_phone: Set(text(pending.emergency_contact_phone)),
        work_email: Set(pending.work_email),
        department: Set(text(pending.department)),
        designation: Set(text(pending.designation)),
        employment_type: Set(text(pending.employment_type)),
        joining_date: Set(pending.joining_date.unwrap_or(today)),
        reporting_manager: Set(text(pending.reporting_manager)),
        work_location: Set(text(pending.work_location)),
        profile_image_url: Set(text(pending.profile_image_url)),
        documents: Set(pending.documents),
        linkedin_url: Set(text(pending.linkedin_url)),
        github_url: Set(text(pending.github_url)),
        portfolio_url: Set(text(pending.portfolio_url)),
        created_at: Set(now),
        updated_at: Set(now),
    }
}
