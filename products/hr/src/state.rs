//! Account workflow state machine.
//!
//! The account role doubles as the onboarding state. Every role change made
//! by this crate goes through [`transition`], and is persisted with a
//! compare-and-swap on the previous role so a concurrent writer cannot be
//! silently overwritten.

use entity::accounts::Role;
use sea_orm::ConnectionTrait;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{HrError, HrResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// Onboarding data submitted for review.
    Submit,
    /// An admin accepted the pending registration.
    Approve,
    /// An admin turned the pending registration down.
    Reject,
    /// An admin granted administrator rights.
    Promote,
    /// An admin revoked administrator rights.
    Demote,
}

impl WorkflowEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowEvent::Submit => "submit",
            WorkflowEvent::Approve => "approve",
            WorkflowEvent::Reject => "reject",
            WorkflowEvent::Promote => "promote",
            WorkflowEvent::Demote => "demote",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot {} an account in role {}", .event.as_str(), .from.as_str())]
pub struct TransitionError {
    pub from: Role,
    pub event: WorkflowEvent,
}

pub fn transition(from: Role, event: WorkflowEvent) -> Result<Role, TransitionError> {
    match (from, event) {
        (Role::User, WorkflowEvent::Submit) => Ok(Role::Pending),
        (Role::Pending, WorkflowEvent::Approve) => Ok(Role::Employee),
        (Role::Pending, WorkflowEvent::Reject) => Ok(Role::User),
        (Role::User, WorkflowEvent::Promote) => Ok(Role::Admin),
        (Role::Admin, WorkflowEvent::Demote) => Ok(Role::User),
        _ => Err(TransitionError { from, event }),
    }
}

/// Applies `event` to the account's current role and persists the result.
pub(crate) async fn apply<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
    event: WorkflowEvent,
) -> HrResult<Role> {
    let account = platform_db::find_account(conn, account_id)
        .await?
        .ok_or(HrError::NotFound("account"))?;
    let next = transition(account.role, event)?;
    if !platform_db::update_role(conn, account_id, account.role, next).await? {
        return Err(HrError::conflict(
            "account role changed concurrently; retry the request",
            None,
        ));
    }
    tracing::info!(
        %account_id,
        from = account.role.as_str(),
        to = next.as_str(),
        event = event.as_str(),
        "account role transitioned"
    );
    Ok(next)
}
