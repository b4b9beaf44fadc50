//! Authorization primitives for the HR module.

use entity::accounts::Role;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("{action} requires one of the roles {allowed}")]
    Denied {
        action: &'static str,
        allowed: String,
    },
}

/// The authenticated caller as seen by the workflow: account id plus the role
/// loaded for this request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub account_id: Uuid,
    pub role: Role,
}

impl Subject {
    pub fn new(account_id: Uuid, role: Role) -> Self {
        Self { account_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    SubmitRegistration,
    DecideNotification,
    ViewPendingRegistrations,
    ViewAllNotifications,
    ViewEmployees,
    ChangeRole,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::SubmitRegistration => "submit registration",
            Action::DecideNotification => "decide notification",
            Action::ViewPendingRegistrations => "view pending registrations",
            Action::ViewAllNotifications => "view all notifications",
            Action::ViewEmployees => "view employees",
            Action::ChangeRole => "change role",
        }
    }

    /// Roles allowed to perform the action.
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            // Admins administer the queue; they cannot enter it themselves.
            Action::SubmitRegistration => &[Role::User, Role::Pending, Role::Employee],
            Action::DecideNotification
            | Action::ViewPendingRegistrations
            | Action::ViewAllNotifications
            | Action::ChangeRole => &[Role::Admin],
            Action::ViewEmployees => &[Role::Employee, Role::Admin],
        }
    }
}

#[derive(Default, Debug)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn check(&self, subject: &Subject, action: Action) -> Result<(), AuthzError> {
        let allowed = action.allowed_roles();
        if allowed.contains(&subject.role) {
            Ok(())
        } else {
            Err(AuthzError::Denied {
                action: action.as_str(),
                allowed: allowed
                    .iter()
                    .map(|role| role.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(role: Role) -> Subject {
        Subject::new(Uuid::new_v4(), role)
    }

    #[test]
    fn only_admins_decide() {
        let engine = PolicyEngine;
        assert!(engine
            .check(&subject(Role::Admin), Action::DecideNotification)
            .is_ok());
        for role in [Role::User, Role::Pending, Role::Employee] {
            assert!(engine
                .check(&subject(role), Action::DecideNotification)
                .is_err());
        }
    }

    #[test]
    fn admins_cannot_submit_registrations() {
        let err = PolicyEngine
            .check(&subject(Role::Admin), Action::SubmitRegistration)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "submit registration requires one of the roles USER, PENDING, EMPLOYEE"
        );
    }

    #[test]
    fn staff_can_view_employees() {
        let engine = PolicyEngine;
        assert!(engine.check(&subject(Role::Employee), Action::ViewEmployees).is_ok());
        assert!(engine.check(&subject(Role::User), Action::ViewEmployees).is_err());
    }
}
