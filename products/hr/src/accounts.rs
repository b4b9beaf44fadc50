//! Administrative role management.

use entity::accounts::{self, Role};
use platform_authz::{Action, PolicyEngine, Subject};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::HrModule;
use crate::error::{HrError, HrResult};
use crate::state::{self, WorkflowEvent};

impl HrModule {
    /// Grants or revokes administrator rights. Onboarding roles (`PENDING`,
    /// `EMPLOYEE`) are only reachable through the registration workflow.
    #[tracing::instrument(
        name = "hr.account.change_role",
        skip_all,
        fields(admin_id = %subject.account_id, %account_id, role = role.as_str())
    )]
    pub async fn change_role(
        &self,
        subject: &Subject,
        account_id: Uuid,
        role: Role,
    ) -> HrResult<accounts::Model> {
        PolicyEngine.check(subject, Action::ChangeRole)?;

        let txn = self.db.begin().await?;
        let account = platform_db::find_account(&txn, account_id)
            .await?
            .ok_or(HrError::NotFound("account"))?;
        if account.role == role {
            return Ok(account);
        }
        let event = match role {
            Role::Admin => WorkflowEvent::Promote,
            Role::User => WorkflowEvent::Demote,
            Role::Pending | Role::Employee => {
                return Err(HrError::invalid(
                    "role can only be switched between USER and ADMIN",
                    "role",
                ));
            }
        };
        if event == WorkflowEvent::Demote && platform_db::admin_count(&txn).await? <= 1 {
            return Err(HrError::conflict("cannot demote the last admin", Some("role")));
        }

        state::apply(&txn, account_id, event).await?;
        let updated = platform_db::find_account(&txn, account_id)
            .await?
            .ok_or(HrError::NotFound("account"))?;
        txn.commit().await?;
        Ok(updated)
    }
}
