//! Notification queue: admin work items and requester-facing outcomes.

use chrono::Utc;
use entity::notifications::{self, Kind, Status};
use platform_authz::{Action, PolicyEngine, Subject};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{HrError, HrResult};
use crate::{HrModule, Page};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationScope {
    /// Notifications addressed to the caller.
    #[default]
    Mine,
    /// Every notification in the system (admins only).
    All,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    pub status: Option<Status>,
    #[serde(rename = "type")]
    pub kind: Option<Kind>,
    pub read: Option<bool>,
    #[serde(default)]
    pub scope: NotificationScope,
}

impl HrModule {
    pub async fn notifications(
        &self,
        subject: &Subject,
        filter: NotificationFilter,
        page: Page,
    ) -> HrResult<Vec<notifications::Model>> {
        let mut query = notifications::Entity::find();
        match filter.scope {
            NotificationScope::Mine => {
                query = query.filter(notifications::Column::TargetId.eq(subject.account_id));
            }
            NotificationScope::All => {
                PolicyEngine.check(subject, Action::ViewAllNotifications)?;
            }
        }
        if let Some(status) = filter.status {
            query = query.filter(notifications::Column::Status.eq(status));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(notifications::Column::Kind.eq(kind));
        }
        if let Some(read) = filter.read {
            query = query.filter(notifications::Column::Read.eq(read));
        }
        let rows = query
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_asc(notifications::Column::Id)
            .limit(page.limit())
            .offset(page.offset())
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Flags a notification read or unread. Only its target may do so.
    pub async fn mark_notification_read(
        &self,
        subject: &Subject,
        notification_id: Uuid,
        read: bool,
    ) -> HrResult<notifications::Model> {
        let model = notifications::Entity::find_by_id(notification_id)
            .one(&self.db)
            .await?
            .filter(|n| n.target_id == subject.account_id)
            .ok_or(HrError::NotFound("notification"))?;
        if model.read == read {
            return Ok(model);
        }
        let mut active: notifications::ActiveModel = model.into();
        active.read = Set(read);
        active.updated_at = Set(Utc::now().fixed_offset());
        Ok(active.update(&self.db).await?)
    }
}

/// One `EMPLOYEE_REQUEST` work item per admin for a fresh submission.
pub(crate) async fn fan_out_to_admins<C: ConnectionTrait>(
    conn: &C,
    pending_id: Uuid,
    requester_name: &str,
    employee_code: &str,
) -> HrResult<Vec<notifications::Model>> {
    let admins = platform_db::admin_accounts(conn).await?;
    let message = format!("{requester_name} ({employee_code}) requested employee registration");
    let mut created = Vec::with_capacity(admins.len());
    for admin in admins {
        let model = insert(
            conn,
            Kind::EmployeeRequest,
            Some(Status::Pending),
            Some(pending_id),
            admin.id,
            message.clone(),
        )
        .await?;
        created.push(model);
    }
    Ok(created)
}

/// Informs the requester about the outcome of their registration.
pub(crate) async fn notify_requester<C: ConnectionTrait>(
    conn: &C,
    kind: Kind,
    requester_id: Uuid,
    message: String,
) -> HrResult<notifications::Model> {
    insert(conn, kind, None, None, requester_id, message).await
}

async fn insert<C: ConnectionTrait>(
    conn: &C,
    kind: Kind,
    status: Option<Status>,
    source_id: Option<Uuid>,
    target_id: Uuid,
    message: String,
) -> HrResult<notifications::Model> {
    let now = Utc::now().fixed_offset();
    let model = notifications::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(kind),
        status: Set(status),
        source_id: Set(source_id),
        target_id: Set(target_id),
        read: Set(false),
        message: Set(message),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(model)
}
