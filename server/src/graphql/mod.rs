use async_graphql::{Context, EmptySubscription, ErrorExtensions, Json, Object, Schema};
use platform_api::ApiError;
use platform_authz::Subject;
use products_hr::{
    DecisionOutcome, DecisionRequest, HrError, HrModule, NotificationFilter, OnboardingPayload,
    Page,
};
use tracing::instrument;
use uuid::Uuid;

pub mod nodes;

use nodes::{
    AccountNode, AccountRole, DecideNotificationInput, DecisionPayload, EmployeeNode, MePayload,
    NotificationKind, NotificationNode, NotificationScopeInput, NotificationStatus,
    PendingRegistrationNode, SubmissionPayload,
};

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(hr: HrModule) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(hr)
        .finish()
}

/// SDL snapshot; resolvers are not executed so no data is attached.
pub fn schema_sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

#[derive(Default)]
pub struct QueryRoot;

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl QueryRoot {
    async fn hr(&self) -> HrQuery {
        HrQuery
    }
}

#[Object]
impl MutationRoot {
    async fn hr(&self) -> HrMutation {
        HrMutation
    }
}

#[derive(Default)]
pub struct HrQuery;

#[derive(Default)]
pub struct HrMutation;

#[Object]
impl HrQuery {
    #[instrument(name = "graphql.hr.me", skip_all)]
    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<MePayload> {
        let subject = viewer(ctx)?;
        let hr = module(ctx)?;
        let account = platform_db::find_account(hr.db(), subject.account_id)
            .await
            .map_err(HrError::from)
            .map_err(hr_error)?
            .ok_or_else(|| ApiError::Unauthorized.extend())?;
        let status = hr.registration_status(&subject).await.map_err(hr_error)?;
        Ok(MePayload {
            account: account.into(),
            pending: status.pending.map(Into::into),
            employee: status.employee.map(Into::into),
        })
    }

    #[allow(clippy::too_many_arguments)]
    #[instrument(name = "graphql.hr.notifications", skip_all)]
    async fn notifications(
        &self,
        ctx: &Context<'_>,
        status: Option<NotificationStatus>,
        #[graphql(name = "type")] kind: Option<NotificationKind>,
        read: Option<bool>,
        scope: Option<NotificationScopeInput>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> async_graphql::Result<Vec<NotificationNode>> {
        let subject = viewer(ctx)?;
        let filter = NotificationFilter {
            status: status.map(Into::into),
            kind: kind.map(Into::into),
            read,
            scope: scope.unwrap_or_default().into(),
        };
        let rows = module(ctx)?
            .notifications(&subject, filter, page(first, offset))
            .await
            .map_err(hr_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(name = "graphql.hr.pending_registration", skip_all)]
    async fn pending_registration(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
    ) -> async_graphql::Result<PendingRegistrationNode> {
        let subject = viewer(ctx)?;
        let model = module(ctx)?
            .pending_registration(&subject, id)
            .await
            .map_err(hr_error)?;
        Ok(model.into())
    }

    #[instrument(name = "graphql.hr.pending_registrations", skip_all)]
    async fn pending_registrations(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> async_graphql::Result<Vec<PendingRegistrationNode>> {
        let subject = viewer(ctx)?;
        let rows = module(ctx)?
            .pending_registrations(&subject, page(first, offset))
            .await
            .map_err(hr_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(name = "graphql.hr.employee", skip_all)]
    async fn employee(
        &self,
        ctx: &Context<'_>,
        identifier: String,
    ) -> async_graphql::Result<EmployeeNode> {
        let subject = viewer(ctx)?;
        let model = module(ctx)?
            .find_employee(&subject, &identifier)
            .await
            .map_err(hr_error)?;
        Ok(model.into())
    }

    #[instrument(name = "graphql.hr.employees", skip_all)]
    async fn employees(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> async_graphql::Result<Vec<EmployeeNode>> {
        let subject = viewer(ctx)?;
        let rows = module(ctx)?
            .employees(&subject, page(first, offset))
            .await
            .map_err(hr_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[Object]
impl HrMutation {
    #[instrument(name = "graphql.hr.submit_registration", skip_all)]
    async fn submit_registration(
        &self,
        ctx: &Context<'_>,
        payload: Json<OnboardingPayload>,
    ) -> async_graphql::Result<SubmissionPayload> {
        let subject = viewer(ctx)?;
        let submission = module(ctx)?
            .submit_registration(&subject, payload.0)
            .await
            .map_err(hr_error)?;
        Ok(SubmissionPayload {
            message: submission.message,
            pending_employee: submission.pending_employee.into(),
            pending_approval: submission.pending_approval,
            upload_stats: submission.upload_stats.into(),
        })
    }

    #[instrument(name = "graphql.hr.decide_notification", skip_all)]
    async fn decide_notification(
        &self,
        ctx: &Context<'_>,
        input: DecideNotificationInput,
    ) -> async_graphql::Result<DecisionPayload> {
        let subject = viewer(ctx)?;
        let request = DecisionRequest {
            notification_id: input.notification_id,
            action: input.action.into(),
            read: input.read,
            reason: input.reason,
        };
        let outcome = module(ctx)?
            .decide(&subject, request)
            .await
            .map_err(hr_error)?;
        Ok(match outcome {
            DecisionOutcome::Approved {
                notification,
                employee,
            } => DecisionPayload {
                message: "Registration request approved".into(),
                notification: Some(notification.into()),
                employee: employee.map(Into::into),
            },
            DecisionOutcome::Rejected { message } => DecisionPayload {
                message,
                notification: None,
                employee: None,
            },
        })
    }

    #[instrument(name = "graphql.hr.mark_notification_read", skip_all)]
    async fn mark_notification_read(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        #[graphql(default = true)] read: bool,
    ) -> async_graphql::Result<NotificationNode> {
        let subject = viewer(ctx)?;
        let model = module(ctx)?
            .mark_notification_read(&subject, id, read)
            .await
            .map_err(hr_error)?;
        Ok(model.into())
    }

    #[instrument(name = "graphql.hr.change_role", skip_all)]
    async fn change_role(
        &self,
        ctx: &Context<'_>,
        account_id: Uuid,
        role: AccountRole,
    ) -> async_graphql::Result<AccountNode> {
        let subject = viewer(ctx)?;
        let model = module(ctx)?
            .change_role(&subject, account_id, role.into())
            .await
            .map_err(hr_error)?;
        Ok(model.into())
    }
}

fn viewer(ctx: &Context<'_>) -> async_graphql::Result<Subject> {
    ctx.data::<Subject>()
        .copied()
        .map_err(|_| ApiError::Unauthorized.extend())
}

fn module<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a HrModule> {
    ctx.data::<HrModule>()
        .map_err(|_| platform_api::internal_error(anyhow::anyhow!("HR module not configured")))
}

fn hr_error(err: HrError) -> async_graphql::Error {
    ApiError::from(err).extend()
}

fn page(first: Option<i32>, offset: Option<i32>) -> Page {
    Page::new(first.map(i64::from), offset.map(i64::from))
}
