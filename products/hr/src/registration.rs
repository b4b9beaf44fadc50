//! Onboarding submission and the read side of pending registrations.

use chrono::Utc;
use entity::accounts::Role;
use entity::{employees, pending_registrations};
use platform_authz::{Action, PolicyEngine, Subject};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{HrError, HrResult};
use crate::payload::{Onboarding, OnboardingPayload};
use crate::state::{self, WorkflowEvent};
use crate::{HrModule, Page, notifications};

const PROFILE_IMAGE_FOLDER: &str = "profile-images";
const DOCUMENT_FOLDER: &str = "documents";

/// Per-request upload tally. Failed items are named `profileImage` or
/// `documents.<name>`; they do not fail the submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UploadStats {
    pub total: usize,
    pub successful: usize,
    pub failed: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub message: String,
    pub pending_employee: pending_registrations::Model,
    pub pending_approval: bool,
    pub upload_stats: UploadStats,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatus {
    pub role: Role,
    pub pending: Option<pending_registrations::Model>,
    pub employee: Option<employees::Model>,
}

/// Blob URLs produced for one submission.
#[derive(Default)]
struct Uploaded {
    profile_image_url: Option<String>,
    documents: Map<String, Value>,
    /// URLs this request created, deleted again if the submission rolls back.
    created: Vec<String>,
    stats: UploadStats,
}

impl HrModule {
    #[tracing::instrument(
        name = "hr.registration.submit",
        skip_all,
        fields(account_id = %subject.account_id)
    )]
    pub async fn submit_registration(
        &self,
        subject: &Subject,
        payload: OnboardingPayload,
    ) -> HrResult<Submission> {
        PolicyEngine.check(subject, Action::SubmitRegistration)?;
        ensure_account_can_submit(&self.db, subject.account_id).await?;
        let mut onboarding = payload.normalize()?;
        ensure_fields_unclaimed(&self.db, &onboarding).await?;

        let uploaded = self.upload_attachments(&mut onboarding).await;
        let stats = uploaded.stats.clone();
        let created = uploaded.created.clone();

        match self.persist_submission(subject.account_id, onboarding, uploaded).await {
            Ok(pending) => {
                tracing::info!(
                    pending_id = %pending.id,
                    employee_code = %pending.employee_code,
                    uploads_failed = stats.failed.len(),
                    "registration submitted for approval"
                );
                Ok(Submission {
                    message: "Registration submitted; waiting for admin approval".into(),
                    pending_employee: pending,
                    pending_approval: true,
                    upload_stats: stats,
                })
            }
            Err(err) => {
                self.discard_uploads(&created).await;
                Err(err)
            }
        }
    }

    async fn upload_attachments(&self, onboarding: &mut Onboarding) -> Uploaded {
        let mut uploaded = Uploaded::default();

        if let Some(image) = onboarding.profile_image.take() {
            uploaded.stats.total += 1;
            match self.blobs.upload(&image, PROFILE_IMAGE_FOLDER).await {
                Ok(url) => {
                    if !crate::blob::is_hosted_url(&image) {
                        uploaded.created.push(url.clone());
                    }
                    uploaded.profile_image_url = Some(url);
                    uploaded.stats.successful += 1;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "profile image upload failed");
                    uploaded.stats.failed.push("profileImage".into());
                }
            }
        }

        for doc in std::mem::take(&mut onboarding.documents) {
            uploaded.stats.total += 1;
            match self.blobs.upload(&doc.data, DOCUMENT_FOLDER).await {
                Ok(url) => {
                    if !crate::blob::is_hosted_url(&doc.data) {
                        uploaded.created.push(url.clone());
                    }
                    uploaded.documents.insert(doc.name, Value::String(url));
                    uploaded.stats.successful += 1;
                }
                Err(err) => {
                    tracing::warn!(document = %doc.name, error = %err, "document upload failed");
                    uploaded.stats.failed.push(format!("documents.{}", doc.name));
                }
            }
        }

        uploaded
    }

    async fn persist_submission(
        &self,
        account_id: Uuid,
        onboarding: Onboarding,
        uploaded: Uploaded,
    ) -> HrResult<pending_registrations::Model> {
        let txn = self.db.begin().await?;
        ensure_account_can_submit(&txn, account_id).await?;
        ensure_fields_unclaimed(&txn, &onboarding).await?;

        let pending = pending_registrations::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account_id),
            employee_code: Set(onboarding.employee_code),
            first_name: Set(onboarding.first_name),
            last_name: Set(onboarding.last_name),
            email: Set(onboarding.email),
            phone: Set(onboarding.phone),
            date_of_birth: Set(onboarding.date_of_birth),
            gender: Set(onboarding.gender),
            marital_status: Set(onboarding.marital_status),
            nationality: Set(onboarding.nationality),
            address: Set(onboarding.address),
            city: Set(onboarding.city),
            country: Set(onboarding.country),
            emergency_contact_name: Set(onboarding.emergency_contact_name),
            emergency_contact_phone: Set(onboarding.emergency_contact_phone),
            work_email: Set(onboarding.work_email),
            department: Set(onboarding.department),
            designation: Set(onboarding.designation),
            employment_type: Set(onboarding.employment_type),
            joining_date: Set(onboarding.joining_date),
            reporting_manager: Set(onboarding.reporting_manager),
            work_location: Set(onboarding.work_location),
            profile_image_url: Set(uploaded.profile_image_url),
            documents: Set(Value::Object(uploaded.documents)),
            linkedin_url: Set(onboarding.linkedin_url),
            github_url: Set(onboarding.github_url),
            portfolio_url: Set(onboarding.portfolio_url),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await?;

        let requester = format!("{} {}", pending.first_name, pending.last_name);
        let fanned_out =
            notifications::fan_out_to_admins(&txn, pending.id, &requester, &pending.employee_code)
                .await?;
        if fanned_out.is_empty() {
            tracing::warn!(pending_id = %pending.id, "no admin accounts to notify");
        }
        state::apply(&txn, account_id, WorkflowEvent::Submit).await?;

        txn.commit().await?;
        Ok(pending)
    }

    async fn discard_uploads(&self, urls: &[String]) {
        for url in urls {
            if let Err(err) = self.blobs.delete(url).await {
                tracing::warn!(%url, error = %err, "failed to remove orphaned upload");
            }
        }
    }

    /// The caller's own onboarding state.
    pub async fn registration_status(&self, subject: &Subject) -> HrResult<RegistrationStatus> {
        let account = platform_db::find_account(&self.db, subject.account_id)
            .await?
            .ok_or(HrError::NotFound("account"))?;
        let pending = pending_registrations::Entity::find()
            .filter(pending_registrations::Column::AccountId.eq(account.id))
            .one(&self.db)
            .await?;
        let employee = employees::Entity::find_by_id(account.id)
            .one(&self.db)
            .await?;
        Ok(RegistrationStatus {
            role: account.role,
            pending,
            employee,
        })
    }

    pub async fn pending_registrations(
        &self,
        subject: &Subject,
        page: Page,
    ) -> HrResult<Vec<pending_registrations::Model>> {
        PolicyEngine.check(subject, Action::ViewPendingRegistrations)?;
        let rows = pending_registrations::Entity::find()
            .order_by_asc(pending_registrations::Column::CreatedAt)
            .order_by_asc(pending_registrations::Column::Id)
            .limit(page.limit())
            .offset(page.offset())
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn pending_registration(
        &self,
        subject: &Subject,
        id: Uuid,
    ) -> HrResult<pending_registrations::Model> {
        PolicyEngine.check(subject, Action::ViewPendingRegistrations)?;
        pending_registrations::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(HrError::NotFound("pending registration"))
    }
}

/// Account guards, checked before the payload is validated: no pending
/// request and no employee record for the account.
async fn ensure_account_can_submit<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
) -> HrResult<()> {
    let pending = pending_registrations::Entity::find()
        .filter(pending_registrations::Column::AccountId.eq(account_id))
        .one(conn)
        .await?;
    if pending.is_some() {
        return Err(HrError::conflict(
            "account already has a pending request",
            None,
        ));
    }
    if employees::Entity::find_by_id(account_id)
        .one(conn)
        .await?
        .is_some()
    {
        return Err(HrError::conflict(
            "employee record already exists for this account",
            None,
        ));
    }
    Ok(())
}

/// No employee already holds the same employee code, personal email or work
/// email. First failure wins.
async fn ensure_fields_unclaimed<C: ConnectionTrait>(
    conn: &C,
    onboarding: &Onboarding,
) -> HrResult<()> {
    if employee_with(conn, employees::Column::EmployeeCode, &onboarding.employee_code).await? {
        return Err(HrError::conflict(
            format!("employee ID {} is already in use", onboarding.employee_code),
            Some("employeeId"),
        ));
    }
    if employee_with(conn, employees::Column::Email, &onboarding.email).await? {
        return Err(HrError::conflict(
            format!("email {} is already registered", onboarding.email),
            Some("email"),
        ));
    }
    if let Some(work_email) = &onboarding.work_email {
        if employee_with(conn, employees::Column::WorkEmail, work_email).await? {
            return Err(HrError::conflict(
                format!("work email {work_email} is already registered"),
                Some("workEmail"),
            ));
        }
    }
    Ok(())
}

async fn employee_with<C: ConnectionTrait>(
    conn: &C,
    column: employees::Column,
    value: &str,
) -> HrResult<bool> {
    let found = employees::Entity::find()
        .filter(column.eq(value))
        .one(conn)
        .await?;
    Ok(found.is_some())
}
