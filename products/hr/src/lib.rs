//! HR module: employee onboarding and the admin approval workflow.
//!
//! An account submits onboarding data, which is parked as a pending
//! registration and announced to every admin through a notification. An admin
//! decision either promotes the pending record into an employee or discards
//! it. Every write path runs inside a single database transaction.

use std::sync::Arc;

use platform_db::DbPool;
use serde::Deserialize;

pub mod accounts;
pub mod blob;
pub mod decision;
pub mod employees;
pub mod error;
pub mod notifications;
pub mod payload;
pub mod registration;
pub mod state;

pub use blob::{BlobError, BlobStore, LocalBlobStore};
pub use decision::{DecisionAction, DecisionOutcome, DecisionRequest};
pub use employees::EmployeeLookup;
pub use error::{HrError, HrResult};
pub use notifications::{NotificationFilter, NotificationScope};
pub use payload::{DocumentUpload, Onboarding, OnboardingPayload};
pub use registration::{RegistrationStatus, Submission, UploadStats};
pub use state::{TransitionError, WorkflowEvent, transition};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

/// `first`/`offset` paging as accepted by the list endpoints.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Page {
    pub first: Option<i64>,
    pub offset: Option<i64>,
}

impl Page {
    pub fn new(first: Option<i64>, offset: Option<i64>) -> Self {
        Self { first, offset }
    }

    pub fn limit(&self) -> u64 {
        self.first
            .map(|n| n.clamp(1, MAX_PAGE_SIZE as i64) as u64)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0).max(0) as u64
    }
}

/// Entry point for the HR workflow. Cheap to clone; handlers hold one in
/// their shared state.
#[derive(Clone)]
pub struct HrModule {
    db: DbPool,
    blobs: Arc<dyn BlobStore>,
}

impl HrModule {
    pub fn new(db: DbPool, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }

    pub fn db(&self) -> &DbPool {
        &self.db
    }
}
