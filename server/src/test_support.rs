use std::sync::Arc;

use entity::accounts::Role;
use migration::{Migrator, MigratorTrait};
use platform_authz::Subject;
use platform_db::{DatabaseSettings, NewAccount};
use products_hr::{HrModule, LocalBlobStore};
use uuid::Uuid;

pub async fn hr_module() -> HrModule {
    let pool = platform_db::connect(&DatabaseSettings::with_url("sqlite::memory:"))
        .await
        .unwrap();
    Migrator::up(&pool, None).await.unwrap();
    let root = std::env::temp_dir().join(format!("hr-server-test-{}", Uuid::new_v4()));
    HrModule::new(pool, Arc::new(LocalBlobStore::new(root, "/uploads")))
}

/// Inserts an account with `role` directly, bypassing the workflow.
pub async fn account(hr: &HrModule, email: &str, role: Role) -> Subject {
    let account = platform_db::create_account(
        hr.db(),
        NewAccount {
            email: email.into(),
            display_name: email.into(),
            password_hash: platform_authn::hash_password("correct horse").unwrap(),
        },
        role,
    )
    .await
    .unwrap();
    Subject::new(account.id, account.role)
}
