//! Employee directory reads.

use entity::employees;
use platform_authz::{Action, PolicyEngine, Subject};
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::error::{HrError, HrResult};
use crate::{HrModule, Page};

/// Which rule of the identifier resolver produced a match. Rules are tried in
/// declaration order and the first hit wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmployeeLookup {
    Id,
    ExactCode,
    UpperCaseCode,
    LowerCaseCode,
    PartialCode,
    Email,
}

impl HrModule {
    pub async fn find_employee(
        &self,
        subject: &Subject,
        identifier: &str,
    ) -> HrResult<employees::Model> {
        PolicyEngine.check(subject, Action::ViewEmployees)?;
        let (rule, employee) = resolve_employee(&self.db, identifier)
            .await?
            .ok_or(HrError::NotFound("employee"))?;
        tracing::debug!(?rule, employee_id = %employee.id, "employee resolved");
        Ok(employee)
    }

    pub async fn employees(
        &self,
        subject: &Subject,
        page: Page,
    ) -> HrResult<Vec<employees::Model>> {
        PolicyEngine.check(subject, Action::ViewEmployees)?;
        let rows = employees::Entity::find()
            .order_by_asc(employees::Column::EmployeeCode)
            .limit(page.limit())
            .offset(page.offset())
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}

/// Resolves a free-form identifier: internal id, then employee code (exact,
/// upper-cased, lower-cased, substring), then personal or work email.
pub async fn resolve_employee<C: ConnectionTrait>(
    conn: &C,
    identifier: &str,
) -> HrResult<Option<(EmployeeLookup, employees::Model)>> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(HrError::invalid("identifier is required", "identifier"));
    }

    if let Ok(id) = Uuid::parse_str(identifier) {
        if let Some(found) = employees::Entity::find_by_id(id).one(conn).await? {
            return Ok(Some((EmployeeLookup::Id, found)));
        }
    }

    for (rule, code) in [
        (EmployeeLookup::ExactCode, identifier.to_string()),
        (EmployeeLookup::UpperCaseCode, identifier.to_uppercase()),
        (EmployeeLookup::LowerCaseCode, identifier.to_lowercase()),
    ] {
        let found = employees::Entity::find()
            .filter(employees::Column::EmployeeCode.eq(code))
            .one(conn)
            .await?;
        if let Some(found) = found {
            return Ok(Some((rule, found)));
        }
    }

    // LIKE case handling differs between backends; the candidates are
    // re-checked case-sensitively here.
    let partial = employees::Entity::find()
        .filter(
            Expr::col(employees::Column::EmployeeCode)
                .like(LikeExpr::new(format!("%{}%", escape_like(identifier))).escape('\\')),
        )
        .order_by_asc(employees::Column::EmployeeCode)
        .all(conn)
        .await?
        .into_iter()
        .find(|employee| employee.employee_code.contains(identifier));
    if let Some(found) = partial {
        return Ok(Some((EmployeeLookup::PartialCode, found)));
    }

    if identifier.contains('@') {
        let email = identifier.to_lowercase();
        let found = employees::Entity::find()
            .filter(
                Condition::any()
                    .add(employees::Column::Email.eq(email.clone()))
                    .add(employees::Column::WorkEmail.eq(email)),
            )
            .one(conn)
            .await?;
        if let Some(found) = found {
            return Ok(Some((EmployeeLookup::Email, found)));
        }
    }

    Ok(None)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
