//! Onboarding payload as submitted by clients, and its normalised form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{HrError, HrResult};

const MAX_CODE_LEN: usize = 64;
const MAX_NAME_LEN: usize = 128;
const MAX_DOCUMENTS: usize = 20;

/// Client-facing onboarding form. Everything is optional at the wire level;
/// [`OnboardingPayload::normalize`] enforces the required fields.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    /// External employee code.
    pub employee_id: Option<String>,
    pub work_email: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employment_type: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub reporting_manager: Option<String>,
    pub work_location: Option<String>,
    /// Base64 / data-URL image, or an already hosted URL.
    pub profile_image: Option<String>,
    pub documents: Vec<DocumentUpload>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DocumentUpload {
    pub name: String,
    pub data: String,
}

/// Validated onboarding data, ready to persist once blobs are uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Onboarding {
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub work_email: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employment_type: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub reporting_manager: Option<String>,
    pub work_location: Option<String>,
    pub profile_image: Option<String>,
    pub documents: Vec<DocumentUpload>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
}

impl OnboardingPayload {
    pub fn normalize(self) -> HrResult<Onboarding> {
        let employee_code = required(self.employee_id, "employeeId")?;
        if employee_code.chars().count() > MAX_CODE_LEN {
            return Err(HrError::invalid(
                format!("employeeId must be at most {MAX_CODE_LEN} characters"),
                "employeeId",
            ));
        }
        let first_name = bounded_name(required(self.first_name, "firstName")?, "firstName")?;
        let last_name = bounded_name(required(self.last_name, "lastName")?, "lastName")?;
        let email = email_field(required(self.email, "email")?, "email")?;
        let work_email = optional(self.work_email)
            .map(|value| email_field(value, "workEmail"))
            .transpose()?;

        if self.documents.len() > MAX_DOCUMENTS {
            return Err(HrError::invalid(
                format!("at most {MAX_DOCUMENTS} documents may be attached"),
                "documents",
            ));
        }
        let mut documents = Vec::with_capacity(self.documents.len());
        for doc in self.documents {
            let name = doc.name.trim().to_string();
            if name.is_empty() {
                return Err(HrError::invalid("document name is required", "documents"));
            }
            if documents.iter().any(|d: &DocumentUpload| d.name == name) {
                return Err(HrError::invalid(
                    format!("document {name} is attached twice"),
                    "documents",
                ));
            }
            documents.push(DocumentUpload {
                name,
                data: doc.data,
            });
        }

        Ok(Onboarding {
            employee_code,
            first_name,
            last_name,
            email,
            phone: optional(self.phone),
            date_of_birth: self.date_of_birth,
            gender: optional(self.gender),
            marital_status: optional(self.marital_status),
            nationality: optional(self.nationality),
            address: optional(self.address),
            city: optional(self.city),
            country: optional(self.country),
            emergency_contact_name: optional(self.emergency_contact_name),
            emergency_contact_phone: optional(self.emergency_contact_phone),
            work_email,
            department: optional(self.department),
            designation: optional(self.designation),
            employment_type: optional(self.employment_type),
            joining_date: self.joining_date,
            reporting_manager: optional(self.reporting_manager),
            work_location: optional(self.work_location),
            profile_image: optional(self.profile_image),
            documents,
            linkedin_url: optional(self.linkedin_url),
            github_url: optional(self.github_url),
            portfolio_url: optional(self.portfolio_url),
        })
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &'static str) -> HrResult<String> {
    optional(value).ok_or_else(|| HrError::invalid(format!("{field} is required"), field))
}

fn bounded_name(value: String, field: &'static str) -> HrResult<String> {
    if value.chars().count() > MAX_NAME_LEN {
        return Err(HrError::invalid(
            format!("{field} must be at most {MAX_NAME_LEN} characters"),
            field,
        ));
    }
    Ok(value)
}

fn email_field(value: String, field: &'static str) -> HrResult<String> {
    platform_authn::normalize_email(&value)
        .map_err(|_| HrError::invalid(format!("{field} is not a valid email address"), field))
}
