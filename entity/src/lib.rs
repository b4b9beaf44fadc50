//! sea-orm entities for the HR onboarding service.

pub mod accounts;
pub mod employees;
pub mod notifications;
pub mod pending_registrations;
pub mod sessions;
