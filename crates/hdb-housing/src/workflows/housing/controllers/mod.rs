mod applications;
mod enquiries;
mod projects;
mod registrations;

pub use applications::ApplicationController;
pub use enquiries::{EnquiryController, EnquiryIdSource, SequentialEnquiryIds};
pub use projects::{FlatOffer, ProjectController, ProjectDraft, ProjectUpdate, ReportFilter};
pub use registrations::OfficerRegistrationController;

use super::domain::{Application, Nric, Project};
use super::error::{HousingError, HousingResult};
use super::repository::Repository;

pub(crate) fn require_project(
    projects: &dyn Repository<Project>,
    name: &str,
) -> HousingResult<Project> {
    projects
        .fetch(&name.to_string())?
        .ok_or_else(|| HousingError::not_found(format!("project '{name}'")))
}

pub(crate) fn require_application(
    applications: &dyn Repository<Application>,
    applicant: &Nric,
) -> HousingResult<Application> {
    applications
        .fetch(applicant)?
        .ok_or_else(|| HousingError::not_found(format!("application for {applicant}")))
}

/// Trimmed text, or a validation error naming `field` when blank.
pub(crate) fn required_text(raw: &str, field: &str) -> HousingResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(HousingError::validation(format!("{field} must not be blank")))
    } else {
        Ok(trimmed.to_string())
    }
}
