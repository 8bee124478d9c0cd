use std::sync::Arc;

use super::controllers::{
    ApplicationController, EnquiryController, EnquiryIdSource, OfficerRegistrationController,
    ProjectController, SequentialEnquiryIds,
};
use super::domain::{Nric, User};
use super::eligibility::EligibilityPolicy;
use super::error::{HousingError, HousingResult};
use super::repository::{HousingStores, SharedRepository};

/// One set of injected stores with the four controllers built over it.
pub struct HousingPortal {
    users: SharedRepository<User>,
    projects: ProjectController,
    applications: ApplicationController,
    enquiries: EnquiryController,
    registrations: OfficerRegistrationController,
}

impl HousingPortal {
    pub fn new(stores: HousingStores, policy: EligibilityPolicy) -> Self {
        Self::with_enquiry_ids(stores, policy, Arc::new(SequentialEnquiryIds::default()))
    }

    pub fn with_enquiry_ids(
        stores: HousingStores,
        policy: EligibilityPolicy,
        ids: Arc<dyn EnquiryIdSource>,
    ) -> Self {
        let policy = Arc::new(policy);
        Self {
            users: stores.users.clone(),
            projects: ProjectController::new(&stores, policy.clone()),
            applications: ApplicationController::new(&stores, policy),
            enquiries: EnquiryController::new(&stores, ids),
            registrations: OfficerRegistrationController::new(&stores),
        }
    }

    pub fn projects(&self) -> &ProjectController {
        &self.projects
    }

    pub fn applications(&self) -> &ApplicationController {
        &self.applications
    }

    pub fn enquiries(&self) -> &EnquiryController {
        &self.enquiries
    }

    pub fn registrations(&self) -> &OfficerRegistrationController {
        &self.registrations
    }

    pub fn user(&self, nric: &Nric) -> HousingResult<User> {
        self.users
            .fetch(nric)?
            .ok_or_else(|| HousingError::not_found(format!("user {nric}")))
    }

    /// Create or replace a user account in the directory.
    pub fn enroll(&self, user: User) -> HousingResult<()> {
        if user.name.trim().is_empty() {
            return Err(HousingError::validation("user name must not be blank"));
        }
        self.users.save(user)?;
        Ok(())
    }
}
