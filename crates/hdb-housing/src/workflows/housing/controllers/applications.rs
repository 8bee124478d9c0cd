use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use super::super::access::{self, Capability};
use super::super::domain::{
    Application, ApplicationStatus, BookingRecord, FlatType, Nric, OfficerRegistration, Project,
    RegistrationKey, Role, User,
};
use super::super::eligibility::EligibilityPolicy;
use super::super::error::{HousingError, HousingResult};
use super::super::repository::{HousingStores, SharedRepository};
use super::super::views::BookingReceipt;
use super::{require_application, require_project};

/// Moves a single per-applicant application through its lifecycle.
///
/// Unit inventory is reserved when a manager approves and released when an
/// approved or booked application is withdrawn. Booking converts the
/// reservation and leaves the remaining count untouched.
pub struct ApplicationController {
    applications: SharedRepository<Application>,
    projects: SharedRepository<Project>,
    users: SharedRepository<User>,
    registrations: SharedRepository<OfficerRegistration>,
    policy: Arc<EligibilityPolicy>,
}

impl ApplicationController {
    pub fn new(stores: &HousingStores, policy: Arc<EligibilityPolicy>) -> Self {
        Self {
            applications: stores.applications.clone(),
            projects: stores.projects.clone(),
            users: stores.users.clone(),
            registrations: stores.registrations.clone(),
            policy,
        }
    }

    pub fn apply_for_project(
        &self,
        applicant: &User,
        project_name: &str,
        flat_type: &str,
        today: NaiveDate,
    ) -> HousingResult<Application> {
        access::require(applicant, Capability::ApplyForProject)?;
        let flat_type: FlatType = flat_type.parse()?;

        if let Some(existing) = self.applications.fetch(&applicant.nric)? {
            if existing.status.is_active() {
                return Err(HousingError::rule(format!(
                    "{} already has a {} application for {}",
                    applicant.nric, existing.status, existing.project
                )));
            }
        }

        let project = require_project(self.projects.as_ref(), project_name)?;
        if !project.visible || !project.is_open_on(today) {
            return Err(HousingError::rule(format!(
                "{} is not open for applications on {today}",
                project.name
            )));
        }
        if !project.offers(flat_type) {
            return Err(HousingError::rule(format!(
                "{} does not offer {flat_type} flats",
                project.name
            )));
        }
        self.policy.check_application(applicant, flat_type)?;

        if applicant.role == Role::Officer
            && self.officer_is_committed(&applicant.nric, &project)?
        {
            return Err(HousingError::rule(format!(
                "officer {} is registered to handle {} and may not apply for it",
                applicant.nric, project.name
            )));
        }

        let application = Application {
            applicant: applicant.nric.clone(),
            project: project.name.clone(),
            flat_type,
            status: ApplicationStatus::Pending,
            previous_status: None,
            applied_on: today,
            booking: None,
        };
        self.applications.save(application.clone())?;

        info!(
            applicant = %applicant.nric,
            project = %project.name,
            flat_type = flat_type.label(),
            "application submitted"
        );
        Ok(application)
    }

    /// Request withdrawal; the record stays until a manager decides.
    pub fn withdraw_application(&self, applicant: &User) -> HousingResult<Application> {
        let mut application = self.application_for(&applicant.nric)?;

        match application.status {
            ApplicationStatus::Pending | ApplicationStatus::Approved => {}
            other => {
                return Err(HousingError::rule(format!(
                    "a {other} application cannot be withdrawn"
                )))
            }
        }

        application.previous_status = Some(application.status);
        application.status = ApplicationStatus::WithdrawalRequested;
        self.applications.save(application.clone())?;

        info!(applicant = %applicant.nric, project = %application.project, "withdrawal requested");
        Ok(application)
    }

    pub fn approve_application(
        &self,
        manager: &User,
        applicant: &Nric,
    ) -> HousingResult<Application> {
        let (mut application, mut project) = self.owned_application(manager, applicant)?;
        expect_status(&application, ApplicationStatus::Pending)?;

        let inventory = project
            .flats
            .get_mut(&application.flat_type)
            .ok_or_else(|| {
                HousingError::rule(format!(
                    "{} no longer offers {} flats",
                    project.name, application.flat_type
                ))
            })?;
        if inventory.remaining_units == 0 {
            return Err(HousingError::rule(format!(
                "no {} units remain in {}",
                application.flat_type, project.name
            )));
        }
        inventory.remaining_units -= 1;
        let remaining = inventory.remaining_units;

        let pending = application.clone();
        application.status = ApplicationStatus::Approved;
        self.applications.save(application.clone())?;
        if let Err(err) = self.projects.save(project) {
            self.restore_application(pending);
            return Err(err.into());
        }

        info!(
            applicant = %applicant,
            project = %application.project,
            remaining,
            "application approved"
        );
        Ok(application)
    }

    pub fn reject_application(
        &self,
        manager: &User,
        applicant: &Nric,
    ) -> HousingResult<Application> {
        let (mut application, _) = self.owned_application(manager, applicant)?;
        expect_status(&application, ApplicationStatus::Pending)?;

        application.status = ApplicationStatus::Rejected;
        self.applications.save(application.clone())?;

        info!(applicant = %applicant, project = %application.project, "application rejected");
        Ok(application)
    }

    /// Remove the application and release any unit it held.
    pub fn approve_withdrawal(
        &self,
        manager: &User,
        applicant: &Nric,
    ) -> HousingResult<Application> {
        let (application, mut project) = self.owned_application(manager, applicant)?;
        expect_status(&application, ApplicationStatus::WithdrawalRequested)?;

        let held_unit = application
            .previous_status
            .map_or(false, ApplicationStatus::holds_unit);
        self.applications.remove(applicant)?;
        if held_unit {
            if let Some(inventory) = project.flats.get_mut(&application.flat_type) {
                inventory.remaining_units =
                    (inventory.remaining_units + 1).min(inventory.total_units);
            }
            if let Err(err) = self.projects.save(project) {
                self.restore_application(application);
                return Err(err.into());
            }
        }

        info!(
            applicant = %applicant,
            project = %application.project,
            released_unit = held_unit,
            "withdrawal approved"
        );
        Ok(application)
    }

    /// Put the application back into the status it had before the request.
    pub fn reject_withdrawal(
        &self,
        manager: &User,
        applicant: &Nric,
    ) -> HousingResult<Application> {
        let (mut application, _) = self.owned_application(manager, applicant)?;
        expect_status(&application, ApplicationStatus::WithdrawalRequested)?;

        application.status = application
            .previous_status
            .take()
            .unwrap_or(ApplicationStatus::Pending);
        self.applications.save(application.clone())?;

        info!(
            applicant = %applicant,
            status = %application.status,
            "withdrawal rejected"
        );
        Ok(application)
    }

    pub fn complete_booking(
        &self,
        officer: &User,
        applicant: &Nric,
        today: NaiveDate,
    ) -> HousingResult<Application> {
        access::require(officer, Capability::BookFlats)?;
        let mut application = self.application_for(applicant)?;
        let project = require_project(self.projects.as_ref(), &application.project)?;

        if !project.is_handled_by(&officer.nric) {
            return Err(HousingError::unauthorized(format!(
                "officer {} is not assigned to {}",
                officer.nric, project.name
            )));
        }
        expect_status(&application, ApplicationStatus::Approved)?;

        let price = project
            .flats
            .get(&application.flat_type)
            .map(|inventory| inventory.price)
            .ok_or_else(|| {
                HousingError::rule(format!(
                    "{} no longer offers {} flats",
                    project.name, application.flat_type
                ))
            })?;

        application.status = ApplicationStatus::Booked;
        application.booking = Some(BookingRecord {
            officer: officer.nric.clone(),
            price,
            booked_on: today,
        });
        self.applications.save(application.clone())?;

        info!(
            applicant = %applicant,
            officer = %officer.nric,
            project = %project.name,
            price,
            "flat booked"
        );
        Ok(application)
    }

    pub fn generate_booking_receipt(&self, applicant: &Nric) -> HousingResult<BookingReceipt> {
        let application = self
            .applications
            .fetch(applicant)?
            .filter(|application| application.status == ApplicationStatus::Booked)
            .ok_or_else(|| HousingError::not_found(format!("booked application for {applicant}")))?;
        let booking = application.booking.as_ref().ok_or_else(|| {
            HousingError::not_found(format!("booking details for {applicant}"))
        })?;

        let user = self
            .users
            .fetch(applicant)?
            .ok_or_else(|| HousingError::not_found(format!("user {applicant}")))?;
        let project = require_project(self.projects.as_ref(), &application.project)?;

        Ok(BookingReceipt {
            applicant: user.nric,
            applicant_name: user.name,
            age: user.age,
            marital_status: user.marital_status,
            marital_status_label: user.marital_status.label(),
            project: project.name,
            neighborhood: project.neighborhood,
            flat_type: application.flat_type,
            flat_type_label: application.flat_type.label(),
            price: booking.price,
            booked_on: booking.booked_on,
            booked_by: booking.officer.clone(),
        })
    }

    pub fn application_for(&self, applicant: &Nric) -> HousingResult<Application> {
        require_application(self.applications.as_ref(), applicant)
    }

    pub fn applications_for_project(
        &self,
        manager: &User,
        project_name: &str,
    ) -> HousingResult<Vec<Application>> {
        let project = require_project(self.projects.as_ref(), project_name)?;
        access::require_owner(manager, &project)?;

        Ok(self
            .applications
            .all()?
            .into_iter()
            .filter(|application| application.project == project.name)
            .collect())
    }

    /// Pending withdrawal requests across every project the manager owns.
    pub fn withdrawal_requests(&self, manager: &User) -> HousingResult<Vec<Application>> {
        access::require(manager, Capability::ManageProjects)?;
        let owned: Vec<String> = self
            .projects
            .all()?
            .into_iter()
            .filter(|project| project.is_managed_by(&manager.nric))
            .map(|project| project.name)
            .collect();

        Ok(self
            .applications
            .all()?
            .into_iter()
            .filter(|application| {
                application.status == ApplicationStatus::WithdrawalRequested
                    && owned.contains(&application.project)
            })
            .collect())
    }

    fn owned_application(
        &self,
        manager: &User,
        applicant: &Nric,
    ) -> HousingResult<(Application, Project)> {
        access::require(manager, Capability::ManageProjects)?;
        let application = self.application_for(applicant)?;
        let project = require_project(self.projects.as_ref(), &application.project)?;
        access::require_owner(manager, &project)?;
        Ok((application, project))
    }

    /// Write back the record as it was before a decision whose project update failed.
    fn restore_application(&self, previous: Application) {
        let applicant = previous.applicant.clone();
        match self.applications.save(previous) {
            Ok(()) => {
                warn!(applicant = %applicant, "project update failed, application restored")
            }
            Err(err) => error!(
                applicant = %applicant,
                error = %err,
                "project update failed and the application could not be restored"
            ),
        }
    }

    fn officer_is_committed(&self, officer: &Nric, project: &Project) -> HousingResult<bool> {
        if project.is_handled_by(officer) {
            return Ok(true);
        }
        let key = RegistrationKey {
            officer: officer.clone(),
            project: project.name.clone(),
        };
        Ok(self
            .registrations
            .fetch(&key)?
            .map_or(false, |registration| registration.status.is_live()))
    }
}

fn expect_status(application: &Application, expected: ApplicationStatus) -> HousingResult<()> {
    if application.status == expected {
        Ok(())
    } else {
        debug!(
            applicant = %application.applicant,
            expected = %expected,
            actual = %application.status,
            "application in unexpected status"
        );
        Err(HousingError::rule(format!(
            "application for {} is {}, expected {}",
            application.applicant, application.status, expected
        )))
    }
}
