use chrono::NaiveDate;
use tracing::{error, info, warn};

use super::super::access::{self, Capability};
use super::super::domain::{
    Application, Nric, OfficerRegistration, Project, RegistrationKey, RegistrationStatus, User,
};
use super::super::error::{HousingError, HousingResult};
use super::super::repository::{HousingStores, SharedRepository};
use super::require_project;

/// Officer requests to handle a project. A slot is taken only on approval.
pub struct OfficerRegistrationController {
    registrations: SharedRepository<OfficerRegistration>,
    projects: SharedRepository<Project>,
    applications: SharedRepository<Application>,
}

impl OfficerRegistrationController {
    pub fn new(stores: &HousingStores) -> Self {
        Self {
            registrations: stores.registrations.clone(),
            projects: stores.projects.clone(),
            applications: stores.applications.clone(),
        }
    }

    pub fn register_for_project(
        &self,
        officer: &User,
        project_name: &str,
        today: NaiveDate,
    ) -> HousingResult<OfficerRegistration> {
        access::require(officer, Capability::RegisterForProject)?;
        let project = require_project(self.projects.as_ref(), project_name)?;

        if self.check_applied_for_project(&officer.nric, &project.name)? {
            return Err(HousingError::rule(format!(
                "officer {} has applied for {} and may not handle it",
                officer.nric, project.name
            )));
        }

        for existing in self.registrations_of(&officer.nric)? {
            if !existing.status.is_live() {
                continue;
            }
            let committed = require_project(self.projects.as_ref(), &existing.project)?;
            if committed.overlaps(project.open_date, project.close_date) {
                return Err(HousingError::rule(format!(
                    "officer {} is already {} for {} ({} to {}), which overlaps {}",
                    officer.nric,
                    existing.status.label().to_ascii_lowercase(),
                    committed.name,
                    committed.open_date,
                    committed.close_date,
                    project.name
                )));
            }
        }

        let registration = OfficerRegistration {
            officer: officer.nric.clone(),
            project: project.name.clone(),
            status: RegistrationStatus::Pending,
            requested_on: today,
        };
        self.registrations.save(registration.clone())?;

        info!(
            officer = %officer.nric,
            project = %project.name,
            "officer registration requested"
        );
        Ok(registration)
    }

    /// Whether the officer holds an application, in any status, for the project.
    pub fn check_applied_for_project(
        &self,
        officer: &Nric,
        project_name: &str,
    ) -> HousingResult<bool> {
        Ok(self
            .applications
            .fetch(officer)?
            .map_or(false, |application| application.project == project_name))
    }

    pub fn registration_status(
        &self,
        officer: &Nric,
        project_name: &str,
    ) -> HousingResult<RegistrationStatus> {
        Ok(self.registration(officer, project_name)?.status)
    }

    pub fn approve_registration(
        &self,
        manager: &User,
        officer: &Nric,
        project_name: &str,
    ) -> HousingResult<OfficerRegistration> {
        let mut project = require_project(self.projects.as_ref(), project_name)?;
        access::require_owner(manager, &project)?;
        let mut registration = self.pending_registration(officer, &project.name)?;

        if project.free_officer_slots() == 0 {
            return Err(HousingError::rule(format!(
                "all {} officer slots on {} are filled",
                project.officer_slots, project.name
            )));
        }

        let pending = registration.clone();
        registration.status = RegistrationStatus::Approved;
        if !project.is_handled_by(officer) {
            project.officers.push(officer.clone());
        }
        let free_slots = project.free_officer_slots();
        self.registrations.save(registration.clone())?;
        if let Err(err) = self.projects.save(project) {
            match self.registrations.save(pending) {
                Ok(()) => warn!(officer = %officer, "project update failed, registration restored"),
                Err(restore) => error!(
                    officer = %officer,
                    error = %restore,
                    "project update failed and the registration could not be restored"
                ),
            }
            return Err(err.into());
        }

        info!(
            officer = %officer,
            project = %registration.project,
            free_slots,
            "officer registration approved"
        );
        Ok(registration)
    }

    pub fn reject_registration(
        &self,
        manager: &User,
        officer: &Nric,
        project_name: &str,
    ) -> HousingResult<OfficerRegistration> {
        let project = require_project(self.projects.as_ref(), project_name)?;
        access::require_owner(manager, &project)?;
        let mut registration = self.pending_registration(officer, &project.name)?;

        registration.status = RegistrationStatus::Rejected;
        self.registrations.save(registration.clone())?;

        info!(officer = %officer, project = %project.name, "officer registration rejected");
        Ok(registration)
    }

    pub fn registrations_for_project(
        &self,
        manager: &User,
        project_name: &str,
    ) -> HousingResult<Vec<OfficerRegistration>> {
        let project = require_project(self.projects.as_ref(), project_name)?;
        access::require_owner(manager, &project)?;

        Ok(self
            .registrations
            .all()?
            .into_iter()
            .filter(|registration| registration.project == project.name)
            .collect())
    }

    fn registration(
        &self,
        officer: &Nric,
        project_name: &str,
    ) -> HousingResult<OfficerRegistration> {
        let key = RegistrationKey {
            officer: officer.clone(),
            project: project_name.to_string(),
        };
        self.registrations.fetch(&key)?.ok_or_else(|| {
            HousingError::not_found(format!(
                "registration of officer {officer} for {project_name}"
            ))
        })
    }

    fn pending_registration(
        &self,
        officer: &Nric,
        project_name: &str,
    ) -> HousingResult<OfficerRegistration> {
        let registration = self.registration(officer, project_name)?;
        if registration.status != RegistrationStatus::Pending {
            return Err(HousingError::rule(format!(
                "registration of officer {officer} for {project_name} is already {}",
                registration.status.label()
            )));
        }
        Ok(registration)
    }

    fn registrations_of(&self, officer: &Nric) -> HousingResult<Vec<OfficerRegistration>> {
        Ok(self
            .registrations
            .all()?
            .into_iter()
            .filter(|registration| &registration.officer == officer)
            .collect())
    }
}
