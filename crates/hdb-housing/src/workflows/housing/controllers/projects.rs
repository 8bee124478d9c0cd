use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::super::access;
use super::super::domain::{
    parse_portal_date, Application, FlatInventory, FlatType, MaritalStatus, Nric, Project, User,
    MAX_OFFICER_SLOTS,
};
use super::super::eligibility::EligibilityPolicy;
use super::super::error::{HousingError, HousingResult};
use super::super::repository::{HousingStores, SharedRepository};
use super::super::views::ReportEntry;
use super::{require_project, required_text};

/// Raw manager input for a new project. Dates are `dd/mm/yyyy` strings and
/// flat figures are unparsed so validation failures surface uniformly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    pub neighborhood: String,
    pub open_date: String,
    pub close_date: String,
    pub officer_slots: u8,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub flats: Vec<FlatOffer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatOffer {
    pub flat_type: String,
    pub units: String,
    pub price: String,
}

/// Partial edit; `None` keeps the current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub open_date: Option<String>,
    #[serde(default)]
    pub close_date: Option<String>,
    #[serde(default)]
    pub officer_slots: Option<u8>,
}

/// Optional report filters as typed by the manager. Blank values are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub flat_type: Option<String>,
    #[serde(default)]
    pub marital_status: Option<String>,
    #[serde(default)]
    pub min_age: Option<String>,
    #[serde(default)]
    pub max_age: Option<String>,
}

#[derive(Debug, Default)]
struct ReportCriteria {
    flat_type: Option<FlatType>,
    marital_status: Option<MaritalStatus>,
    min_age: Option<u8>,
    max_age: Option<u8>,
}

impl ReportFilter {
    fn criteria(&self) -> HousingResult<ReportCriteria> {
        let criteria = ReportCriteria {
            flat_type: non_blank(&self.flat_type).map(str::parse).transpose()?,
            marital_status: non_blank(&self.marital_status)
                .map(str::parse)
                .transpose()?,
            min_age: non_blank(&self.min_age)
                .map(|raw| parse_age(raw, "minimum age"))
                .transpose()?,
            max_age: non_blank(&self.max_age)
                .map(|raw| parse_age(raw, "maximum age"))
                .transpose()?,
        };

        if let (Some(min), Some(max)) = (criteria.min_age, criteria.max_age) {
            if min > max {
                return Err(HousingError::validation(format!(
                    "minimum age {min} exceeds maximum age {max}"
                )));
            }
        }

        Ok(criteria)
    }
}

impl ReportCriteria {
    fn matches(&self, entry: &ReportEntry) -> bool {
        self.flat_type.map_or(true, |wanted| entry.flat_type == wanted)
            && self
                .marital_status
                .map_or(true, |wanted| entry.marital_status == wanted)
            && self.min_age.map_or(true, |min| entry.age >= min)
            && self.max_age.map_or(true, |max| entry.age <= max)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_count<T: FromStr>(raw: &str, field: &str) -> HousingResult<T> {
    raw.trim().parse::<T>().map_err(|_| {
        HousingError::validation(format!("{field} must be a non-negative integer, got '{raw}'"))
    })
}

fn parse_age(raw: &str, field: &str) -> HousingResult<u8> {
    raw.trim().parse::<u8>().map_err(|_| {
        HousingError::validation(format!("{field} must be an age between 0 and 255, got '{raw}'"))
    })
}

fn parse_window(open: &str, close: &str) -> HousingResult<(NaiveDate, NaiveDate)> {
    let open_date = parse_portal_date(open)?;
    let close_date = parse_portal_date(close)?;
    check_window(open_date, close_date)?;
    Ok((open_date, close_date))
}

fn check_window(open_date: NaiveDate, close_date: NaiveDate) -> HousingResult<()> {
    if close_date < open_date {
        return Err(HousingError::validation(format!(
            "closing date {close_date} is before opening date {open_date}"
        )));
    }
    Ok(())
}

fn check_officer_slots(slots: u8) -> HousingResult<u8> {
    if slots == 0 || slots > MAX_OFFICER_SLOTS {
        return Err(HousingError::validation(format!(
            "officer slots must be between 1 and {MAX_OFFICER_SLOTS}, got {slots}"
        )));
    }
    Ok(slots)
}

fn parse_offer(
    flat_type: &str,
    units: &str,
    price: &str,
) -> HousingResult<(FlatType, FlatInventory)> {
    let flat_type: FlatType = flat_type.parse()?;
    let units: u32 = parse_count(units, "unit count")?;
    let price: u64 = parse_count(price, "price")?;
    Ok((flat_type, FlatInventory::new(units, price)))
}

/// Listing visibility for applicants and project upkeep for managers.
pub struct ProjectController {
    projects: SharedRepository<Project>,
    applications: SharedRepository<Application>,
    users: SharedRepository<User>,
    policy: Arc<EligibilityPolicy>,
}

impl ProjectController {
    pub fn new(stores: &HousingStores, policy: Arc<EligibilityPolicy>) -> Self {
        Self {
            projects: stores.projects.clone(),
            applications: stores.applications.clone(),
            users: stores.users.clone(),
            policy,
        }
    }

    /// Visible projects that have opened and offer a flat the applicant may hold.
    pub fn visible_projects(
        &self,
        applicant: &User,
        today: NaiveDate,
    ) -> HousingResult<Vec<Project>> {
        let projects = self.projects.all()?;
        Ok(projects
            .into_iter()
            .filter(|project| {
                project.visible
                    && project.has_opened_by(today)
                    && self.policy.offers_permitted_flat(applicant, project)
            })
            .collect())
    }

    /// Visible projects whose application window contains `today`.
    pub fn opening_projects(
        &self,
        applicant: &User,
        today: NaiveDate,
    ) -> HousingResult<Vec<Project>> {
        Ok(self
            .visible_projects(applicant, today)?
            .into_iter()
            .filter(|project| project.is_open_on(today))
            .collect())
    }

    pub fn project(&self, name: &str) -> HousingResult<Project> {
        require_project(self.projects.as_ref(), name)
    }

    pub fn all_projects(&self) -> HousingResult<Vec<Project>> {
        Ok(self.projects.all()?)
    }

    pub fn projects_managed_by(&self, manager: &Nric) -> HousingResult<Vec<Project>> {
        Ok(self
            .projects
            .all()?
            .into_iter()
            .filter(|project| project.is_managed_by(manager))
            .collect())
    }

    pub fn projects_handled_by(&self, officer: &Nric) -> HousingResult<Vec<Project>> {
        Ok(self
            .projects
            .all()?
            .into_iter()
            .filter(|project| project.is_handled_by(officer))
            .collect())
    }

    pub fn create_project(&self, manager: &User, draft: ProjectDraft) -> HousingResult<Project> {
        access::require(manager, access::Capability::ManageProjects)?;

        let name = required_text(&draft.name, "project name")?;
        let neighborhood = required_text(&draft.neighborhood, "neighborhood")?;
        let (open_date, close_date) = parse_window(&draft.open_date, &draft.close_date)?;
        let officer_slots = check_officer_slots(draft.officer_slots)?;

        let mut project = Project {
            name,
            neighborhood,
            open_date,
            close_date,
            officer_slots,
            visible: draft.visible,
            manager: manager.nric.clone(),
            officers: Vec::new(),
            flats: Default::default(),
        };
        for offer in &draft.flats {
            let (flat_type, inventory) =
                parse_offer(&offer.flat_type, &offer.units, &offer.price)?;
            project.flats.insert(flat_type, inventory);
        }

        if self.projects.fetch(&project.name)?.is_some() {
            return Err(HousingError::rule(format!(
                "a project named '{}' already exists",
                project.name
            )));
        }
        self.ensure_no_overlap(&manager.nric, open_date, close_date, None)?;

        self.projects.save(project.clone())?;
        info!(manager = %manager.nric, project = %project.name, "project created");
        Ok(project)
    }

    pub fn update_project(
        &self,
        manager: &User,
        name: &str,
        update: ProjectUpdate,
    ) -> HousingResult<Project> {
        let mut project = self.project(name)?;
        access::require_owner(manager, &project)?;

        if let Some(neighborhood) = &update.neighborhood {
            project.neighborhood = required_text(neighborhood, "neighborhood")?;
        }
        if let Some(raw) = &update.open_date {
            project.open_date = parse_portal_date(raw)?;
        }
        if let Some(raw) = &update.close_date {
            project.close_date = parse_portal_date(raw)?;
        }
        check_window(project.open_date, project.close_date)?;

        if let Some(slots) = update.officer_slots {
            let slots = check_officer_slots(slots)?;
            if usize::from(slots) < project.officers.len() {
                return Err(HousingError::rule(format!(
                    "{} officers are already assigned to {}; cannot reduce slots to {slots}",
                    project.officers.len(),
                    project.name
                )));
            }
            project.officer_slots = slots;
        }

        self.ensure_no_overlap(
            &manager.nric,
            project.open_date,
            project.close_date,
            Some(&project.name),
        )?;

        self.projects.save(project.clone())?;
        info!(manager = %manager.nric, project = %project.name, "project updated");
        Ok(project)
    }

    /// Add a flat type or relist it with a new total and price. Units already
    /// reserved by approved or booked applications stay reserved.
    pub fn add_flat_to_project(
        &self,
        manager: &User,
        name: &str,
        flat_type: &str,
        units: &str,
        price: &str,
    ) -> HousingResult<Project> {
        let mut project = self.project(name)?;
        access::require_owner(manager, &project)?;

        let (flat_type, mut inventory) = parse_offer(flat_type, units, price)?;
        if let Some(current) = project.flats.get(&flat_type) {
            let held = current.reserved_units();
            if inventory.total_units < held {
                return Err(HousingError::rule(format!(
                    "{} {flat_type} units are already reserved in {}, cannot list only {}",
                    held, project.name, inventory.total_units
                )));
            }
            inventory.remaining_units = inventory.total_units - held;
        }
        project.flats.insert(flat_type, inventory);

        self.projects.save(project.clone())?;
        info!(
            project = %project.name,
            flat_type = flat_type.label(),
            units = inventory.total_units,
            price = inventory.price,
            "flat type listed"
        );
        Ok(project)
    }

    pub fn toggle_project_visibility(
        &self,
        manager: &User,
        name: &str,
        visible: bool,
    ) -> HousingResult<Project> {
        let mut project = self.project(name)?;
        access::require_owner(manager, &project)?;

        if project.visible != visible {
            project.visible = visible;
            self.projects.save(project.clone())?;
            info!(project = %project.name, visible, "project visibility changed");
        }
        Ok(project)
    }

    pub fn generate_report(
        &self,
        manager: &User,
        name: &str,
        filter: &ReportFilter,
    ) -> HousingResult<Vec<ReportEntry>> {
        let project = self.project(name)?;
        access::require_owner(manager, &project)?;
        let criteria = filter.criteria()?;

        let mut entries = Vec::new();
        for application in self
            .applications
            .all()?
            .into_iter()
            .filter(|application| application.project == project.name)
        {
            let Some(applicant) = self.users.fetch(&application.applicant)? else {
                warn!(
                    applicant = %application.applicant,
                    project = %project.name,
                    "skipping application without a user record"
                );
                continue;
            };

            let entry = ReportEntry {
                applicant: applicant.nric,
                applicant_name: applicant.name,
                age: applicant.age,
                marital_status: applicant.marital_status,
                marital_status_label: applicant.marital_status.label(),
                flat_type: application.flat_type,
                flat_type_label: application.flat_type.label(),
                status: application.status,
                project: project.name.clone(),
                neighborhood: project.neighborhood.clone(),
            };
            if criteria.matches(&entry) {
                entries.push(entry);
            }
        }

        debug!(project = %project.name, rows = entries.len(), "report generated");
        Ok(entries)
    }

    fn ensure_no_overlap(
        &self,
        manager: &Nric,
        open_date: NaiveDate,
        close_date: NaiveDate,
        exclude: Option<&str>,
    ) -> HousingResult<()> {
        let clash = self.projects.all()?.into_iter().find(|project| {
            project.is_managed_by(manager)
                && Some(project.name.as_str()) != exclude
                && project.overlaps(open_date, close_date)
        });

        match clash {
            Some(project) => Err(HousingError::rule(format!(
                "manager {manager} already runs {} from {} to {}",
                project.name, project.open_date, project.close_date
            ))),
            None => Ok(()),
        }
    }
}
