use super::domain::{Project, Role, User};
use super::error::{HousingError, HousingResult};

/// Actions gated by the acting user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ApplyForProject,
    SubmitEnquiry,
    ManageProjects,
    RegisterForProject,
    BookFlats,
}

impl Capability {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ApplyForProject => "apply for projects",
            Self::SubmitEnquiry => "submit enquiries",
            Self::ManageProjects => "manage projects",
            Self::RegisterForProject => "register to handle projects",
            Self::BookFlats => "book flats",
        }
    }
}

impl Role {
    /// Officers keep every applicant capability.
    pub const fn can(self, capability: Capability) -> bool {
        match capability {
            Capability::ApplyForProject | Capability::SubmitEnquiry => {
                matches!(self, Role::Applicant | Role::Officer)
            }
            Capability::ManageProjects => matches!(self, Role::Manager),
            Capability::RegisterForProject | Capability::BookFlats => matches!(self, Role::Officer),
        }
    }
}

pub(crate) fn require(actor: &User, capability: Capability) -> HousingResult<()> {
    if actor.role.can(capability) {
        Ok(())
    } else {
        Err(HousingError::unauthorized(format!(
            "{} {} may not {}",
            actor.role.label(),
            actor.nric,
            capability.label()
        )))
    }
}

pub(crate) fn require_owner(actor: &User, project: &Project) -> HousingResult<()> {
    require(actor, Capability::ManageProjects)?;
    if project.is_managed_by(&actor.nric) {
        Ok(())
    } else {
        Err(HousingError::unauthorized(format!(
            "manager {} does not own project {}",
            actor.nric, project.name
        )))
    }
}

/// The project's manager or one of its assigned officers.
pub(crate) fn is_project_staff(actor: &User, project: &Project) -> bool {
    match actor.role {
        Role::Manager => project.is_managed_by(&actor.nric),
        Role::Officer => project.is_handled_by(&actor.nric),
        Role::Applicant => false,
    }
}
