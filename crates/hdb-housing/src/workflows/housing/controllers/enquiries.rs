use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::super::access::{self, Capability};
use super::super::domain::{Enquiry, EnquiryId, EnquiryReply, EnquiryStatus, Nric, Project, User};
use super::super::error::{HousingError, HousingResult};
use super::super::repository::{HousingStores, SharedRepository};
use super::{require_project, required_text};

/// Attempts made to find an unused identifier before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// Supplies candidate enquiry identifiers. Candidates may collide with stored
/// ids; the controller checks and asks again.
pub trait EnquiryIdSource: Send + Sync {
    fn next_id(&self) -> EnquiryId;
}

/// Per-instance counter producing `ENQ-000001`, `ENQ-000002`, ...
#[derive(Debug)]
pub struct SequentialEnquiryIds {
    next: AtomicU64,
}

impl SequentialEnquiryIds {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialEnquiryIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl EnquiryIdSource for SequentialEnquiryIds {
    fn next_id(&self) -> EnquiryId {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        EnquiryId(format!("ENQ-{id:06}"))
    }
}

/// Enquiry threads for every role. Authors edit and delete their own pending
/// enquiries; the project's manager and assigned officers reply.
pub struct EnquiryController {
    enquiries: SharedRepository<Enquiry>,
    projects: SharedRepository<Project>,
    ids: Arc<dyn EnquiryIdSource>,
}

impl EnquiryController {
    pub fn new(stores: &HousingStores, ids: Arc<dyn EnquiryIdSource>) -> Self {
        Self {
            enquiries: stores.enquiries.clone(),
            projects: stores.projects.clone(),
            ids,
        }
    }

    pub fn submit(
        &self,
        applicant: &User,
        project_name: &str,
        message: &str,
        today: NaiveDate,
    ) -> HousingResult<Enquiry> {
        access::require(applicant, Capability::SubmitEnquiry)?;
        let project = require_project(self.projects.as_ref(), project_name)?;
        let message = required_text(message, "enquiry message")?;

        let enquiry = Enquiry {
            id: self.unused_id()?,
            applicant: applicant.nric.clone(),
            project: project.name,
            message,
            replies: Vec::new(),
            status: EnquiryStatus::Pending,
            submitted_on: today,
        };
        self.enquiries.save(enquiry.clone())?;

        info!(
            enquiry = %enquiry.id,
            applicant = %applicant.nric,
            project = %enquiry.project,
            "enquiry submitted"
        );
        Ok(enquiry)
    }

    /// Replace the message of an unanswered enquiry. Author only.
    pub fn update(
        &self,
        actor: &User,
        id: &EnquiryId,
        new_message: &str,
    ) -> HousingResult<Enquiry> {
        let mut enquiry = self.authored_pending(actor, id)?;
        enquiry.message = required_text(new_message, "enquiry message")?;
        self.enquiries.save(enquiry.clone())?;

        info!(enquiry = %id, applicant = %actor.nric, "enquiry edited");
        Ok(enquiry)
    }

    /// Delete an unanswered enquiry. Author only.
    pub fn delete(&self, actor: &User, id: &EnquiryId) -> HousingResult<Enquiry> {
        let enquiry = self.authored_pending(actor, id)?;
        self.enquiries.remove(id)?;

        info!(enquiry = %id, applicant = %actor.nric, "enquiry deleted");
        Ok(enquiry)
    }

    pub fn add_reply(
        &self,
        id: &EnquiryId,
        respondent: &User,
        content: &str,
    ) -> HousingResult<Enquiry> {
        let mut enquiry = self.enquiry(id)?;
        let project = require_project(self.projects.as_ref(), &enquiry.project)?;

        if !access::is_project_staff(respondent, &project) {
            warn!(enquiry = %id, respondent = %respondent.nric, "reply refused");
            return Err(HousingError::unauthorized(format!(
                "{} {} is not staff on {}",
                respondent.role.label(),
                respondent.nric,
                project.name
            )));
        }
        let content = required_text(content, "reply")?;

        enquiry.replies.push(EnquiryReply {
            responder: respondent.nric.clone(),
            role: respondent.role,
            content,
        });
        enquiry.status = EnquiryStatus::Answered;
        self.enquiries.save(enquiry.clone())?;

        info!(
            enquiry = %id,
            respondent = %respondent.nric,
            replies = enquiry.replies.len(),
            "enquiry answered"
        );
        Ok(enquiry)
    }

    pub fn enquiry(&self, id: &EnquiryId) -> HousingResult<Enquiry> {
        self.enquiries
            .fetch(id)?
            .ok_or_else(|| HousingError::not_found(format!("enquiry {id}")))
    }

    pub fn enquiries_for_project(&self, project_name: &str) -> HousingResult<Vec<Enquiry>> {
        Ok(self
            .enquiries
            .all()?
            .into_iter()
            .filter(|enquiry| enquiry.project == project_name)
            .collect())
    }

    pub fn pending_enquiries_for_project(
        &self,
        project_name: &str,
    ) -> HousingResult<Vec<Enquiry>> {
        Ok(self
            .enquiries_for_project(project_name)?
            .into_iter()
            .filter(|enquiry| enquiry.status == EnquiryStatus::Pending)
            .collect())
    }

    pub fn enquiries_by(&self, applicant: &Nric) -> HousingResult<Vec<Enquiry>> {
        Ok(self
            .enquiries
            .all()?
            .into_iter()
            .filter(|enquiry| &enquiry.applicant == applicant)
            .collect())
    }

    /// Enquiries on every project the actor manages or is assigned to.
    pub fn enquiries_for_staff(&self, actor: &User) -> HousingResult<Vec<Enquiry>> {
        let staffed: Vec<String> = self
            .projects
            .all()?
            .into_iter()
            .filter(|project| access::is_project_staff(actor, project))
            .map(|project| project.name)
            .collect();

        Ok(self
            .enquiries
            .all()?
            .into_iter()
            .filter(|enquiry| staffed.contains(&enquiry.project))
            .collect())
    }

    fn authored_pending(&self, actor: &User, id: &EnquiryId) -> HousingResult<Enquiry> {
        let enquiry = self.enquiry(id)?;
        if enquiry.applicant != actor.nric {
            return Err(HousingError::unauthorized(format!(
                "{} is not the author of enquiry {id}",
                actor.nric
            )));
        }
        if enquiry.status != EnquiryStatus::Pending {
            return Err(HousingError::rule(format!(
                "enquiry {id} has been answered and can no longer change"
            )));
        }
        Ok(enquiry)
    }

    fn unused_id(&self) -> HousingResult<EnquiryId> {
        let taken: BTreeSet<EnquiryId> = self
            .enquiries
            .all()?
            .into_iter()
            .map(|enquiry| enquiry.id)
            .collect();

        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.ids.next_id();
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
            debug!(candidate = %candidate, "enquiry id collision, regenerating");
        }

        Err(HousingError::rule(format!(
            "could not allocate an unused enquiry id after {MAX_ID_ATTEMPTS} attempts"
        )))
    }
}
