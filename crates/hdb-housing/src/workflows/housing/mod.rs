//! Public housing portal: project listings, flat applications, enquiries and
//! officer registrations, served through four controllers over shared stores.

pub(crate) mod access;
pub mod controllers;
pub mod domain;
pub mod eligibility;
pub mod error;
pub mod portal;
pub mod repository;
pub mod router;
pub mod views;

#[cfg(test)]
mod tests;

pub use access::Capability;
pub use controllers::{
    ApplicationController, EnquiryController, EnquiryIdSource, FlatOffer,
    OfficerRegistrationController, ProjectController, ProjectDraft, ProjectUpdate, ReportFilter,
    SequentialEnquiryIds,
};
pub use domain::{
    parse_portal_date, Application, ApplicationStatus, BookingRecord, Enquiry, EnquiryId,
    EnquiryReply, EnquiryStatus, FlatInventory, FlatType, MaritalStatus, Nric,
    OfficerRegistration, Project, RegistrationKey, RegistrationStatus, Role, User,
    MAX_OFFICER_SLOTS, PORTAL_DATE_FORMAT,
};
pub use eligibility::{EligibilityPolicy, Ineligibility};
pub use error::{ErrorKind, HousingError, HousingResult};
pub use portal::HousingPortal;
pub use repository::{
    HousingStores, InMemoryRepository, Record, Repository, RepositoryError, SharedRepository,
};
pub use router::housing_router;
pub use views::{BookingReceipt, ReportEntry};
