use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{ApplicationStatus, FlatType, MaritalStatus, Nric};

/// One applicant row in a manager's project report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub applicant: Nric,
    pub applicant_name: String,
    pub age: u8,
    pub marital_status: MaritalStatus,
    pub marital_status_label: &'static str,
    pub flat_type: FlatType,
    pub flat_type_label: &'static str,
    pub status: ApplicationStatus,
    pub project: String,
    pub neighborhood: String,
}

/// Read-only confirmation handed to an applicant after booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReceipt {
    pub applicant: Nric,
    pub applicant_name: String,
    pub age: u8,
    pub marital_status: MaritalStatus,
    pub marital_status_label: &'static str,
    pub project: String,
    pub neighborhood: String,
    pub flat_type: FlatType,
    pub flat_type_label: &'static str,
    pub price: u64,
    pub booked_on: NaiveDate,
    pub booked_by: Nric,
}
