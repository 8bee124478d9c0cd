use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::HousingError;

/// Format used for every date entered by portal users, e.g. `01/06/2024`.
pub const PORTAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// Upper bound on officers that may be assigned to a single project.
pub const MAX_OFFICER_SLOTS: u8 = 10;

/// Parse a user-entered `dd/mm/yyyy` date.
pub fn parse_portal_date(raw: &str) -> Result<NaiveDate, HousingError> {
    NaiveDate::parse_from_str(raw.trim(), PORTAL_DATE_FORMAT).map_err(|err| {
        HousingError::validation(format!("'{raw}' is not a dd/mm/yyyy date ({err})"))
    })
}

/// National registration identity number, the key for every portal user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nric(String);

impl Nric {
    /// Accepts `S`/`T`, seven digits, and a trailing check letter.
    pub fn parse(raw: &str) -> Result<Self, HousingError> {
        let value = raw.trim().to_ascii_uppercase();
        let bytes = value.as_bytes();
        let well_formed = bytes.len() == 9
            && matches!(bytes[0], b'S' | b'T')
            && bytes[1..8].iter().all(u8::is_ascii_digit)
            && bytes[8].is_ascii_uppercase();

        if !well_formed {
            return Err(HousingError::validation(format!(
                "'{raw}' is not a valid NRIC"
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Nric {
    type Error = HousingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Nric> for String {
    fn from(value: Nric) -> Self {
        value.0
    }
}

impl fmt::Display for Nric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
}

impl MaritalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::Married => "Married",
        }
    }
}

impl FromStr for MaritalStatus {
    type Err = HousingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "married" => Ok(Self::Married),
            _ => Err(HousingError::validation(format!(
                "'{raw}' is not a marital status (expected single or married)"
            ))),
        }
    }
}

impl fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Housing unit category offered by a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlatType {
    #[serde(rename = "2-room")]
    TwoRoom,
    #[serde(rename = "3-room")]
    ThreeRoom,
}

impl FlatType {
    pub const fn ordered() -> [Self; 2] {
        [Self::TwoRoom, Self::ThreeRoom]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TwoRoom => "2-Room",
            Self::ThreeRoom => "3-Room",
        }
    }
}

impl FromStr for FlatType {
    type Err = HousingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();

        match normalized.as_str() {
            "2room" | "tworoom" => Ok(Self::TwoRoom),
            "3room" | "threeroom" => Ok(Self::ThreeRoom),
            _ => Err(HousingError::validation(format!(
                "'{raw}' is not a flat type (expected 2-room or 3-room)"
            ))),
        }
    }
}

impl fmt::Display for FlatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Officer,
    Manager,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applicant => "Applicant",
            Self::Officer => "HDB Officer",
            Self::Manager => "HDB Manager",
        }
    }
}

/// Portal account. Officers and managers carry no project back-references;
/// their projects are resolved through the project store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub nric: Nric,
    pub name: String,
    pub age: u8,
    pub marital_status: MaritalStatus,
    pub role: Role,
}

/// Units and price for one flat type within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatInventory {
    pub total_units: u32,
    pub remaining_units: u32,
    pub price: u64,
}

impl FlatInventory {
    pub fn new(total_units: u32, price: u64) -> Self {
        Self {
            total_units,
            remaining_units: total_units,
            price,
        }
    }

    /// Units held by approved or booked applications.
    pub fn reserved_units(&self) -> u32 {
        self.total_units.saturating_sub(self.remaining_units)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub neighborhood: String,
    pub open_date: NaiveDate,
    pub close_date: NaiveDate,
    pub officer_slots: u8,
    pub visible: bool,
    pub manager: Nric,
    #[serde(default)]
    pub officers: Vec<Nric>,
    #[serde(default)]
    pub flats: BTreeMap<FlatType, FlatInventory>,
}

impl Project {
    pub fn is_open_on(&self, day: NaiveDate) -> bool {
        self.open_date <= day && day <= self.close_date
    }

    pub fn has_opened_by(&self, day: NaiveDate) -> bool {
        self.open_date <= day
    }

    /// Inclusive overlap between this project's window and `[open, close]`.
    pub fn overlaps(&self, open: NaiveDate, close: NaiveDate) -> bool {
        self.open_date <= close && open <= self.close_date
    }

    pub fn offers(&self, flat_type: FlatType) -> bool {
        self.flats.contains_key(&flat_type)
    }

    pub fn is_managed_by(&self, nric: &Nric) -> bool {
        &self.manager == nric
    }

    pub fn is_handled_by(&self, nric: &Nric) -> bool {
        self.officers.contains(nric)
    }

    pub fn free_officer_slots(&self) -> usize {
        usize::from(self.officer_slots).saturating_sub(self.officers.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Booked,
    WithdrawalRequested,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Booked => "BOOKED",
            Self::WithdrawalRequested => "WITHDRAWAL_REQUESTED",
        }
    }

    /// Everything except a rejection blocks a fresh application.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Rejected)
    }

    /// Statuses that have a unit reserved against the project inventory.
    pub const fn holds_unit(self) -> bool {
        matches!(self, Self::Approved | Self::Booked)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub officer: Nric,
    pub price: u64,
    pub booked_on: NaiveDate,
}

/// The single application record an applicant may hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub applicant: Nric,
    pub project: String,
    pub flat_type: FlatType,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<ApplicationStatus>,
    pub applied_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnquiryId(pub String);

impl fmt::Display for EnquiryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnquiryStatus {
    Pending,
    Answered,
}

impl EnquiryStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Answered => "ANSWERED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquiryReply {
    pub responder: Nric,
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enquiry {
    pub id: EnquiryId,
    pub applicant: Nric,
    pub project: String,
    pub message: String,
    #[serde(default)]
    pub replies: Vec<EnquiryReply>,
    pub status: EnquiryStatus,
    pub submitted_on: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Pending and approved registrations both commit the officer's time.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegistrationKey {
    pub officer: Nric,
    pub project: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficerRegistration {
    pub officer: Nric,
    pub project: String,
    pub status: RegistrationStatus,
    pub requested_on: NaiveDate,
}
