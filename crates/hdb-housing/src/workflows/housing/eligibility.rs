use crate::config::EligibilityConfig;

use super::domain::{FlatType, MaritalStatus, Project, User};
use super::error::HousingError;

pub const DEFAULT_SINGLE_MIN_AGE: u8 = 35;
pub const DEFAULT_MARRIED_MIN_AGE: u8 = 21;

/// Reasons an applicant may not apply for a given flat.
#[derive(Debug, thiserror::Error)]
pub enum Ineligibility {
    #[error("{status} applicants must be at least {min_age} years old (applicant is {age})")]
    Underage {
        status: MaritalStatus,
        min_age: u8,
        age: u8,
    },
    #[error("{status} applicants may not apply for {flat_type} flats")]
    FlatTypeNotPermitted {
        status: MaritalStatus,
        flat_type: FlatType,
    },
}

impl From<Ineligibility> for HousingError {
    fn from(value: Ineligibility) -> Self {
        HousingError::rule(value.to_string())
    }
}

/// Age gates and flat-type entitlements by marital status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityPolicy {
    single_min_age: u8,
    married_min_age: u8,
}

impl EligibilityPolicy {
    pub fn new(single_min_age: u8, married_min_age: u8) -> Self {
        Self {
            single_min_age,
            married_min_age,
        }
    }

    pub fn min_age_for(&self, status: MaritalStatus) -> u8 {
        match status {
            MaritalStatus::Single => self.single_min_age,
            MaritalStatus::Married => self.married_min_age,
        }
    }

    pub fn permitted_flat_types(&self, status: MaritalStatus) -> &'static [FlatType] {
        match status {
            MaritalStatus::Single => &[FlatType::TwoRoom],
            MaritalStatus::Married => &[FlatType::TwoRoom, FlatType::ThreeRoom],
        }
    }

    /// True when the project offers at least one flat type the user may hold.
    pub fn offers_permitted_flat(&self, user: &User, project: &Project) -> bool {
        self.permitted_flat_types(user.marital_status)
            .iter()
            .any(|flat_type| project.offers(*flat_type))
    }

    pub fn check_application(&self, user: &User, flat_type: FlatType) -> Result<(), Ineligibility> {
        let status = user.marital_status;
        let min_age = self.min_age_for(status);
        if user.age < min_age {
            return Err(Ineligibility::Underage {
                status,
                min_age,
                age: user.age,
            });
        }

        if !self.permitted_flat_types(status).contains(&flat_type) {
            return Err(Ineligibility::FlatTypeNotPermitted { status, flat_type });
        }

        Ok(())
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SINGLE_MIN_AGE, DEFAULT_MARRIED_MIN_AGE)
    }
}

impl From<&EligibilityConfig> for EligibilityPolicy {
    fn from(config: &EligibilityConfig) -> Self {
        Self::new(config.single_min_age, config.married_min_age)
    }
}
