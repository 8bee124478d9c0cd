use chrono::NaiveDate;
use hdb_housing::workflows::housing::{
    HousingError, HousingPortal, HousingResult, MaritalStatus, Nric, Role, User,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const DEMO_USERS: &[(&str, &str, u8, MaritalStatus, Role)] = &[
    ("S1234567A", "John", 35, MaritalStatus::Single, Role::Applicant),
    ("T7654321B", "Sarah", 40, MaritalStatus::Married, Role::Applicant),
    ("S9876543C", "Grace", 37, MaritalStatus::Married, Role::Applicant),
    ("T2345678D", "James", 30, MaritalStatus::Married, Role::Applicant),
    ("S3456789E", "Rachel", 30, MaritalStatus::Single, Role::Applicant),
    ("T2109876H", "Daniel", 36, MaritalStatus::Single, Role::Officer),
    ("S6543210I", "Emily", 28, MaritalStatus::Single, Role::Officer),
    ("T1234567J", "David", 29, MaritalStatus::Married, Role::Officer),
    ("T8765432F", "Michael", 36, MaritalStatus::Single, Role::Manager),
    ("S5678901G", "Jessica", 26, MaritalStatus::Married, Role::Manager),
];

/// Sample accounts used by `serve --seed-demo-users` and the demo command.
pub(crate) fn demo_users() -> HousingResult<Vec<User>> {
    DEMO_USERS
        .iter()
        .map(|&(nric, name, age, marital_status, role)| {
            Ok(User {
                nric: Nric::parse(nric)?,
                name: name.to_string(),
                age,
                marital_status,
                role,
            })
        })
        .collect()
}

pub(crate) fn seed_demo_users(portal: &HousingPortal) -> HousingResult<usize> {
    let users = demo_users()?;
    let count = users.len();
    for user in users {
        portal.enroll(user)?;
    }
    Ok(count)
}

pub(crate) fn find_demo_user(users: &[User], name: &str) -> HousingResult<User> {
    users
        .iter()
        .find(|user| user.name == name)
        .cloned()
        .ok_or_else(|| HousingError::not_found(format!("demo user {name}")))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
