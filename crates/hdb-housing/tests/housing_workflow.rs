//! End-to-end scenarios driven through the public portal facade, from project
//! creation to a booking receipt, without reaching into private modules.

mod common {
    use chrono::NaiveDate;

    use hdb_housing::config::EligibilityConfig;
    use hdb_housing::workflows::housing::{
        EligibilityPolicy, FlatOffer, HousingPortal, HousingStores, MaritalStatus, Nric,
        ProjectDraft, Role, User,
    };

    pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    pub(super) fn user(nric: &str, name: &str, age: u8, status: MaritalStatus, role: Role) -> User {
        User {
            nric: Nric::parse(nric).expect("valid NRIC"),
            name: name.to_string(),
            age,
            marital_status: status,
            role,
        }
    }

    pub(super) fn manager() -> User {
        user("T8765432F", "Michael", 36, MaritalStatus::Single, Role::Manager)
    }

    pub(super) fn officer() -> User {
        user("T2109876H", "Daniel", 36, MaritalStatus::Single, Role::Officer)
    }

    pub(super) fn couple() -> User {
        user("S1234567A", "John", 30, MaritalStatus::Married, Role::Applicant)
    }

    pub(super) fn young_single() -> User {
        user("T7654321B", "Sarah", 30, MaritalStatus::Single, Role::Applicant)
    }

    pub(super) fn acacia() -> ProjectDraft {
        ProjectDraft {
            name: "Acacia".to_string(),
            neighborhood: "Yishun".to_string(),
            open_date: "01/06/2024".to_string(),
            close_date: "30/06/2024".to_string(),
            officer_slots: 3,
            visible: true,
            flats: vec![
                FlatOffer {
                    flat_type: "2-room".to_string(),
                    units: "10".to_string(),
                    price: "300000".to_string(),
                },
                FlatOffer {
                    flat_type: "3-room".to_string(),
                    units: "4".to_string(),
                    price: "450000".to_string(),
                },
            ],
        }
    }

    pub(super) fn portal_with(config: EligibilityConfig) -> HousingPortal {
        let portal = HousingPortal::new(
            HousingStores::in_memory(),
            EligibilityPolicy::from(&config),
        );
        for user in [manager(), officer(), couple(), young_single()] {
            portal.enroll(user).expect("user enrolls");
        }
        portal
    }
}

use common::*;
use hdb_housing::config::EligibilityConfig;
use hdb_housing::workflows::housing::{ApplicationStatus, ErrorKind, FlatType};

#[test]
fn acacia_is_created_applied_for_approved_and_booked() {
    let portal = portal_with(EligibilityConfig::default());
    let project = portal
        .projects()
        .create_project(&manager(), acacia())
        .expect("manager creates Acacia");
    assert_eq!(project.flats[&FlatType::TwoRoom].remaining_units, 10);

    portal
        .registrations()
        .register_for_project(&officer(), "Acacia", date(2024, 5, 20))
        .expect("officer registers");
    portal
        .registrations()
        .approve_registration(&manager(), &officer().nric, "Acacia")
        .expect("manager approves officer");

    let within_window = date(2024, 6, 10);
    let application = portal
        .applications()
        .apply_for_project(&couple(), "Acacia", "2-room", within_window)
        .expect("couple applies");
    assert_eq!(application.status, ApplicationStatus::Pending);

    let approved = portal
        .applications()
        .approve_application(&manager(), &couple().nric)
        .expect("manager approves");
    assert_eq!(approved.status, ApplicationStatus::Approved);
    let units = portal
        .projects()
        .project("Acacia")
        .expect("project stored")
        .flats[&FlatType::TwoRoom]
        .remaining_units;
    assert_eq!(units, 9);

    let booked = portal
        .applications()
        .complete_booking(&officer(), &couple().nric, date(2024, 6, 12))
        .expect("officer books");
    assert_eq!(booked.status, ApplicationStatus::Booked);

    let receipt = portal
        .applications()
        .generate_booking_receipt(&couple().nric)
        .expect("receipt issued");
    assert_eq!(receipt.price, 300_000);
    assert_eq!(receipt.project, "Acacia");
    assert_eq!(receipt.booked_by, officer().nric);
}

#[test]
fn single_applicant_aged_thirty_is_refused_a_three_room_flat() {
    let portal = portal_with(EligibilityConfig::default());
    portal
        .projects()
        .create_project(&manager(), acacia())
        .expect("manager creates Acacia");

    let err = portal
        .applications()
        .apply_for_project(&young_single(), "Acacia", "3-room", date(2024, 6, 10))
        .expect_err("ineligible");
    assert_eq!(err.kind(), ErrorKind::BusinessRuleError);
}

#[test]
fn configured_minimum_ages_drive_eligibility() {
    let portal = portal_with(EligibilityConfig {
        single_min_age: 28,
        married_min_age: 31,
    });
    portal
        .projects()
        .create_project(&manager(), acacia())
        .expect("manager creates Acacia");
    let today = date(2024, 6, 10);

    portal
        .applications()
        .apply_for_project(&young_single(), "Acacia", "2-room", today)
        .expect("single at 30 meets a lowered threshold");
    let err = portal
        .applications()
        .apply_for_project(&couple(), "Acacia", "2-room", today)
        .expect_err("married at 30 misses a raised threshold");
    assert_eq!(err.kind(), ErrorKind::BusinessRuleError);
}
