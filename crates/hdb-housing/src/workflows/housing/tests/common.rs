use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::housing::controllers::{
    EnquiryIdSource, FlatOffer, ProjectDraft, SequentialEnquiryIds,
};
use crate::workflows::housing::domain::{
    Application, EnquiryId, MaritalStatus, Nric, Project, Role, User,
};
use crate::workflows::housing::eligibility::EligibilityPolicy;
use crate::workflows::housing::error::ErrorKind;
use crate::workflows::housing::portal::HousingPortal;
use crate::workflows::housing::repository::{
    HousingStores, InMemoryRepository, Record, Repository, RepositoryError,
};

pub(super) const ACACIA: &str = "Acacia";
pub(super) const BEGONIA: &str = "Begonia";

pub(super) fn nric(raw: &str) -> Nric {
    Nric::parse(raw).expect("fixture NRIC is well formed")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// A day inside the Acacia application window.
pub(super) fn mid_june() -> NaiveDate {
    date(2024, 6, 15)
}

fn user(raw: &str, name: &str, age: u8, marital_status: MaritalStatus, role: Role) -> User {
    User {
        nric: nric(raw),
        name: name.to_string(),
        age,
        marital_status,
        role,
    }
}

pub(super) fn manager() -> User {
    user("T8765432F", "Michael", 36, MaritalStatus::Single, Role::Manager)
}

pub(super) fn other_manager() -> User {
    user("S5678901G", "Jessica", 26, MaritalStatus::Married, Role::Manager)
}

pub(super) fn officer() -> User {
    user("T2109876H", "Daniel", 36, MaritalStatus::Single, Role::Officer)
}

pub(super) fn other_officer() -> User {
    user("S6543210I", "Emily", 28, MaritalStatus::Single, Role::Officer)
}

pub(super) fn married_applicant() -> User {
    user("S1234567A", "John", 30, MaritalStatus::Married, Role::Applicant)
}

pub(super) fn young_single() -> User {
    user("T7654321B", "Sarah", 30, MaritalStatus::Single, Role::Applicant)
}

pub(super) fn senior_single() -> User {
    user("S9876543C", "Grace", 37, MaritalStatus::Single, Role::Applicant)
}

pub(super) fn offer(flat_type: &str, units: &str, price: &str) -> FlatOffer {
    FlatOffer {
        flat_type: flat_type.to_string(),
        units: units.to_string(),
        price: price.to_string(),
    }
}

/// Acacia: June 2024, 10 two-room units at 300000 and 5 three-room at 450000.
pub(super) fn acacia_draft() -> ProjectDraft {
    ProjectDraft {
        name: ACACIA.to_string(),
        neighborhood: "Yishun".to_string(),
        open_date: "01/06/2024".to_string(),
        close_date: "30/06/2024".to_string(),
        officer_slots: 3,
        visible: true,
        flats: vec![offer("2-room", "10", "300000"), offer("3-room", "5", "450000")],
    }
}

/// Begonia: August 2024, two-room only.
pub(super) fn begonia_draft() -> ProjectDraft {
    ProjectDraft {
        name: BEGONIA.to_string(),
        neighborhood: "Boon Lay".to_string(),
        open_date: "01/08/2024".to_string(),
        close_date: "31/08/2024".to_string(),
        officer_slots: 1,
        visible: true,
        flats: vec![offer("2-room", "2", "250000")],
    }
}

pub(super) struct Harness {
    pub(super) stores: HousingStores,
    pub(super) portal: HousingPortal,
}

pub(super) fn harness_with_ids(ids: Arc<dyn EnquiryIdSource>) -> Harness {
    harness_over(HousingStores::in_memory(), ids)
}

pub(super) fn harness_over(stores: HousingStores, ids: Arc<dyn EnquiryIdSource>) -> Harness {
    let portal = HousingPortal::with_enquiry_ids(stores.clone(), EligibilityPolicy::default(), ids);
    for user in [
        manager(),
        other_manager(),
        officer(),
        other_officer(),
        married_applicant(),
        young_single(),
        senior_single(),
    ] {
        portal.enroll(user).expect("fixture user enrolls");
    }
    Harness { stores, portal }
}

/// Every fixture user enrolled and no projects yet.
pub(super) fn empty_harness() -> Harness {
    harness_with_ids(Arc::new(SequentialEnquiryIds::default()))
}

/// Acacia created by `manager()` with `officer()` approved to handle it.
pub(super) fn acacia_harness() -> Harness {
    acacia_harness_over(HousingStores::in_memory())
}

pub(super) fn acacia_harness_over(stores: HousingStores) -> Harness {
    let harness = harness_over(stores, Arc::new(SequentialEnquiryIds::default()));
    harness
        .portal
        .projects()
        .create_project(&manager(), acacia_draft())
        .expect("Acacia is created");
    assign_officer(&harness.portal, &officer(), ACACIA);
    harness
}

pub(super) fn assign_officer(portal: &HousingPortal, officer: &User, project: &str) {
    portal
        .registrations()
        .register_for_project(officer, project, date(2024, 5, 20))
        .expect("officer registers");
    portal
        .registrations()
        .approve_registration(&manager(), &officer.nric, project)
        .expect("manager approves officer");
}

pub(super) fn apply(portal: &HousingPortal, applicant: &User, flat_type: &str) -> Application {
    portal
        .applications()
        .apply_for_project(applicant, ACACIA, flat_type, mid_june())
        .expect("application accepted")
}

pub(super) fn remaining(portal: &HousingPortal, project: &str, flat_type: &str) -> u32 {
    let project: Project = portal.projects().project(project).expect("project exists");
    project
        .flats
        .get(&flat_type.parse().expect("flat type parses"))
        .map(|inventory| inventory.remaining_units)
        .expect("flat type offered")
}

pub(super) fn assert_kind<T: std::fmt::Debug>(
    result: Result<T, crate::workflows::housing::error::HousingError>,
    expected: ErrorKind,
) {
    match result {
        Err(err) => assert_eq!(err.kind(), expected, "unexpected error: {err}"),
        Ok(value) => panic!("expected {expected:?}, got {value:?}"),
    }
}

/// Store that refuses every operation.
pub(super) struct OfflineRepository;

impl<R: Record> Repository<R> for OfflineRepository {
    fn all(&self) -> Result<Vec<R>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _key: &R::Key) -> Result<Option<R>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save(&self, _record: R) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _key: &R::Key) -> Result<Option<R>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// In-memory store whose writes can be switched off mid-test.
pub(super) struct FlakyRepository<R: Record> {
    inner: InMemoryRepository<R>,
    failing: AtomicBool,
}

impl<R: Record> FlakyRepository<R> {
    pub(super) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryRepository::default(),
            failing: AtomicBool::new(false),
        })
    }

    pub(super) fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("disk full".to_string()));
        }
        Ok(())
    }
}

impl<R: Record> Repository<R> for FlakyRepository<R> {
    fn all(&self) -> Result<Vec<R>, RepositoryError> {
        self.inner.all()
    }

    fn fetch(&self, key: &R::Key) -> Result<Option<R>, RepositoryError> {
        self.inner.fetch(key)
    }

    fn save(&self, record: R) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.save(record)
    }

    fn remove(&self, key: &R::Key) -> Result<Option<R>, RepositoryError> {
        self.check()?;
        self.inner.remove(key)
    }
}

/// Hands out a scripted run of ids, then repeats the last one forever.
pub(super) struct ScriptedIds {
    script: Mutex<VecDeque<EnquiryId>>,
    last: EnquiryId,
}

impl ScriptedIds {
    pub(super) fn new(ids: &[&str]) -> Self {
        let script: VecDeque<EnquiryId> = ids.iter().map(|id| EnquiryId(id.to_string())).collect();
        let last = script
            .back()
            .cloned()
            .unwrap_or_else(|| EnquiryId("ENQ-000000".to_string()));
        Self {
            script: Mutex::new(script),
            last,
        }
    }
}

impl EnquiryIdSource for ScriptedIds {
    fn next_id(&self) -> EnquiryId {
        let next = self.script.lock().expect("script mutex poisoned").pop_front();
        next.unwrap_or_else(|| self.last.clone())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
