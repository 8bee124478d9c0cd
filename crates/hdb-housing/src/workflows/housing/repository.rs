use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Application, Enquiry, EnquiryId, Nric, OfficerRegistration, Project, RegistrationKey, User,
};

/// Anything the portal persists, addressed by a stable key.
pub trait Record: Clone + Send + Sync + 'static {
    type Key: Ord + Clone + fmt::Debug + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

impl Record for User {
    type Key = Nric;

    fn key(&self) -> Nric {
        self.nric.clone()
    }
}

impl Record for Project {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// One application per applicant, so the applicant's NRIC is the key.
impl Record for Application {
    type Key = Nric;

    fn key(&self) -> Nric {
        self.applicant.clone()
    }
}

impl Record for Enquiry {
    type Key = EnquiryId;

    fn key(&self) -> EnquiryId {
        self.id.clone()
    }
}

impl Record for OfficerRegistration {
    type Key = RegistrationKey;

    fn key(&self) -> RegistrationKey {
        RegistrationKey {
            officer: self.officer.clone(),
            project: self.project.clone(),
        }
    }
}

/// Storage abstraction so controllers can be exercised against any backend.
pub trait Repository<R: Record>: Send + Sync {
    fn all(&self) -> Result<Vec<R>, RepositoryError>;
    fn fetch(&self, key: &R::Key) -> Result<Option<R>, RepositoryError>;
    /// Create or replace the record stored under `record.key()`.
    fn save(&self, record: R) -> Result<(), RepositoryError>;
    fn remove(&self, key: &R::Key) -> Result<Option<R>, RepositoryError>;
}

pub type SharedRepository<R> = Arc<dyn Repository<R>>;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Mutex-guarded map used by the service binary, the demo, and tests.
pub struct InMemoryRepository<R: Record> {
    records: Mutex<BTreeMap<R::Key, R>>,
}

impl<R: Record> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<R: Record> InMemoryRepository<R> {
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.key(), record))
            .collect();
        Self {
            records: Mutex::new(records),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, BTreeMap<R::Key, R>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl<R: Record> Repository<R> for InMemoryRepository<R> {
    fn all(&self) -> Result<Vec<R>, RepositoryError> {
        Ok(self.guard()?.values().cloned().collect())
    }

    fn fetch(&self, key: &R::Key) -> Result<Option<R>, RepositoryError> {
        Ok(self.guard()?.get(key).cloned())
    }

    fn save(&self, record: R) -> Result<(), RepositoryError> {
        self.guard()?.insert(record.key(), record);
        Ok(())
    }

    fn remove(&self, key: &R::Key) -> Result<Option<R>, RepositoryError> {
        Ok(self.guard()?.remove(key))
    }
}

/// The full set of stores a portal instance works against.
#[derive(Clone)]
pub struct HousingStores {
    pub users: SharedRepository<User>,
    pub projects: SharedRepository<Project>,
    pub applications: SharedRepository<Application>,
    pub enquiries: SharedRepository<Enquiry>,
    pub registrations: SharedRepository<OfficerRegistration>,
}

impl HousingStores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryRepository::<User>::default()),
            projects: Arc::new(InMemoryRepository::<Project>::default()),
            applications: Arc::new(InMemoryRepository::<Application>::default()),
            enquiries: Arc::new(InMemoryRepository::<Enquiry>::default()),
            registrations: Arc::new(InMemoryRepository::<OfficerRegistration>::default()),
        }
    }
}
