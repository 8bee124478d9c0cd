use serde::Serialize;

use super::repository::RepositoryError;

/// Coarse classification of every failure raised by the housing controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    NotFoundError,
    AuthorizationError,
    BusinessRuleError,
    SystemError,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFoundError => "NOT_FOUND_ERROR",
            Self::AuthorizationError => "AUTHORIZATION_ERROR",
            Self::BusinessRuleError => "BUSINESS_RULE_ERROR",
            Self::SystemError => "SYSTEM_ERROR",
        }
    }
}

/// Error raised by the housing controllers. Only `System` carries a cause.
#[derive(Debug, thiserror::Error)]
pub enum HousingError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not permitted: {0}")]
    Authorization(String),
    #[error("rejected: {0}")]
    BusinessRule(String),
    #[error("{context}: {source}")]
    System {
        context: String,
        #[source]
        source: RepositoryError,
    },
}

pub type HousingResult<T> = Result<T, HousingError>;

impl HousingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn rule(msg: impl Into<String>) -> Self {
        Self::BusinessRule(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::NotFound(_) => ErrorKind::NotFoundError,
            Self::Authorization(_) => ErrorKind::AuthorizationError,
            Self::BusinessRule(_) => ErrorKind::BusinessRuleError,
            Self::System { .. } => ErrorKind::SystemError,
        }
    }
}

impl From<RepositoryError> for HousingError {
    fn from(source: RepositoryError) -> Self {
        Self::System {
            context: "housing store failure".to_string(),
            source,
        }
    }
}
