//! Shared error types and utilities for the confcentral project.
pub use color_eyre::Report;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Failed to install color_eyre")]
    ColorEyre(#[from] color_eyre::Report),
    #[error("Failed to install tracing-subscriber")]
    TracingSubscriber(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Reasons a client-supplied filter list cannot be compiled into a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Filter contains invalid field: {0}")]
    InvalidField(String),
    #[error("Filter contains invalid operator: {0}")]
    InvalidOperator(String),
    #[error("Filter value {value:?} is not valid for field {field}")]
    InvalidValue { field: &'static str, value: String },
    #[error("Inequality filter is allowed on only one field, got {first} and {second}")]
    MultipleInequalityFields {
        first: &'static str,
        second: &'static str,
    },
}

/// The coarse classes callers see; each maps onto one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    BadRequest,
    Conflict,
    Unavailable,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Unavailable => "UNAVAILABLE",
        }
    }
}

/// Errors returned by every Conference Central operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Authorization required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("You have already registered for this conference")]
    AlreadyRegistered,
    #[error("There are no seats available")]
    NoSeatsAvailable,
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("Backing service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Unauthenticated => ErrorKind::Unauthenticated,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::BadRequest(_) => ErrorKind::BadRequest,
            ServiceError::AlreadyRegistered | ServiceError::NoSeatsAvailable => {
                ErrorKind::Conflict
            }
            ServiceError::Filter(FilterError::MultipleInequalityFields { .. }) => {
                ErrorKind::Conflict
            }
            ServiceError::Filter(_) => ErrorKind::BadRequest,
            ServiceError::Unavailable(_) => ErrorKind::Unavailable,
        }
    }

    pub fn conference_not_found(key: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("No conference found with key: {key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_conflicts_share_a_kind() {
        assert_eq!(ServiceError::AlreadyRegistered.kind(), ErrorKind::Conflict);
        assert_eq!(ServiceError::NoSeatsAvailable.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn filter_errors_split_between_bad_request_and_conflict() {
        let invalid = ServiceError::from(FilterError::InvalidField("COLOR".to_string()));
        assert_eq!(invalid.kind(), ErrorKind::BadRequest);

        let multiple = ServiceError::from(FilterError::MultipleInequalityFields {
            first: "month",
            second: "maxAttendees",
        });
        assert_eq!(multiple.kind(), ErrorKind::Conflict);
    }
}
