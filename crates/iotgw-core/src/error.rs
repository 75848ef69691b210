//! Error types for the record store and the services built on it

use thiserror::Error;

use crate::id::RecordId;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Raised when a string is not a well-formed record identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformatted id: {0}")]
pub struct ParseIdError(pub String);

/// Errors reported by a [`RecordStore`](crate::store::RecordStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field collides with an existing record
    #[error("{collection} validation failed: {field} `{value}` must be unique")]
    Duplicate {
        collection: &'static str,
        field: &'static str,
        value: String,
    },

    /// Update targeted a record that does not exist
    #[error("{collection} not found: {id}")]
    Missing {
        collection: &'static str,
        id: RecordId,
    },

    /// Storage backend cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the gateway and device services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Field constraint or uniqueness violation
    #[error("{0}")]
    Validation(String),

    /// Device creation without a gateway reference
    #[error("Gateway not selected")]
    MissingGateway,

    /// Device creation referencing a gateway that does not resolve
    #[error("Gateway not exist or invalid")]
    GatewayNotFound { gateway_id: String },

    /// Gateway already owns the maximum number of devices
    #[error("No more that {limit} peripheral devices are allowed for a gateway")]
    CapacityExceeded { gateway_id: RecordId, limit: usize },

    /// Gateway address is missing or not a dotted-quad IPv4 address
    #[error("IP missing or invalid")]
    InvalidAddress,

    /// Identifier syntax is wrong
    #[error(transparent)]
    InvalidIdentifier(#[from] ParseIdError),

    /// Well-formed identifier, but no such record
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: RecordId },

    /// Storage backend failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Build a validation error from `validator` output
    pub fn invalid(entity: &str, errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect();
        fields.sort();
        ServiceError::Validation(format!("{} validation failed: {}", entity, fields.join("; ")))
    }

    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::MissingGateway => "missing_gateway",
            ServiceError::GatewayNotFound { .. } => "gateway_not_found",
            ServiceError::CapacityExceeded { .. } => "capacity_exceeded",
            ServiceError::InvalidAddress => "invalid_address",
            ServiceError::InvalidIdentifier(_) => "invalid_identifier",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::Unavailable(_) => "store_unavailable",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound { .. } => 404,
            ServiceError::Unavailable(_) => 503,
            _ => 400,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { .. } => ServiceError::Validation(err.to_string()),
            StoreError::Missing { collection, id } => ServiceError::NotFound {
                entity: collection,
                id,
            },
            StoreError::Unavailable(msg) => ServiceError::Unavailable(msg),
        }
    }
}
