use thiserror::Error;

/// Error type for Labelbase client operations.
///
/// Only conditions detected *before* a request is sent are returned as
/// errors. A request that reaches the remote service and fails is logged and
/// surfaces as "no result" (`None` / `false`) from the operation instead.
///
/// - `MissingLabelbaseSelection`: no labelbase id given and none selected
/// - `Validation`: label fields violate the type-conditional rules
/// - `Transport`: the HTTP transport could not be constructed
/// - `Config`: missing or malformed configuration
#[derive(Debug, Error)]
pub enum LabelbaseError {
    #[error("No labelbase ID provided and no current labelbase selected")]
    MissingLabelbaseSelection,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Label field combinations rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No data provided for label creation")]
    NoData,

    #[error("'origin' is only valid when 'type' is 'tx' (got '{found}')")]
    OriginRequiresTx { found: String },

    #[error("'spendable' is only valid when 'type' is 'output' (got '{found}')")]
    SpendableRequiresOutput { found: String },

    #[error("'{key}' cannot be passed as an extra field")]
    ReservedField { key: String },
}

/// Failure reported by the HTTP collaborator for a single request.
///
/// - `InvalidApiKey`: the key cannot be sent as a header value
/// - `RequestFailed`: network/transport errors (wraps `reqwest::Error`)
/// - `Authentication`: HTTP 401
/// - `PermissionDenied`: HTTP 403
/// - `NotFound`: HTTP 404
/// - `Validation`: HTTP 400/422, carries the response body
/// - `Api`: any other non-2xx status code
/// - `Decode`: a success response whose body is not valid JSON
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid API key: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Rejected by server: {message}")]
    Validation {
        message: String,
        errors: Option<serde_json::Value>,
    },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response body: {message}")]
    Decode { message: String },
}

pub type Result<T> = std::result::Result<T, LabelbaseError>;
