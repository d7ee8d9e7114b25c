use crate::permission::IdentityError;
use crate::storage::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Product,
    Organization,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Product => write!(f, "product"),
            RecordKind::Organization => write!(f, "organization"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Get,
    Put,
}

impl std::fmt::Display for StoreAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreAction::Get => write!(f, "get"),
            StoreAction::Put => write!(f, "put"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerErrorCode {
    ArgumentCount,
    TransientMissing,
    TransientEmpty,
    Decode,
    Encode,
    Validation,
    PermissionDenied,
    Identity,
    Store,
    NotFound,
    AlreadyExists,
    UnknownFunction,
    InvalidConfig,
    Io,
}

impl LedgerErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerErrorCode::ArgumentCount => "argument_count",
            LedgerErrorCode::TransientMissing => "transient_missing",
            LedgerErrorCode::TransientEmpty => "transient_empty",
            LedgerErrorCode::Decode => "decode",
            LedgerErrorCode::Encode => "encode",
            LedgerErrorCode::Validation => "validation",
            LedgerErrorCode::PermissionDenied => "permission_denied",
            LedgerErrorCode::Identity => "identity",
            LedgerErrorCode::Store => "store",
            LedgerErrorCode::NotFound => "not_found",
            LedgerErrorCode::AlreadyExists => "already_exists",
            LedgerErrorCode::UnknownFunction => "unknown_function",
            LedgerErrorCode::InvalidConfig => "invalid_config",
            LedgerErrorCode::Io => "io",
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("incorrect number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{key} must be a key in the transient map")]
    TransientMissing { key: &'static str },
    #[error("{key} value in the transient map must be a non-empty JSON string")]
    TransientEmpty { key: &'static str },
    #[error("failed to decode JSON of: {raw}")]
    TransientDecode { key: &'static str, raw: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("{0}")]
    Validation(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("failed to {action} {kind} '{key}': {source}")]
    Store {
        action: StoreAction,
        kind: RecordKind,
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("{kind} does not exist: {key}")]
    NotFound { kind: RecordKind, key: String },
    #[error("this {kind} already exists: {key}")]
    AlreadyExists { kind: RecordKind, key: String },
    #[error("received unknown function invocation: {0}")]
    UnknownFunction(String),
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn code(&self) -> LedgerErrorCode {
        match self {
            LedgerError::ArgumentCount { .. } => LedgerErrorCode::ArgumentCount,
            LedgerError::TransientMissing { .. } => LedgerErrorCode::TransientMissing,
            LedgerError::TransientEmpty { .. } => LedgerErrorCode::TransientEmpty,
            LedgerError::TransientDecode { .. } | LedgerError::Decode(_) => LedgerErrorCode::Decode,
            LedgerError::Encode(_) => LedgerErrorCode::Encode,
            LedgerError::Validation(_) => LedgerErrorCode::Validation,
            LedgerError::PermissionDenied(_) => LedgerErrorCode::PermissionDenied,
            LedgerError::Identity(_) => LedgerErrorCode::Identity,
            LedgerError::Store { .. } => LedgerErrorCode::Store,
            LedgerError::NotFound { .. } => LedgerErrorCode::NotFound,
            LedgerError::AlreadyExists { .. } => LedgerErrorCode::AlreadyExists,
            LedgerError::UnknownFunction(_) => LedgerErrorCode::UnknownFunction,
            LedgerError::InvalidConfig { .. } => LedgerErrorCode::InvalidConfig,
            LedgerError::Io(_) => LedgerErrorCode::Io,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }

    /// Renders the error as the `{"Error":"..."}` body returned to callers.
    pub fn to_error_json(&self) -> String {
        serde_json::json!({ "Error": self.to_string() }).to_string()
    }
}
