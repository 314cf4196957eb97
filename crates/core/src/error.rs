//! Error types for the medplan domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `PlanError` is the single
//! typed failure surfaced by a plan build.

use thiserror::Error;

use crate::knowledge::KnowledgeTask;

/// The top-level error type for all medplan operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Plan pipeline errors ---
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Input errors ---
    #[error("Invalid input {origin}: {message}")]
    Input { origin: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures talking to the drug-interaction registry.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Registry returned status {status_code}")]
    Unavailable { status_code: u16 },

    #[error("Registry network error: {0}")]
    Network(String),

    #[error("Invalid registry payload: {0}")]
    InvalidPayload(String),

    #[error("No registry concept matches '{0}'")]
    DrugNotFound(String),
}

/// Failures of a knowledge-generation call before its output is validated.
#[derive(Debug, Clone, Error)]
pub enum KnowledgeError {
    #[error("Provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Response is not JSON: {0}")]
    NotJson(String),

    #[error("Could not encode request: {0}")]
    Encode(String),
}

/// A structural violation in untrusted generator output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected {expected}, got {found}")]
    WrongShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing key '{key}'")]
    MissingKey { key: String },

    #[error("unexpected key '{key}'")]
    UnexpectedKey { key: String },

    #[error("key '{key}': expected {expectation}")]
    InvalidField {
        key: String,
        expectation: String,
    },

    #[error("expected {expected} entries, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// The single typed failure of a medication-plan build.
///
/// There is no partial-success mode: any of these aborts the whole plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Drug '{name}' appears more than once in the input")]
    DuplicateDrug { name: String },

    #[error("Drug at position {position} has an empty name")]
    EmptyDrugName { position: usize },

    #[error("The drug registry returned status code {status_code}")]
    RegistryUnavailable { status_code: u16 },

    #[error("Drug registry failure: {0}")]
    Registry(RegistryError),

    #[error("The registry reported no interactions between the given drugs")]
    NoInteractionsFound,

    #[error("Malformed {task} response: {source}")]
    MalformedKnowledgeResponse {
        task: KnowledgeTask,
        #[source]
        source: ValidationError,
    },

    #[error("{task} references unknown drug '{name}'")]
    UnknownDrugReference { task: KnowledgeTask, name: String },

    #[error("{task} generation failed: {source}")]
    KnowledgeUnavailable {
        task: KnowledgeTask,
        #[source]
        source: KnowledgeError,
    },
}

impl From<RegistryError> for PlanError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Unavailable { status_code } => Self::RegistryUnavailable { status_code },
            other => Self::Registry(other),
        }
    }
}

impl PlanError {
    /// Map a generator failure for `task` into the plan taxonomy.
    ///
    /// Text that is not JSON is a structural failure of the response, not of
    /// the generator.
    pub fn from_knowledge(task: KnowledgeTask, err: KnowledgeError) -> Self {
        match err {
            KnowledgeError::NotJson(reason) => Self::MalformedKnowledgeResponse {
                task,
                source: ValidationError::InvalidField {
                    key: "<root>".into(),
                    expectation: format!("a JSON document ({reason})"),
                },
            },
            other => Self::KnowledgeUnavailable { task, source: other },
        }
    }

    /// The task this error is attributed to, if any.
    pub fn task(&self) -> Option<KnowledgeTask> {
        match self {
            Self::MalformedKnowledgeResponse { task, .. }
            | Self::UnknownDrugReference { task, .. }
            | Self::KnowledgeUnavailable { task, .. } => Some(*task),
            _ => None,
        }
    }
}
