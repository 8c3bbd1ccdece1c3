use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfilerError {
    // ------------------------------------------------------------------
    // Input errors: analysis never starts
    // ------------------------------------------------------------------
    #[error("The archive is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("This looks like a .zip archive. Extract it first and load the conversations.json file inside")]
    ZipArchive,

    #[error("Unrecognized archive structure: {0}")]
    UnrecognizedArchive(String),

    #[error("Failed to read archive from {path}: {source}")]
    ArchiveRead { path: PathBuf, source: io::Error },

    // ------------------------------------------------------------------
    // Catalog errors
    // ------------------------------------------------------------------
    #[error("Failed to read skill catalog from {path}: {source}")]
    CatalogRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse skill catalog: {0}")]
    CatalogParse(String),

    #[error("Duplicate skill_id in catalog: {0}")]
    DuplicateSkill(String),

    // ------------------------------------------------------------------
    // Remote-call errors: terminal for the run
    // ------------------------------------------------------------------
    #[error("Network error during {label}: {message}")]
    Network { label: String, message: String },

    #[error("API error during {label} (HTTP {status}): {message}")]
    ApiStatus {
        label: String,
        status: u16,
        message: String,
    },

    #[error("Malformed {phase} response: {details}")]
    MalformedResponse { phase: String, details: String },

    #[error("No API key configured (set ANTHROPIC_API_KEY or pass --api-key)")]
    MissingApiKey,

    // ------------------------------------------------------------------
    // Orchestration / configuration
    // ------------------------------------------------------------------
    #[error("An analysis is already running")]
    AnalysisInProgress,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProfilerError {
    /// True for failures raised before any analysis stage ran.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ProfilerError::InvalidJson(_)
                | ProfilerError::ZipArchive
                | ProfilerError::UnrecognizedArchive(_)
                | ProfilerError::ArchiveRead { .. }
        )
    }

    /// True for failures of the remote backend.
    pub fn is_remote_error(&self) -> bool {
        matches!(
            self,
            ProfilerError::Network { .. }
                | ProfilerError::ApiStatus { .. }
                | ProfilerError::MalformedResponse { .. }
                | ProfilerError::MissingApiKey
        )
    }
}

pub type Result<T> = std::result::Result<T, ProfilerError>;
