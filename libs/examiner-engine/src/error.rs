use examiner_common::types::UnsupportedLanguage;
use thiserror::Error;

/// Errors that can cross the engine's library boundary.
///
/// Child-process failures never show up here; they are reported on
/// `ExecutionResult`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),

    #[error("invalid engine configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("workspace root unusable: {0:#}")]
    Workspace(anyhow::Error),
}
