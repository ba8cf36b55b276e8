/// Pre-execution screening: size guards and a token denylist.
///
/// Runs before a workspace is even acquired, so a rejected submission never
/// touches the filesystem or spawns a process. The denylist is a coarse
/// substring filter and is not an isolation mechanism.
use examiner_common::config::{EngineConfig, ScreeningConfig};
use examiner_common::types::{ExecutionResult, Language};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Screening {
    max_source_bytes: usize,
    max_stdin_bytes: usize,
    denylist: ScreeningConfig,
}

impl Screening {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_source_bytes: config.max_source_bytes,
            max_stdin_bytes: config.max_stdin_bytes,
            denylist: config.screening.clone(),
        }
    }

    /// `Some(rejection)` when the source must not be compiled or run
    pub fn check_source(&self, language: Language, source: &str) -> Option<ExecutionResult> {
        if source.len() > self.max_source_bytes {
            return Some(ExecutionResult::rejected(format!(
                "Source code exceeds maximum size of {} bytes",
                self.max_source_bytes
            )));
        }

        if !self.denylist.enabled {
            return None;
        }

        let token = self
            .denylist
            .denied_for(language.family())
            .iter()
            .find(|token| !token.is_empty() && source.contains(token.as_str()))?;

        info!(language = %language, token = %token, "Submission rejected by denylist");
        Some(ExecutionResult::rejected(format!(
            "Source code uses a disallowed construct: {}",
            token
        )))
    }

    /// `Some(rejection)` when a stdin payload is too large to feed to a run
    pub fn check_input(&self, input: &str) -> Option<ExecutionResult> {
        (input.len() > self.max_stdin_bytes).then(|| {
            ExecutionResult::rejected(format!(
                "Input exceeds maximum size of {} bytes",
                self.max_stdin_bytes
            ))
        })
    }
}
