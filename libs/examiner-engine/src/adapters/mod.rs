/// Language Adapters
///
/// **Responsibility:**
/// Turn submitted source into something the Process Runner can execute:
/// normalize it, write it into the session workspace, compile it when the
/// language needs compiling, and describe how to launch the result.
///
/// **Contract:**
/// - `prepare` is pure text rewriting, no I/O
/// - `compile` runs at most once per submission; failure short-circuits every
///   run with the returned `ExecutionResult`
/// - `run` never fails with `Err`; every problem is an `ExecutionResult`
///
/// Adapters know nothing about test cases or scoring.
pub mod java;
pub mod native;
pub mod python;

use crate::probe::remediation_hint;
use crate::process::{CommandSpec, ProcessRunner};
use crate::workspace::Workspace;
use async_trait::async_trait;
use examiner_common::config::EngineConfig;
use examiner_common::types::{ExecutionResult, Language, LanguageFamily};
use std::time::Duration;
use tracing::debug;

/// Source text after language-specific rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSource {
    /// File name inside the workspace
    pub file_name: String,
    pub source: String,
    /// Class to launch, for languages that need one
    pub entry_point: Option<String>,
}

/// A compiled (or interpretable) program ready to be launched per input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub command: CommandSpec,
    pub stderr_is_failure: bool,
    /// Remediation hint when `command` is a toolchain binary that may be
    /// missing from the host
    pub missing_hint: Option<&'static str>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> Language;

    fn prepare(&self, source: &str) -> NormalizedSource;

    async fn compile(
        &self,
        source: &NormalizedSource,
        workspace: &Workspace,
    ) -> Result<Program, ExecutionResult>;

    async fn run(&self, program: &Program, stdin: &str, time_limit: Duration) -> ExecutionResult;
}

/// Settings every adapter shares
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    pub runner: ProcessRunner,
    pub compile_timeout: Duration,
    pub stderr_is_failure: bool,
}

impl AdapterSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            runner: ProcessRunner::new(config.max_output_bytes),
            compile_timeout: Duration::from_millis(config.compile_timeout_ms),
            stderr_is_failure: config.stderr_is_failure,
        }
    }
}

/// Write `source` into the workspace, mapping I/O errors to a result
pub(crate) async fn write_source(
    workspace: &Workspace,
    source: &NormalizedSource,
) -> Result<(), ExecutionResult> {
    workspace
        .write_file(&source.file_name, &source.source)
        .await
        .map(|_| ())
        .map_err(|e| ExecutionResult::infrastructure(format!("{:#}", e)))
}

/// Run one compiler invocation.
///
/// Only the exit status decides success; compilers print warnings on stderr.
pub(crate) async fn compile_step(
    settings: &AdapterSettings,
    command: &CommandSpec,
    family: LanguageFamily,
) -> Result<(), ExecutionResult> {
    let output = settings
        .runner
        .spawn(command, "", settings.compile_timeout)
        .await;

    if output.binary_missing() {
        return Err(ExecutionResult::toolchain_missing(format!(
            "`{}` not found: {}",
            command.display_program(),
            remediation_hint(family)
        )));
    }
    if let Some(e) = &output.spawn_error {
        return Err(ExecutionResult::infrastructure(format!(
            "Failed to start `{}`: {}",
            command.display_program(),
            e
        )));
    }
    if output.timed_out {
        return Err(ExecutionResult::compile_error(format!(
            "Compilation timed out after {}ms",
            settings.compile_timeout.as_millis()
        )));
    }
    if !output.exited_cleanly() {
        debug!(program = %command.display_program(), exit_code = ?output.exit_code(), "Compilation failed");
        return Err(ExecutionResult::compile_error(output.diagnostic()));
    }

    debug!(
        program = %command.display_program(),
        compile_time_ms = output.elapsed_ms(),
        "Compilation succeeded"
    );
    Ok(())
}

/// Launch a prepared program once
pub(crate) async fn run_program(
    runner: &ProcessRunner,
    program: &Program,
    stdin: &str,
    time_limit: Duration,
) -> ExecutionResult {
    let output = runner.spawn(&program.command, stdin, time_limit).await;

    match program.missing_hint {
        Some(hint) if output.binary_missing() => ExecutionResult::toolchain_missing(format!(
            "`{}` not found: {}",
            program.command.display_program(),
            hint
        )),
        _ => output.into_execution_result(program.stderr_is_failure),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use examiner_common::types::Failure;

    fn settings() -> AdapterSettings {
        AdapterSettings {
            runner: ProcessRunner::new(4096),
            compile_timeout: Duration::from_secs(5),
            stderr_is_failure: true,
        }
    }

    #[tokio::test]
    async fn test_compile_step_missing_compiler() {
        let command = CommandSpec::new("examiner-missing-cc").arg("main.cpp");
        let result = compile_step(&settings(), &command, LanguageFamily::Native)
            .await
            .unwrap_err();

        assert_eq!(result.failure, Some(Failure::ToolchainUnavailable));
        assert!(result.error.unwrap().contains("install g++"));
    }

    #[tokio::test]
    async fn test_compile_step_failure_keeps_diagnostic() {
        let command = CommandSpec::new("sh")
            .arg("-c")
            .arg("echo 'main.cpp:1:1: error: expected declaration' >&2; exit 1");
        let result = compile_step(&settings(), &command, LanguageFamily::Native)
            .await
            .unwrap_err();

        assert!(result.compile_failed());
        assert_eq!(
            result.error.as_deref(),
            Some("main.cpp:1:1: error: expected declaration\n")
        );
    }

    #[tokio::test]
    async fn test_compile_step_ignores_warnings() {
        let command = CommandSpec::new("sh").arg("-c").arg("echo 'warning: unused' >&2");
        assert!(compile_step(&settings(), &command, LanguageFamily::Native)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_compile_step_timeout_is_compile_failure() {
        let mut settings = settings();
        settings.compile_timeout = Duration::from_millis(200);
        let command = CommandSpec::new("sleep").arg("10");

        let result = compile_step(&settings, &command, LanguageFamily::Jvm)
            .await
            .unwrap_err();

        assert!(result.compile_failed());
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_run_program_missing_interpreter() {
        let program = Program {
            command: CommandSpec::new("examiner-missing-python"),
            stderr_is_failure: true,
            missing_hint: Some(remediation_hint(LanguageFamily::Interpreted)),
        };
        let result = run_program(&settings().runner, &program, "", Duration::from_secs(1)).await;

        assert!(result.toolchain_unavailable());
    }

    #[tokio::test]
    async fn test_run_program_missing_executable_is_infrastructure() {
        let program = Program {
            command: CommandSpec::new("/nonexistent/examiner/main"),
            stderr_is_failure: true,
            missing_hint: None,
        };
        let result = run_program(&settings().runner, &program, "", Duration::from_secs(1)).await;

        assert!(result.infrastructure_failed());
    }
}
