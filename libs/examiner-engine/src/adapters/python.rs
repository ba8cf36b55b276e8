// Interpreted adapter: no compile step, interpreter chosen once per adapter
use super::{run_program, write_source, AdapterSettings, LanguageAdapter, NormalizedSource, Program};
use crate::probe::{remediation_hint, ToolchainProbe};
use crate::process::CommandSpec;
use crate::workspace::Workspace;
use async_trait::async_trait;
use examiner_common::config::PythonToolchain;
use examiner_common::types::{ExecutionResult, Language, LanguageFamily};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

const SOURCE_FILE: &str = "main.py";

pub struct PythonAdapter {
    toolchain: PythonToolchain,
    settings: AdapterSettings,
    probe: ToolchainProbe,
    /// First interpreter name that answered; only a successful lookup is kept
    interpreter: OnceCell<String>,
}

impl PythonAdapter {
    pub fn new(toolchain: PythonToolchain, settings: AdapterSettings, probe: ToolchainProbe) -> Self {
        Self {
            toolchain,
            settings,
            probe,
            interpreter: OnceCell::new(),
        }
    }

    async fn interpreter(&self) -> Result<&str, ExecutionResult> {
        self.interpreter
            .get_or_try_init(|| async {
                let resolved = self
                    .probe
                    .resolve_first(&self.toolchain.interpreters, "--version")
                    .await
                    .map_err(|reason| {
                        ExecutionResult::toolchain_missing(format!(
                            "{}: {}",
                            reason,
                            remediation_hint(LanguageFamily::Interpreted)
                        ))
                    })?;
                info!(interpreter = %resolved.binary, version = ?resolved.version, "Python interpreter selected");
                Ok::<_, ExecutionResult>(resolved.binary)
            })
            .await
            .map(String::as_str)
    }
}

#[async_trait]
impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn prepare(&self, source: &str) -> NormalizedSource {
        NormalizedSource {
            file_name: SOURCE_FILE.to_string(),
            source: source.to_string(),
            entry_point: None,
        }
    }

    /// Writes the script and settles on an interpreter; nothing is compiled
    async fn compile(
        &self,
        source: &NormalizedSource,
        workspace: &Workspace,
    ) -> Result<Program, ExecutionResult> {
        let interpreter = self.interpreter().await?;
        write_source(workspace, source).await?;

        Ok(Program {
            command: CommandSpec::new(interpreter)
                .args(&self.toolchain.args)
                .arg(workspace.file(&source.file_name))
                .current_dir(workspace.path()),
            stderr_is_failure: self.settings.stderr_is_failure,
            missing_hint: Some(remediation_hint(LanguageFamily::Interpreted)),
        })
    }

    async fn run(&self, program: &Program, stdin: &str, time_limit: Duration) -> ExecutionResult {
        run_program(&self.settings.runner, program, stdin, time_limit).await
    }
}
