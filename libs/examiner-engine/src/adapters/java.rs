// JVM adapter: javac into the workspace, java -cp <workspace> <Class>
use super::{compile_step, run_program, write_source, AdapterSettings, LanguageAdapter, NormalizedSource, Program};
use crate::probe::remediation_hint;
use crate::process::CommandSpec;
use crate::rewrite::java;
use crate::workspace::Workspace;
use async_trait::async_trait;
use examiner_common::config::JavaToolchain;
use examiner_common::types::{ExecutionResult, Language, LanguageFamily};
use std::time::Duration;

/// Variables the JVM echoes to stderr ("Picked up JAVA_TOOL_OPTIONS: ...")
/// on every start, which would fail an otherwise clean run
const JVM_NOISY_ENV: [&str; 2] = ["JAVA_TOOL_OPTIONS", "_JAVA_OPTIONS"];

pub struct JavaAdapter {
    toolchain: JavaToolchain,
    settings: AdapterSettings,
}

impl JavaAdapter {
    pub fn new(toolchain: JavaToolchain, settings: AdapterSettings) -> Self {
        Self { toolchain, settings }
    }

    fn quiet(&self, command: CommandSpec) -> CommandSpec {
        JVM_NOISY_ENV
            .iter()
            .fold(command, |command, key| command.env_remove(*key))
    }
}

#[async_trait]
impl LanguageAdapter for JavaAdapter {
    fn language(&self) -> Language {
        Language::Java
    }

    fn prepare(&self, source: &str) -> NormalizedSource {
        let normalized = java::normalize(source);
        NormalizedSource {
            file_name: normalized.file_name(),
            source: normalized.source,
            entry_point: Some(normalized.class_name),
        }
    }

    async fn compile(
        &self,
        source: &NormalizedSource,
        workspace: &Workspace,
    ) -> Result<Program, ExecutionResult> {
        write_source(workspace, source).await?;

        let javac = self.quiet(
            CommandSpec::new(&self.toolchain.javac)
                .args(&self.toolchain.javac_args)
                .arg("-d")
                .arg(workspace.path())
                .arg(workspace.file(&source.file_name))
                .current_dir(workspace.path()),
        );
        compile_step(&self.settings, &javac, LanguageFamily::Jvm).await?;

        let class_name = source
            .entry_point
            .clone()
            .unwrap_or_else(|| java::DEFAULT_CLASS_NAME.to_string());

        let java = self.quiet(
            CommandSpec::new(&self.toolchain.java)
                .args(&self.toolchain.java_args)
                .arg("-cp")
                .arg(workspace.path())
                .arg(class_name)
                .current_dir(workspace.path()),
        );

        Ok(Program {
            command: java,
            stderr_is_failure: self.settings.stderr_is_failure,
            missing_hint: Some(remediation_hint(LanguageFamily::Jvm)),
        })
    }

    async fn run(&self, program: &Program, stdin: &str, time_limit: Duration) -> ExecutionResult {
        run_program(&self.settings.runner, program, stdin, time_limit).await
    }
}
