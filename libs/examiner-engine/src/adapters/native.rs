// Native adapter: C and C++ submissions share one g++ driver
use super::{compile_step, run_program, write_source, AdapterSettings, LanguageAdapter, NormalizedSource, Program};
use crate::process::CommandSpec;
use crate::rewrite::native;
use crate::workspace::Workspace;
use async_trait::async_trait;
use examiner_common::config::NativeToolchain;
use examiner_common::types::{ExecutionResult, Language, LanguageFamily};
use std::path::Path;
use std::time::Duration;

const C_SOURCE_FILE: &str = "main.c";
const CPP_SOURCE_FILE: &str = "main.cpp";
const EXECUTABLE: &str = if cfg!(windows) { "main.exe" } else { "main" };

pub struct NativeAdapter {
    /// `C` or `Cpp`
    language: Language,
    toolchain: NativeToolchain,
    settings: AdapterSettings,
}

impl NativeAdapter {
    pub fn new(language: Language, toolchain: NativeToolchain, settings: AdapterSettings) -> Self {
        Self {
            language,
            toolchain,
            settings,
        }
    }

    fn compile_command(&self, file_name: &str, executable: &Path, workspace: &Workspace) -> CommandSpec {
        let driver = CommandSpec::new(&self.toolchain.compiler);
        let driver = match self.language {
            // The driver would take `.c` for C++ without an explicit -x
            Language::C => driver.args(&self.toolchain.c_args).arg("-x").arg("c"),
            _ => driver.args(&self.toolchain.cpp_args),
        };
        driver
            .arg(file_name)
            .arg("-o")
            .arg(executable)
            .current_dir(workspace.path())
    }
}

#[async_trait]
impl LanguageAdapter for NativeAdapter {
    fn language(&self) -> Language {
        self.language
    }

    fn prepare(&self, source: &str) -> NormalizedSource {
        let (file_name, source) = match self.language {
            Language::C => (C_SOURCE_FILE, native::normalize_c(source)),
            _ => (CPP_SOURCE_FILE, native::normalize_cpp(source)),
        };
        NormalizedSource {
            file_name: file_name.to_string(),
            source,
            entry_point: None,
        }
    }

    async fn compile(
        &self,
        source: &NormalizedSource,
        workspace: &Workspace,
    ) -> Result<Program, ExecutionResult> {
        write_source(workspace, source).await?;

        let executable = workspace.file(EXECUTABLE);
        let compiler = self.compile_command(&source.file_name, &executable, workspace);
        compile_step(&self.settings, &compiler, LanguageFamily::Native).await?;

        // The executable lives in the workspace and goes away with it
        Ok(Program {
            command: CommandSpec::new(&executable).current_dir(workspace.path()),
            stderr_is_failure: self.settings.stderr_is_failure,
            missing_hint: None,
        })
    }

    async fn run(&self, program: &Program, stdin: &str, time_limit: Duration) -> ExecutionResult {
        run_program(&self.settings.runner, program, stdin, time_limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessRunner;
    use crate::workspace::WorkspaceManager;

    fn settings() -> AdapterSettings {
        AdapterSettings {
            runner: ProcessRunner::new(1024),
            compile_timeout: Duration::from_secs(5),
            stderr_is_failure: true,
        }
    }

    #[test]
    fn test_dialects_get_their_own_file() {
        let c = NativeAdapter::new(Language::C, NativeToolchain::default(), settings());
        let cpp = NativeAdapter::new(Language::Cpp, NativeToolchain::default(), settings());

        assert_eq!(c.prepare("int main() { return 0; }").file_name, "main.c");
        assert_eq!(cpp.prepare("int main() { return 0; }").file_name, "main.cpp");
        assert_eq!(c.language(), Language::C);
        assert_eq!(cpp.language(), Language::Cpp);
    }

    #[test]
    fn test_c_source_is_not_given_cpp_rewrites() {
        let c = NativeAdapter::new(Language::C, NativeToolchain::default(), settings());
        let source = "#include <stdio.h>\n#include <string.h>\nint main() { char string[4] = \"ab\"; printf(\"%zu\", strlen(string)); }\n";

        assert_eq!(c.prepare(source).source, source);
    }

    #[tokio::test]
    async fn test_compile_commands_per_dialect() {
        let root = tempfile::TempDir::new().unwrap();
        let manager = WorkspaceManager::new(root.path()).unwrap();
        let workspace = manager.acquire(Language::C, uuid::Uuid::new_v4()).await.unwrap();
        let executable = workspace.file(EXECUTABLE);

        let c = NativeAdapter::new(Language::C, NativeToolchain::default(), settings());
        assert_eq!(
            c.compile_command("main.c", &executable, &workspace),
            CommandSpec::new("g++")
                .args(["-std=c11", "-O2", "-x", "c", "main.c", "-o"])
                .arg(&executable)
                .current_dir(workspace.path())
        );

        let cpp = NativeAdapter::new(Language::Cpp, NativeToolchain::default(), settings());
        assert_eq!(
            cpp.compile_command("main.cpp", &executable, &workspace),
            CommandSpec::new("g++")
                .args(["-std=c++17", "-O2", "main.cpp", "-o"])
                .arg(&executable)
                .current_dir(workspace.path())
        );

        workspace.release().await;
    }
}
