/// Toolchain Probe - Is the Compiler/Interpreter Actually There?
///
/// Runs a throwaway "version" invocation of each binary a language needs,
/// under a short timeout. Nothing is cached: every call re-checks the host.
/// A missing or broken toolchain comes back as `available: false` plus a
/// remediation hint; the probe itself never fails.
use crate::process::{CommandSpec, ProcessOutput, ProcessRunner};
use examiner_common::config::ToolchainConfig;
use examiner_common::types::{Language, LanguageFamily, ToolchainStatus};
use std::time::Duration;
use tracing::debug;

/// Version banners are short
const PROBE_OUTPUT_BYTES: usize = 64 * 1024;

/// What an operator should do when a language's toolchain is missing
pub fn remediation_hint(family: LanguageFamily) -> &'static str {
    match family {
        LanguageFamily::Jvm => {
            "install the Java JDK (javac and java) and ensure it is on the search path"
        }
        LanguageFamily::Native => {
            "install g++ (build-essential or gcc-c++) and ensure it is on the search path"
        }
        LanguageFamily::Interpreted => {
            "install Python 3 and ensure python3 or python is on the search path"
        }
    }
}

/// A binary that answered its version invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinary {
    pub binary: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ToolchainProbe {
    runner: ProcessRunner,
    toolchains: ToolchainConfig,
    timeout: Duration,
}

impl ToolchainProbe {
    pub fn new(toolchains: ToolchainConfig, timeout: Duration) -> Self {
        Self {
            runner: ProcessRunner::new(PROBE_OUTPUT_BYTES),
            toolchains,
            timeout,
        }
    }

    /// Readiness of `language` right now
    pub async fn check(&self, language: Language) -> ToolchainStatus {
        let family = language.family();
        let outcome = match family {
            LanguageFamily::Jvm => {
                let java = &self.toolchains.java;
                match self.resolve_first(&[java.javac.clone()], "-version").await {
                    // The runtime is needed as much as the compiler
                    Ok(javac) => self
                        .resolve_first(&[java.java.clone()], "-version")
                        .await
                        .map(|_| javac),
                    Err(reason) => Err(reason),
                }
            }
            LanguageFamily::Native => {
                self.resolve_first(&[self.toolchains.native.compiler.clone()], "--version")
                    .await
            }
            LanguageFamily::Interpreted => {
                self.resolve_first(&self.toolchains.python.interpreters, "--version")
                    .await
            }
        };

        match outcome {
            Ok(resolved) => {
                debug!(language = %language, binary = %resolved.binary, "Toolchain available");
                ToolchainStatus {
                    language,
                    available: true,
                    binary: Some(resolved.binary),
                    version: resolved.version,
                    reason: None,
                }
            }
            Err(reason) => {
                debug!(language = %language, reason = %reason, "Toolchain unavailable");
                ToolchainStatus {
                    language,
                    available: false,
                    binary: None,
                    version: None,
                    reason: Some(format!("{}: {}", reason, remediation_hint(family))),
                }
            }
        }
    }

    /// Try each binary in order; the first that exits cleanly wins.
    ///
    /// On failure the error describes why the last candidate was rejected,
    /// without a remediation hint.
    pub async fn resolve_first(
        &self,
        binaries: &[String],
        version_arg: &str,
    ) -> Result<ResolvedBinary, String> {
        let mut last_reason = "no binary configured".to_string();

        for binary in binaries {
            let spec = CommandSpec::new(binary).arg(version_arg);
            let output = self.runner.spawn(&spec, "", self.timeout).await;

            if output.exited_cleanly() {
                return Ok(ResolvedBinary {
                    binary: binary.clone(),
                    version: banner(&output),
                });
            }
            last_reason = rejection(binary, version_arg, &output, self.timeout);
            debug!(binary = %binary, reason = %last_reason, "Probe candidate rejected");
        }

        Err(last_reason)
    }
}

/// First non-empty line of the version output; some toolchains print it on
/// stderr
fn banner(output: &ProcessOutput) -> Option<String> {
    output
        .stdout
        .lines()
        .chain(output.stderr.lines())
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn rejection(binary: &str, version_arg: &str, output: &ProcessOutput, timeout: Duration) -> String {
    if output.binary_missing() {
        format!("`{}` not found", binary)
    } else if let Some(e) = &output.spawn_error {
        format!("`{}` could not be started ({})", binary, e)
    } else if output.timed_out {
        format!(
            "`{} {}` did not answer within {}ms",
            binary,
            version_arg,
            timeout.as_millis()
        )
    } else {
        match output.exit_code() {
            Some(code) => format!("`{} {}` exited with code {}", binary, version_arg, code),
            None => format!("`{} {}` terminated abnormally", binary, version_arg),
        }
    }
}
