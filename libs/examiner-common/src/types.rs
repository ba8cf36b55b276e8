use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default per-run wall-clock limit when the caller does not supply one
pub const DEFAULT_TIME_LIMIT_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    C,
    Cpp,
    Python,
}

/// How a language gets from source text to a running process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageFamily {
    /// Compiled to class files, run on the JVM
    Jvm,
    /// Compiled to a native executable by a C-family toolchain
    Native,
    /// Run directly by an interpreter
    Interpreted,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::Java, Language::C, Language::Cpp, Language::Python];

    pub fn family(&self) -> LanguageFamily {
        match self {
            Language::Java => LanguageFamily::Jvm,
            Language::C | Language::Cpp => LanguageFamily::Native,
            Language::Python => LanguageFamily::Interpreted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Python => "python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    /// Case-insensitive, accepts the common synonyms for each language
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "java" => Ok(Language::Java),
            "c" => Ok(Language::C),
            "cpp" | "c++" | "cplusplus" => Ok(Language::Cpp),
            "python" | "python3" | "py" => Ok(Language::Python),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}

/// One unit of student code plus language and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub source_code: String,
    pub language: Language,
    #[serde(default)]
    pub stdin: String,
    #[serde(default = "default_time_limit")]
    pub time_limit_ms: u64,
}

fn default_time_limit() -> u64 {
    DEFAULT_TIME_LIMIT_MS
}

impl Submission {
    pub fn new(source_code: impl Into<String>, language: Language) -> Self {
        Self {
            source_code: source_code.into(),
            language,
            stdin: String::new(),
            time_limit_ms: DEFAULT_TIME_LIMIT_MS,
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.time_limit_ms = time_limit_ms;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    #[serde(alias = "output")]
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Why an execution did not succeed
///
/// `TimedOut` and `RuntimeFailed` are faults of the submitted program and are
/// scored as failed cases. `InfrastructureFailed` and `ToolchainUnavailable`
/// describe the host and should be alerted on rather than scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    ToolchainUnavailable,
    CompileFailed,
    RuntimeFailed,
    TimedOut,
    InfrastructureFailed,
    Rejected,
}

impl Failure {
    /// True when the failure says something about the host, not the code
    pub fn is_environmental(&self) -> bool {
        matches!(self, Failure::InfrastructureFailed | Failure::ToolchainUnavailable)
    }
}

/// Outcome of one compile+run cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub execution_time_ms: u64,
    pub failure: Option<Failure>,
    /// Human-readable failure reason (compiler diagnostics, stderr, hint)
    pub error: Option<String>,
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub output_truncated: bool,
}

impl ExecutionResult {
    pub fn succeeded(stdout: String, stderr: String, execution_time_ms: u64) -> Self {
        Self {
            stdout,
            stderr,
            success: true,
            execution_time_ms,
            failure: None,
            error: None,
            exit_code: Some(0),
            output_truncated: false,
        }
    }

    pub fn failed(failure: Failure, error: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            success: false,
            execution_time_ms: 0,
            failure: Some(failure),
            error: Some(error.into()),
            exit_code: None,
            output_truncated: false,
        }
    }

    pub fn compile_error(diagnostic: impl Into<String>) -> Self {
        Self::failed(Failure::CompileFailed, diagnostic)
    }

    pub fn toolchain_missing(hint: impl Into<String>) -> Self {
        Self::failed(Failure::ToolchainUnavailable, hint)
    }

    pub fn infrastructure(reason: impl Into<String>) -> Self {
        Self::failed(Failure::InfrastructureFailed, reason)
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::failed(Failure::Rejected, reason)
    }

    pub fn compile_failed(&self) -> bool {
        self.failure == Some(Failure::CompileFailed)
    }

    /// Alias used by the custom-input contract
    pub fn compiler_error(&self) -> bool {
        self.compile_failed()
    }

    pub fn runtime_error(&self) -> bool {
        self.failure == Some(Failure::RuntimeFailed)
    }

    pub fn timed_out(&self) -> bool {
        self.failure == Some(Failure::TimedOut)
    }

    pub fn infrastructure_failed(&self) -> bool {
        self.failure == Some(Failure::InfrastructureFailed)
    }

    pub fn toolchain_unavailable(&self) -> bool {
        self.failure == Some(Failure::ToolchainUnavailable)
    }

    pub fn rejected_by_screening(&self) -> bool {
        self.failure == Some(Failure::Rejected)
    }
}

/// Verdict for one test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseVerdict {
    pub index: usize,
    pub passed: bool,
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub result: ExecutionResult,
}

/// Aggregate verdict across all test cases of one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub session_id: Uuid,
    pub language: Language,
    pub cases: Vec<CaseVerdict>,
    pub cases_passed: usize,
    pub cases_total: usize,
    pub percentage: u32,
    pub compile_failed: bool,
}

impl EvaluationSummary {
    /// No test cases were supplied; `percentage` carries no meaning
    pub fn is_empty(&self) -> bool {
        self.cases_total == 0
    }

    pub fn all_passed(&self) -> bool {
        !self.is_empty() && self.cases_passed == self.cases_total
    }
}

/// Readiness of one language's compiler or interpreter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainStatus {
    pub language: Language,
    pub available: bool,
    /// Binary that answered the probe
    pub binary: Option<String>,
    /// First line of the binary's version banner
    pub version: Option<String>,
    /// Remediation hint when unavailable
    pub reason: Option<String>,
}
