// Engine configuration: toolchain binaries, limits and workspace root
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::LanguageFamily;

pub const DEFAULT_CONFIG_PATH: &str = "config/engine.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaToolchain {
    pub javac: String,
    pub java: String,
    pub javac_args: Vec<String>,
    pub java_args: Vec<String>,
}

impl Default for JavaToolchain {
    fn default() -> Self {
        Self {
            javac: "javac".to_string(),
            java: "java".to_string(),
            javac_args: vec!["-encoding".to_string(), "UTF-8".to_string()],
            java_args: vec!["-Xss64m".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeToolchain {
    /// One driver for both dialects; C sources are compiled with `-x c`
    pub compiler: String,
    #[serde(alias = "args")]
    pub cpp_args: Vec<String>,
    pub c_args: Vec<String>,
}

impl Default for NativeToolchain {
    fn default() -> Self {
        Self {
            compiler: "g++".to_string(),
            cpp_args: vec!["-std=c++17".to_string(), "-O2".to_string()],
            c_args: vec!["-std=c11".to_string(), "-O2".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonToolchain {
    /// Interpreter names tried in order; the first one that answers wins
    pub interpreters: Vec<String>,
    pub args: Vec<String>,
}

impl Default for PythonToolchain {
    fn default() -> Self {
        Self {
            interpreters: vec!["python3".to_string(), "python".to_string()],
            args: vec!["-u".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub java: JavaToolchain,
    pub native: NativeToolchain,
    pub python: PythonToolchain,
}

/// Token denylist applied to submitted source before anything runs.
///
/// This is a coarse filter kept for parity with the exam platform's
/// historical behavior. It is not a sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub enabled: bool,
    pub jvm: Vec<String>,
    pub native: Vec<String>,
    pub interpreted: Vec<String>,
}

impl ScreeningConfig {
    pub fn denied_for(&self, family: LanguageFamily) -> &[String] {
        match family {
            LanguageFamily::Jvm => &self.jvm,
            LanguageFamily::Native => &self.native,
            LanguageFamily::Interpreted => &self.interpreted,
        }
    }
}

fn tokens(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jvm: tokens(&["Runtime.getRuntime", "ProcessBuilder"]),
            native: tokens(&["system(", "fork(", "exec(", "popen("]),
            interpreted: tokens(&["import subprocess", "os.system", "shutil.rmtree", "__import__"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Parent directory of every per-session workspace
    pub workspace_root: PathBuf,
    /// Cap on captured bytes per output stream
    pub max_output_bytes: usize,
    pub compile_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub max_source_bytes: usize,
    pub max_stdin_bytes: usize,
    /// A run that writes to stderr is a failed run even with exit code 0
    pub stderr_is_failure: bool,
    pub toolchains: ToolchainConfig,
    pub screening: ScreeningConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir().join("examiner"),
            max_output_bytes: 1024 * 1024,
            compile_timeout_ms: 30_000,
            probe_timeout_ms: 5_000,
            max_source_bytes: 1024 * 1024,
            max_stdin_bytes: 10 * 1024 * 1024,
            stderr_is_failure: true,
            toolchains: ToolchainConfig::default(),
            screening: ScreeningConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load engine configuration from a JSON file
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Engine config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: EngineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the default path when present, otherwise use built-in defaults
    pub fn load_default() -> Result<Self> {
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `EXAMINER_*` environment overrides
    pub fn apply_env(mut self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("EXAMINER_WORKSPACE_ROOT") {
            self.workspace_root = PathBuf::from(root);
        }
        if let Some(bytes) = lookup("EXAMINER_MAX_OUTPUT_BYTES") {
            self.max_output_bytes = bytes
                .parse()
                .with_context(|| format!("EXAMINER_MAX_OUTPUT_BYTES is not a number: {}", bytes))?;
        }
        if let Some(ms) = lookup("EXAMINER_COMPILE_TIMEOUT_MS") {
            self.compile_timeout_ms = ms
                .parse()
                .with_context(|| format!("EXAMINER_COMPILE_TIMEOUT_MS is not a number: {}", ms))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_output_bytes == 0 {
            bail!("max_output_bytes must be greater than 0");
        }
        if self.compile_timeout_ms == 0 || self.probe_timeout_ms == 0 {
            bail!("compile and probe timeouts must be greater than 0");
        }
        if self.toolchains.python.interpreters.is_empty() {
            bail!("at least one python interpreter name must be configured");
        }
        Ok(())
    }
}
