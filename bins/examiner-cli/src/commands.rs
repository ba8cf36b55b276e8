// CLI commands: thin wrappers that read files, call the engine, print JSON
use anyhow::{Context, Result};
use examiner_common::config::EngineConfig;
use examiner_common::types::TestCase;
use examiner_engine::Engine;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Config file (explicit or default path) with environment overrides applied
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::load_default()?,
    };
    config.apply_env()
}

/// Print toolchain readiness; returns whether everything checked is available
pub async fn check(engine: &Engine, language: Option<&str>) -> Result<bool> {
    let statuses = match language {
        Some(name) => vec![engine.check_toolchain(name).await?],
        None => engine.check_all().await,
    };

    print_json(&statuses)?;
    Ok(statuses.iter().all(|status| status.available))
}

pub async fn run(
    engine: &Engine,
    language: &str,
    source: &Path,
    stdin: Option<&Path>,
    time_limit_ms: Option<u64>,
) -> Result<()> {
    let code = read_text(source)?;
    let input = match stdin {
        Some(path) if path == Path::new("-") => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
        Some(path) => read_text(path)?,
        None => String::new(),
    };

    let result = engine.run_code(&code, language, &input, time_limit_ms).await?;
    print_json(&result)
}

pub async fn evaluate(
    engine: &Engine,
    language: &str,
    source: &Path,
    cases: &Path,
    time_limit_ms: Option<u64>,
) -> Result<()> {
    let code = read_text(source)?;
    let test_cases = load_cases(cases)?;

    let summary = engine
        .evaluate_code(&code, language, &test_cases, time_limit_ms)
        .await?;
    print_json(&summary)
}

/// A JSON array of `{"input": ..., "output": ...}` objects
pub fn load_cases(path: &Path) -> Result<Vec<TestCase>> {
    let content = read_text(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse test cases from {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}
