/// Execution Engine - The Library Boundary
///
/// **Core Responsibility:**
/// Take one submission from source text to results: screen it, give it a
/// workspace, compile it once, run it once per input, score it, clean up.
///
/// **Critical Architectural Boundary:**
/// - Adapters know HOW to build and launch a language
/// - The evaluator knows how to score
/// - The engine only sequences them and guarantees cleanup
///
/// **Guarantees:**
/// - Exactly one result per input, in input order, whatever goes wrong
/// - A compile (or setup) failure is reported once per case, never retried
/// - One child process in flight per submission; cases run sequentially
/// - The session workspace is released on every exit path
use crate::adapters::java::JavaAdapter;
use crate::adapters::native::NativeAdapter;
use crate::adapters::python::PythonAdapter;
use crate::adapters::{AdapterSettings, LanguageAdapter};
use crate::error::EngineError;
use crate::evaluator;
use crate::probe::ToolchainProbe;
use crate::screening::Screening;
use crate::workspace::WorkspaceManager;
use examiner_common::config::EngineConfig;
use examiner_common::types::{
    EvaluationSummary, ExecutionResult, Language, Submission, TestCase, ToolchainStatus,
    DEFAULT_TIME_LIMIT_MS,
};
use futures_util::future::join_all;
use std::time::{Duration, Instant};
use tracing::{info, warn, Span};
use uuid::Uuid;

pub struct Engine {
    config: EngineConfig,
    workspaces: WorkspaceManager,
    probe: ToolchainProbe,
    screening: Screening,
    java: JavaAdapter,
    c: NativeAdapter,
    cpp: NativeAdapter,
    python: PythonAdapter,
}

impl Engine {
    /// Validate the configuration and make sure the workspace root is usable
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;
        let workspaces =
            WorkspaceManager::new(&config.workspace_root).map_err(EngineError::Workspace)?;

        let probe = ToolchainProbe::new(
            config.toolchains.clone(),
            Duration::from_millis(config.probe_timeout_ms),
        );
        let settings = AdapterSettings::from_config(&config);
        let toolchains = &config.toolchains;

        let engine = Self {
            java: JavaAdapter::new(toolchains.java.clone(), settings.clone()),
            c: NativeAdapter::new(Language::C, toolchains.native.clone(), settings.clone()),
            cpp: NativeAdapter::new(Language::Cpp, toolchains.native.clone(), settings.clone()),
            python: PythonAdapter::new(toolchains.python.clone(), settings, probe.clone()),
            screening: Screening::from_config(&config),
            probe,
            workspaces,
            config,
        };

        info!(
            workspace_root = %engine.workspaces.root().display(),
            max_output_bytes = engine.config.max_output_bytes,
            "Engine ready"
        );
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn adapter(&self, language: Language) -> &dyn LanguageAdapter {
        match language {
            Language::Java => &self.java,
            Language::C => &self.c,
            Language::Cpp => &self.cpp,
            Language::Python => &self.python,
        }
    }

    /// Probe the toolchain behind a language name as a caller would send it
    pub async fn check_toolchain(&self, language: &str) -> Result<ToolchainStatus, EngineError> {
        let language: Language = language.parse()?;
        Ok(self.check(language).await)
    }

    pub async fn check(&self, language: Language) -> ToolchainStatus {
        self.probe.check(language).await
    }

    /// Readiness of every supported language, probed concurrently
    pub async fn check_all(&self) -> Vec<ToolchainStatus> {
        join_all(Language::ALL.iter().map(|language| self.check(*language))).await
    }

    /// Ad-hoc execution with caller-supplied input and no expected output
    #[tracing::instrument(
        skip(self, submission),
        fields(
            session_id = tracing::field::Empty,
            language = %submission.language,
            time_limit_ms = submission.time_limit_ms
        )
    )]
    pub async fn run_once(&self, submission: &Submission) -> ExecutionResult {
        let session_id = Uuid::new_v4();
        Span::current().record("session_id", tracing::field::display(session_id));

        let inputs = [submission.stdin.as_str()];
        let mut results = self
            .execute_with(self.adapter(submission.language), session_id, submission, &inputs)
            .await;

        results
            .pop()
            .unwrap_or_else(|| ExecutionResult::infrastructure("No execution result produced"))
    }

    /// Run the submission against every test case and score it
    #[tracing::instrument(
        skip(self, submission, test_cases),
        fields(
            session_id = tracing::field::Empty,
            language = %submission.language,
            test_count = test_cases.len()
        )
    )]
    pub async fn evaluate(&self, submission: &Submission, test_cases: &[TestCase]) -> EvaluationSummary {
        let session_id = Uuid::new_v4();
        Span::current().record("session_id", tracing::field::display(session_id));

        self.evaluate_with(self.adapter(submission.language), session_id, submission, test_cases)
            .await
    }

    /// `run_once` taking the language by name
    pub async fn run_code(
        &self,
        code: &str,
        language: &str,
        stdin: &str,
        time_limit_ms: Option<u64>,
    ) -> Result<ExecutionResult, EngineError> {
        let submission = Submission::new(code, language.parse()?)
            .with_stdin(stdin)
            .with_time_limit_ms(time_limit_ms.unwrap_or(DEFAULT_TIME_LIMIT_MS));
        Ok(self.run_once(&submission).await)
    }

    /// `evaluate` taking the language by name
    pub async fn evaluate_code(
        &self,
        code: &str,
        language: &str,
        test_cases: &[TestCase],
        time_limit_ms: Option<u64>,
    ) -> Result<EvaluationSummary, EngineError> {
        let submission = Submission::new(code, language.parse()?)
            .with_time_limit_ms(time_limit_ms.unwrap_or(DEFAULT_TIME_LIMIT_MS));
        Ok(self.evaluate(&submission, test_cases).await)
    }

    async fn evaluate_with(
        &self,
        adapter: &dyn LanguageAdapter,
        session_id: Uuid,
        submission: &Submission,
        test_cases: &[TestCase],
    ) -> EvaluationSummary {
        if test_cases.is_empty() {
            info!(session_id = %session_id, "No test cases; nothing to evaluate");
            return evaluator::aggregate(session_id, submission.language, test_cases, Vec::new());
        }

        let inputs: Vec<&str> = test_cases.iter().map(|tc| tc.input.as_str()).collect();
        let results = self
            .execute_with(adapter, session_id, submission, &inputs)
            .await;

        evaluator::aggregate(session_id, submission.language, test_cases, results)
    }

    /// Compile once, then run once per input. Always one result per input.
    async fn execute_with(
        &self,
        adapter: &dyn LanguageAdapter,
        session_id: Uuid,
        submission: &Submission,
        inputs: &[&str],
    ) -> Vec<ExecutionResult> {
        let job_start_time = Instant::now();

        info!(
            session_id = %session_id,
            language = %submission.language,
            adapter = %adapter.language(),
            test_count = inputs.len(),
            "Starting execution"
        );

        if let Some(rejection) = self
            .screening
            .check_source(submission.language, &submission.source_code)
        {
            return evaluator::fan_out_failure(inputs.len(), &rejection);
        }

        let workspace = match self.workspaces.acquire(submission.language, session_id).await {
            Ok(workspace) => workspace,
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(session_id = %session_id, error = %reason, "Workspace setup failed");
                return evaluator::fan_out_failure(inputs.len(), &ExecutionResult::infrastructure(reason));
            }
        };

        let prepared = adapter.prepare(&submission.source_code);
        let program = match adapter.compile(&prepared, &workspace).await {
            Ok(program) => program,
            Err(failure) => {
                log_preparation_failure(session_id, &failure);
                workspace.release().await;
                return evaluator::fan_out_failure(inputs.len(), &failure);
            }
        };

        let time_limit = Duration::from_millis(submission.time_limit_ms);
        let mut results = Vec::with_capacity(inputs.len());

        for (index, input) in inputs.iter().enumerate() {
            let result = match self.screening.check_input(input) {
                Some(rejection) => rejection,
                None => adapter.run(&program, input, time_limit).await,
            };

            if result.timed_out() {
                warn!(session_id = %session_id, case = index, execution_time_ms = result.execution_time_ms, "Execution timed out");
            } else if result.failure.map(|f| f.is_environmental()).unwrap_or(false) {
                warn!(session_id = %session_id, case = index, error = ?result.error, "Execution failed for environmental reasons");
            }
            results.push(result);
        }

        workspace.release().await;

        info!(
            session_id = %session_id,
            total_execution_time_ms = job_start_time.elapsed().as_millis() as u64,
            tests_executed = results.len(),
            tests_successful = results.iter().filter(|r| r.success).count(),
            "Completed execution"
        );

        results
    }
}

fn log_preparation_failure(session_id: Uuid, failure: &ExecutionResult) {
    match failure.failure {
        Some(kind) if kind.is_environmental() => warn!(
            session_id = %session_id,
            failure = ?kind,
            error = ?failure.error,
            "Toolchain or host problem; all cases marked as failed"
        ),
        kind => info!(
            session_id = %session_id,
            failure = ?kind,
            "Preparation failed; all cases marked as failed"
        ),
    }
}
