/// Test Evaluator - Language-Agnostic Scoring Logic
///
/// **Core Responsibility:**
/// Compare execution results against expected outputs and count passes.
///
/// **Critical Properties:**
/// - Knows nothing about processes or workspaces
/// - Knows nothing about language toolchains
/// - Pure function: (execution results, test cases) → summary
///
/// **Scoring Rules:**
/// - A case passes iff its run succeeded and the trimmed stdout equals the
///   trimmed expected output
/// - percentage = round(100 * passed / total), 0 when there are no cases
/// - Timeouts and runtime errors are ordinary failed cases
///
/// **Normalization Rules (Applied to All Languages):**
/// - Trim leading and trailing whitespace: YES
/// - Internal whitespace and line endings: compared byte for byte
/// - Case sensitivity: YES
/// - Floating-point tolerance: NO
use examiner_common::types::{CaseVerdict, EvaluationSummary, ExecutionResult, Language, TestCase};
use tracing::{debug, info};
use uuid::Uuid;

/// Normalize output string for comparison
///
/// **Preserves:**
/// - Internal whitespace
/// - Case sensitivity
/// - Empty lines within content
pub fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Judge one case from its execution result
pub fn evaluate_case(index: usize, test_case: &TestCase, result: ExecutionResult) -> CaseVerdict {
    let passed = result.success
        && normalize_output(&result.stdout) == normalize_output(&test_case.expected_output);

    CaseVerdict {
        index,
        passed,
        input: test_case.input.clone(),
        expected_output: test_case.expected_output.clone(),
        actual_output: result.stdout.clone(),
        result,
    }
}

/// One copy of a preparation failure per test case, each with zero
/// execution time, so the summary still lines up with the input cases
pub fn fan_out_failure(case_count: usize, failure: &ExecutionResult) -> Vec<ExecutionResult> {
    (0..case_count)
        .map(|_| ExecutionResult {
            execution_time_ms: 0,
            ..failure.clone()
        })
        .collect()
}

/// round(100 * passed / total) with halves rounded up; 0 for no cases
pub fn percentage(passed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * passed + total) / (2 * total)) as u32
}

/// Pair every case with its result and total them up.
///
/// `results` must hold exactly one entry per test case, in the same order.
pub fn aggregate(
    session_id: Uuid,
    language: Language,
    test_cases: &[TestCase],
    results: Vec<ExecutionResult>,
) -> EvaluationSummary {
    debug_assert_eq!(test_cases.len(), results.len());

    let compile_failed = !results.is_empty() && results.iter().all(ExecutionResult::compile_failed);

    let cases: Vec<CaseVerdict> = test_cases
        .iter()
        .zip(results)
        .enumerate()
        .map(|(index, (test_case, result))| {
            let verdict = evaluate_case(index, test_case, result);
            debug!(
                session_id = %session_id,
                case = index,
                passed = verdict.passed,
                failure = ?verdict.result.failure,
                execution_time_ms = verdict.result.execution_time_ms,
                "Case evaluated"
            );
            verdict
        })
        .collect();

    let cases_total = test_cases.len();
    let cases_passed = cases.iter().filter(|c| c.passed).count();
    let percentage = percentage(cases_passed, cases_total);

    info!(
        session_id = %session_id,
        language = %language,
        cases_passed,
        cases_total,
        percentage,
        compile_failed,
        "Evaluation complete"
    );

    EvaluationSummary {
        session_id,
        language,
        cases,
        cases_passed,
        cases_total,
        percentage,
        compile_failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examiner_common::types::Failure;

    fn make_test_case(expected_output: &str) -> TestCase {
        TestCase::new("input", expected_output)
    }

    fn make_output(stdout: &str, exec_time: u64) -> ExecutionResult {
        ExecutionResult::succeeded(stdout.to_string(), String::new(), exec_time)
    }

    fn summarize(cases: &[TestCase], results: Vec<ExecutionResult>) -> EvaluationSummary {
        aggregate(Uuid::new_v4(), Language::Python, cases, results)
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("hello"), "hello");
        assert_eq!(normalize_output("  hello  "), "hello");
        assert_eq!(normalize_output("hello\n"), "hello");
        assert_eq!(normalize_output("\nhello\n"), "hello");
        assert_eq!(normalize_output("  hello world  \n"), "hello world");
        assert_eq!(normalize_output(""), "");
        assert_eq!(normalize_output("   "), "");
    }

    #[test]
    fn test_evaluate_case_exact_match() {
        let verdict = evaluate_case(3, &make_test_case("120"), make_output("120", 42));

        assert!(verdict.passed);
        assert_eq!(verdict.index, 3);
        assert_eq!(verdict.actual_output, "120");
        assert_eq!(verdict.result.execution_time_ms, 42);
    }

    #[test]
    fn test_evaluate_case_with_whitespace() {
        let verdict = evaluate_case(0, &make_test_case("hello"), make_output("  hello  \n", 5));
        assert!(verdict.passed);
    }

    #[test]
    fn test_evaluate_case_mismatch() {
        let verdict = evaluate_case(0, &make_test_case("expected"), make_output("actual", 5));
        assert!(!verdict.passed);
    }

    #[test]
    fn test_internal_whitespace_is_significant() {
        let verdict = evaluate_case(0, &make_test_case("1 2"), make_output("1  2", 5));
        assert!(!verdict.passed);

        let verdict = evaluate_case(0, &make_test_case("a\nb"), make_output("a\r\nb", 5));
        assert!(!verdict.passed);
    }

    #[test]
    fn test_failed_run_never_passes() {
        // Right answer, but the program crashed afterwards
        let mut result = make_output("5", 5);
        result.success = false;
        result.failure = Some(Failure::RuntimeFailed);
        result.error = Some("Segmentation fault".to_string());

        let verdict = evaluate_case(0, &make_test_case("5"), result);
        assert!(!verdict.passed);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(0, 3), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 200), 1);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn test_all_pass() {
        let cases = vec![TestCase::new("5", "120"), TestCase::new("3", "6")];
        let summary = summarize(&cases, vec![make_output("120", 42), make_output("6", 38)]);

        assert_eq!(summary.cases_passed, 2);
        assert_eq!(summary.cases_total, 2);
        assert_eq!(summary.percentage, 100);
        assert!(summary.all_passed());
        assert!(!summary.compile_failed);
    }

    #[test]
    fn test_partial_pass() {
        let cases = vec![make_test_case("correct"), make_test_case("wrong")];
        let summary = summarize(&cases, vec![make_output("correct", 10), make_output("incorrect", 10)]);

        assert_eq!(summary.cases_passed, 1);
        assert_eq!(summary.percentage, 50);
        assert!(summary.cases[0].passed);
        assert!(!summary.cases[1].passed);
    }

    #[test]
    fn test_wrong_answers_are_successful_runs() {
        let cases = vec![make_test_case("5"), make_test_case("7")];
        let summary = summarize(&cases, vec![make_output("0", 1), make_output("0", 1)]);

        assert_eq!(summary.cases_passed, 0);
        assert_eq!(summary.percentage, 0);
        assert!(summary.cases.iter().all(|c| c.result.success));
    }

    #[test]
    fn test_mixed_statuses() {
        let cases = vec![
            make_test_case("pass"),
            make_test_case("fail"),
            make_test_case("timeout"),
            make_test_case("error"),
        ];
        let results = vec![
            make_output("pass", 100),
            make_output("wrong", 100),
            ExecutionResult::failed(Failure::TimedOut, "Time limit exceeded after 1001ms"),
            ExecutionResult::failed(Failure::RuntimeFailed, "Error"),
        ];

        let summary = summarize(&cases, results);

        assert_eq!(summary.cases_passed, 1);
        assert_eq!(summary.cases_total, 4);
        assert_eq!(summary.percentage, 25);
        assert!(summary.cases[2].result.timed_out());
        assert!(summary.cases[3].result.runtime_error());
        assert!(!summary.compile_failed);
    }

    #[test]
    fn test_compile_failure_fans_out() {
        let cases = vec![make_test_case("1"), make_test_case("2"), make_test_case("3")];
        let mut failure = ExecutionResult::compile_error("Main.java:1: error: ';' expected");
        failure.execution_time_ms = 812;

        let results = fan_out_failure(cases.len(), &failure);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.execution_time_ms == 0));
        assert!(results.iter().all(|r| r.error == failure.error));

        let summary = summarize(&cases, results);
        assert!(summary.compile_failed);
        assert_eq!(summary.cases_passed, 0);
        assert_eq!(summary.percentage, 0);
    }

    #[test]
    fn test_empty_case_list() {
        let summary = summarize(&[], Vec::new());

        assert!(summary.is_empty());
        assert!(!summary.all_passed());
        assert_eq!(summary.percentage, 0);
        assert!(!summary.compile_failed);
    }

    #[test]
    fn test_case_order_is_preserved() {
        let cases = vec![TestCase::new("a", "1"), TestCase::new("b", "2")];
        let summary = summarize(&cases, vec![make_output("1", 1), make_output("2", 1)]);

        assert_eq!(summary.cases[0].input, "a");
        assert_eq!(summary.cases[1].input, "b");
        assert_eq!(summary.cases[1].index, 1);
    }
}
