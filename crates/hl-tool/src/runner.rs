use std::path::Path;

use hl_api::{Herlang, HerlangOptions, RunOutcome};
use hl_runtime::ExecutorOptions;

use crate::source::{read_program, read_test_case};
use crate::{ExpectedEvent, HlToolError, TestCase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub translated: bool,
    /// Virtual milliseconds elapsed once every delayed effect fired.
    pub elapsed_ms: u64,
}

pub fn run_case(case_dir: &Path, case: &TestCase) -> Result<RunReport, HlToolError> {
    let program = read_program(case_dir)?;
    let herlang = Herlang::new(HerlangOptions {
        executor: ExecutorOptions {
            seed: Some(case.seed),
            ..ExecutorOptions::default()
        },
        ..HerlangOptions::default()
    })?;

    let outcome = herlang.run(&program, &case.dialect)?;
    herlang.settle();

    Ok(RunReport {
        observed_events: herlang.events().iter().map(ExpectedEvent::from).collect(),
        translated: !matches!(outcome, RunOutcome::NotTranslated(_)),
        elapsed_ms: herlang.now_ms(),
    })
}

pub fn assert_case(case_dir: &Path, case_path: &Path) -> Result<(), HlToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(case_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(HlToolError::EventSerialize)?;
        return Err(HlToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if !expected.matches(actual) {
            let expected = serde_json::to_string(expected).map_err(HlToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(HlToolError::EventSerialize)?;
            return Err(HlToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}
