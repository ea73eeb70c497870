use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{HlToolError, TestCase, TESTCASE_SCHEMA_V1};

pub const PROGRAM_FILE: &str = "main.her";
pub const TESTCASE_FILE: &str = "testcase.json";

fn read_file(path: &Path) -> Result<String, HlToolError> {
    fs::read_to_string(path).map_err(|source| HlToolError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_program(case_dir: &Path) -> Result<String, HlToolError> {
    let path = case_dir.join(PROGRAM_FILE);
    let program = read_file(&path)?;
    if program.trim().is_empty() {
        return Err(HlToolError::SourceEmpty { path });
    }
    Ok(program)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, HlToolError> {
    let raw = read_file(case_path)?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| HlToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(HlToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

/// Directories under `root` that hold a testcase file, sorted by path.
pub fn discover_cases(root: &Path) -> Vec<PathBuf> {
    let mut cases = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == TESTCASE_FILE)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect::<Vec<_>>();
    cases.sort();
    cases
}
