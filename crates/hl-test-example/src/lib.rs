use std::path::PathBuf;

use hl_tool::{assert_case, discover_cases, HlToolError, TESTCASE_FILE};

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn demos_root() -> PathBuf {
    workspace_root().join("demos")
}

pub fn demo_dir(name: &str) -> PathBuf {
    demos_root().join(name)
}

pub fn testcase_path(name: &str) -> PathBuf {
    demo_dir(name).join(TESTCASE_FILE)
}

pub fn demo_names() -> Vec<String> {
    discover_cases(&demos_root())
        .iter()
        .filter_map(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .collect()
}

pub fn assert_demo(name: &str) -> Result<(), HlToolError> {
    assert_case(&demo_dir(name), &testcase_path(name))
}
