use std::fmt::Display;
use std::path::Path;

use hl_core::HerlangError;

fn map_error(code: &'static str, path: &Path, error: impl Display) -> HerlangError {
    HerlangError::new(code, format!("{}: {}", path.display(), error))
}

pub(crate) fn emit_error(error: HerlangError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    1
}

pub(crate) fn map_cli_source_read(path: &Path, error: std::io::Error) -> HerlangError {
    map_error("CLI_SOURCE_READ", path, error)
}

pub(crate) fn map_cli_dialect_read(path: &Path, error: std::io::Error) -> HerlangError {
    map_error("CLI_DIALECT_READ", path, error)
}
