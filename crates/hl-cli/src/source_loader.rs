use std::fs;
use std::path::Path;

use hl_core::{DialectSpec, HerlangError};
use hl_dialects::parse_dialect_json;

use crate::{map_cli_dialect_read, map_cli_source_read, SourceArgs};

pub(crate) fn load_source(args: &SourceArgs) -> Result<String, HerlangError> {
    if let Some(code) = &args.code {
        return Ok(code.clone());
    }
    let Some(file) = &args.file else {
        return Err(HerlangError::new(
            "CLI_SOURCE_MISSING",
            "Pass the program with --file <path> or --code <text>.",
        ));
    };
    let path = Path::new(file);
    fs::read_to_string(path).map_err(|error| map_cli_source_read(path, error))
}

pub(crate) fn load_dialect_files(paths: &[String]) -> Result<Vec<DialectSpec>, HerlangError> {
    paths
        .iter()
        .map(|raw| {
            let path = Path::new(raw);
            let json = fs::read_to_string(path).map_err(|error| map_cli_dialect_read(path, error))?;
            parse_dialect_json(&path.display().to_string(), &json)
        })
        .collect()
}
