use std::sync::OnceLock;

use hl_core::SourceLocation;
use hl_runtime::{script_engine, ExecutionLimits};
use regex::Regex;
use rhai::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceType {
    #[default]
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidateOptions {
    pub source_type: SourceType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub message: String,
}

/// Parses candidate script text. On failure the message should embed a
/// `(line:column)` locator; callers tolerate its absence.
pub trait ScriptValidator {
    fn validate(&self, source: &str, options: &ValidateOptions)
        -> Result<Validated, ValidationFailure>;
}

/// Compiles candidate code with a Rhai engine configured like the executor's.
pub struct RhaiValidator {
    engine: Engine,
}

impl RhaiValidator {
    pub fn new() -> Self {
        Self::with_limits(&ExecutionLimits::default())
    }

    pub fn with_limits(limits: &ExecutionLimits) -> Self {
        Self {
            engine: script_engine(limits),
        }
    }
}

impl Default for RhaiValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptValidator for RhaiValidator {
    fn validate(
        &self,
        source: &str,
        options: &ValidateOptions,
    ) -> Result<Validated, ValidationFailure> {
        let SourceType::Script = options.source_type;
        let code = normalize(source);
        match self.engine.compile(&code) {
            Ok(_) => Ok(Validated { code }),
            Err(error) => {
                let position = error.position();
                let message = match (position.line(), position.position()) {
                    (Some(line), Some(column)) => {
                        format!("{} ({}:{})", error.err_type(), line, column)
                    }
                    (Some(line), None) => format!("{} ({}:1)", error.err_type(), line),
                    _ => error.err_type().to_string(),
                };
                Err(ValidationFailure { message })
            }
        }
    }
}

fn normalize(source: &str) -> String {
    let unix = source.replace("\r\n", "\n");
    let mut lines = unix.lines().map(str::trim_end).collect::<Vec<_>>();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn locator_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\((\d+):(\d+)\)").expect("locator regex must compile"))
}

/// Pulls the last `(line:column)` out of a validator message.
pub fn extract_locator(message: &str) -> Option<SourceLocation> {
    let captures = locator_regex().captures_iter(message).last()?;
    let line = captures.get(1)?.as_str().parse().ok()?;
    let column = captures.get(2)?.as_str().parse().ok()?;
    Some(SourceLocation { line, column })
}

/// Message text without its trailing locator.
pub fn strip_locator(message: &str) -> String {
    locator_regex().replace_all(message, "").trim_end().to_string()
}
