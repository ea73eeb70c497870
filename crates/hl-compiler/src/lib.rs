mod construct;
mod indent;
mod lexer;
mod postprocess;
mod substitute;
mod validate;

pub use postprocess::post_process;
pub use substitute::substitute;
pub use validate::{
    extract_locator, strip_locator, RhaiValidator, ScriptValidator, SourceType, ValidateOptions,
    Validated, ValidationFailure,
};

use hl_core::{Diagnostic, HerlangError, TranslationResult};
use hl_dialects::DialectStore;

/// Substitutes, post-processes and validates `text` in one dialect.
///
/// Only an unknown dialect is an `Err`. A validator rejection is reported as
/// a single syntax diagnostic and `generated_code` keeps the rejected
/// candidate so hosts can show what was produced.
pub fn translate(
    store: &DialectStore,
    validator: &dyn ScriptValidator,
    text: &str,
    dialect_id: &str,
) -> Result<TranslationResult, HerlangError> {
    let dialect = store.get(dialect_id)?;
    let substituted = substitute(text, dialect);
    tracing::debug!(dialect = dialect.id(), "substitution finished");

    let (candidate, mut diagnostics) = post_process(&substituted, dialect.post_processor());
    for diagnostic in &diagnostics {
        tracing::warn!(dialect = dialect.id(), "{}", diagnostic.render());
    }

    let generated_code = match validator.validate(&candidate, &ValidateOptions::default()) {
        Ok(validated) => validated.code,
        Err(failure) => {
            tracing::debug!(dialect = dialect.id(), message = %failure.message, "validation failed");
            diagnostics.push(Diagnostic::syntax(
                strip_locator(&failure.message),
                extract_locator(&failure.message),
            ));
            candidate
        }
    };

    Ok(TranslationResult {
        input_text: text.to_string(),
        dialect_id: dialect.id().to_string(),
        generated_code,
        diagnostics,
    })
}
