use hl_core::{Diagnostic, PostProcessorKind};

use crate::construct::rewrite_constructs;
use crate::indent::infer_blocks;

/// Structural correction applied after substitution. Never fails; problems
/// come back as non-fatal structure diagnostics.
pub fn post_process(code: &str, kind: PostProcessorKind) -> (String, Vec<Diagnostic>) {
    match kind {
        PostProcessorKind::Passthrough => (code.to_string(), Vec::new()),
        PostProcessorKind::IndentationInference => infer_blocks(code),
        PostProcessorKind::ConstructRewrite => rewrite_constructs(code),
    }
}
