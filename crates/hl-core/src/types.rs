use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostProcessorKind {
    Passthrough,
    IndentationInference,
    ConstructRewrite,
}

/// Static definition of a dialect as it appears in configuration.
///
/// `rules` keeps declaration order; equal-length phrases are applied in that
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialectSpec {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub post_processor: PostProcessorKind,
    #[serde(default)]
    pub word_boundaries: bool,
    pub rules: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Syntax,
    Structure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl Diagnostic {
    pub fn syntax(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            kind: DiagnosticKind::Syntax,
            message: message.into(),
            line: location.map(|loc| loc.line),
            column: location.map(|loc| loc.column),
        }
    }

    pub fn structure(message: impl Into<String>, line: usize) -> Self {
        Self {
            kind: DiagnosticKind::Structure,
            message: message.into(),
            line: Some(line),
            column: None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind == DiagnosticKind::Syntax
    }

    /// Human readable form. Line and column refer to the generated code.
    pub fn render(&self) -> String {
        match (self.line, self.column) {
            (Some(line), Some(column)) => format!(
                "Herlang got stuck at line {}, column {} of the generated code: {}",
                line, column, self.message
            ),
            (Some(line), None) => format!("Line {}: {}", line, self.message),
            _ => format!("Herlang blew up: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub input_text: String,
    pub dialect_id: String,
    pub generated_code: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl TranslationResult {
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_fatal)
    }

    pub fn first_fatal(&self) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|diag| diag.is_fatal())
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn dialect_spec_deserializes_with_defaults() {
        let spec: DialectSpec = serde_json::from_str(
            r#"{
  "id": "tiny",
  "postProcessor": "indentation-inference",
  "rules": [["hello", "console.log"]]
}"#,
        )
        .expect("spec should deserialize");
        assert_eq!(spec.id, "tiny");
        assert!(spec.aliases.is_empty());
        assert!(!spec.word_boundaries);
        assert_eq!(spec.post_processor, PostProcessorKind::IndentationInference);
        assert_eq!(
            spec.rules,
            vec![("hello".to_string(), "console.log".to_string())]
        );
    }

    #[test]
    fn syntax_diagnostic_is_fatal_and_renders_location() {
        let diag = Diagnostic::syntax("unexpected '}'", Some(SourceLocation { line: 3, column: 9 }));
        assert!(diag.is_fatal());
        let rendered = diag.render();
        assert!(rendered.contains("line 3"));
        assert!(rendered.contains("column 9"));
    }

    #[test]
    fn structure_diagnostic_does_not_fail_translation() {
        let result = TranslationResult {
            input_text: "x".to_string(),
            dialect_id: "python".to_string(),
            generated_code: "x".to_string(),
            diagnostics: vec![Diagnostic::structure("odd dedent", 4)],
        };
        assert!(result.is_ok());
        assert!(result.first_fatal().is_none());
    }

    #[test]
    fn render_without_location_still_has_message() {
        let diag = Diagnostic::syntax("boom", None);
        assert_eq!(diag.render(), "Herlang blew up: boom");
    }
}
