use hl_core::{OutputEvent, TranslationResult};

use crate::DialectListing;

fn json_line<T: serde::Serialize + ?Sized>(prefix: &str, value: &T) -> String {
    format!(
        "{}{}",
        prefix,
        serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
    )
}

pub(crate) fn translation_lines(result: &TranslationResult) -> Vec<String> {
    let mut lines = vec![
        "RESULT:OK".to_string(),
        format!("DIALECT:{}", result.dialect_id),
    ];
    lines.extend(
        result
            .diagnostics
            .iter()
            .map(|diagnostic| json_line("DIAGNOSTIC_JSON:", diagnostic)),
    );
    lines.push(json_line("CODE_JSON:", &result.generated_code));
    lines
}

pub(crate) fn event_line(event: &OutputEvent) -> String {
    json_line("EVENT_JSON:", event)
}

pub(crate) fn dialect_line(listing: &DialectListing) -> String {
    json_line("DIALECT_JSON:", listing)
}

#[cfg(test)]
mod emit_tests {
    use super::*;
    use hl_core::{Diagnostic, OutputKind, PostProcessorKind};

    #[test]
    fn translation_lines_put_code_last() {
        let lines = translation_lines(&TranslationResult {
            input_text: "输出(1)".to_string(),
            dialect_id: "chinese".to_string(),
            generated_code: "console.log(1)".to_string(),
            diagnostics: vec![Diagnostic::structure("odd", 2)],
        });
        assert_eq!(lines[0], "RESULT:OK");
        assert_eq!(lines[1], "DIALECT:chinese");
        assert!(lines[2].starts_with("DIAGNOSTIC_JSON:{\"kind\":\"structure\""));
        assert_eq!(lines[3], "CODE_JSON:\"console.log(1)\"");
    }

    #[test]
    fn event_line_is_json() {
        let line = event_line(&OutputEvent {
            kind: OutputKind::Log,
            payload: "hi".to_string(),
            sequence: 0,
            timestamp_ms: 0,
        });
        let json = line.strip_prefix("EVENT_JSON:").expect("prefix");
        let parsed: OutputEvent = serde_json::from_str(json).expect("event json");
        assert_eq!(parsed.payload, "hi");
    }

    #[test]
    fn dialect_line_uses_kebab_case_post_processor() {
        let line = dialect_line(&DialectListing {
            id: "python".to_string(),
            display_name: "Python".to_string(),
            aliases: vec!["py".to_string()],
            post_processor: PostProcessorKind::IndentationInference,
            rules: 3,
        });
        assert!(line.contains("\"postProcessor\":\"indentation-inference\""));
    }
}
