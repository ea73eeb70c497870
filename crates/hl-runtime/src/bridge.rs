use rhai::{Array, Dynamic, EvalAltResult, ImmutableString, Map, FLOAT, INT};

use crate::builtins::MAX_CONSOLE_ARGS;

/// Text shown for a value passed to `console.log` and friends.
pub(crate) fn dynamic_to_text(value: &Dynamic) -> String {
    if value.is_unit() {
        return "()".to_string();
    }
    if let Some(text) = value.read_lock::<ImmutableString>() {
        return text.to_string();
    }
    if let Ok(number) = value.as_float() {
        return float_to_text(number);
    }
    if let Some(items) = value.read_lock::<Array>() {
        return format!(
            "[{}]",
            items.iter().map(nested_text).collect::<Vec<_>>().join(", ")
        );
    }
    if let Some(map) = value.read_lock::<Map>() {
        let entries = map
            .iter()
            .map(|(key, value)| format!("{}: {}", key, nested_text(value)))
            .collect::<Vec<_>>()
            .join(", ");
        return format!("#{{{}}}", entries);
    }
    value.to_string()
}

fn nested_text(value: &Dynamic) -> String {
    match value.read_lock::<ImmutableString>() {
        Some(text) => format!("{:?}", text.as_str()),
        None => dynamic_to_text(value),
    }
}

fn float_to_text(value: FLOAT) -> String {
    if value.is_finite() && value.fract().abs() < FLOAT::EPSILON && value.abs() < INT::MAX as FLOAT {
        (value as INT).to_string()
    } else {
        value.to_string()
    }
}

/// `console.log("a", 1)` prints `a 1`.
pub(crate) fn join_args(args: &[Dynamic]) -> String {
    args.iter().map(dynamic_to_text).collect::<Vec<_>>().join(" ")
}

/// Message for the `error` event of a failed run.
///
/// Errors raised inside script functions are unwrapped to the innermost
/// cause; a thrown value is shown as its text.
pub(crate) fn error_message(error: &EvalAltResult) -> String {
    match error {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => error_message(inner),
        EvalAltResult::ErrorRuntime(value, _) => dynamic_to_text(value),
        EvalAltResult::ErrorFunctionNotFound(signature, _) => {
            console_arity_message(signature).unwrap_or_else(|| error.to_string())
        }
        other => other.to_string(),
    }
}

/// Every arity up to the limit is registered, so a missing console method
/// means too many arguments.
fn console_arity_message(signature: &str) -> Option<String> {
    let (name, params) = signature.split_once(" (")?;
    if !matches!(name, "log" | "warn") || !params.starts_with("Console") {
        return None;
    }
    Some(format!(
        "console.{} accepts at most {} arguments",
        name, MAX_CONSOLE_ARGS
    ))
}

#[cfg(test)]
mod bridge_tests {
    use super::*;
    use rhai::Position;

    #[test]
    fn scalars_render_like_console_output() {
        assert_eq!(dynamic_to_text(&Dynamic::from("hi")), "hi");
        assert_eq!(dynamic_to_text(&Dynamic::from(10 as INT)), "10");
        assert_eq!(dynamic_to_text(&Dynamic::from(true)), "true");
        assert_eq!(dynamic_to_text(&Dynamic::from(2.5 as FLOAT)), "2.5");
        assert_eq!(dynamic_to_text(&Dynamic::from(4.0 as FLOAT)), "4");
        assert_eq!(dynamic_to_text(&Dynamic::UNIT), "()");
    }

    #[test]
    fn arrays_quote_nested_strings() {
        let array: Array = vec![Dynamic::from("a"), Dynamic::from(1 as INT)];
        assert_eq!(dynamic_to_text(&Dynamic::from_array(array)), "[\"a\", 1]");
    }

    #[test]
    fn join_args_separates_with_spaces() {
        let args = [Dynamic::from("今日盲盒开出了："), Dynamic::from("一杯奶茶🥤")];
        assert_eq!(join_args(&args), "今日盲盒开出了： 一杯奶茶🥤");
        assert_eq!(join_args(&[]), "");
    }

    #[test]
    fn thrown_values_surface_without_wrapping() {
        let thrown = EvalAltResult::ErrorRuntime(Dynamic::from("哼！"), Position::NONE);
        assert_eq!(error_message(&thrown), "哼！");

        let nested = EvalAltResult::ErrorInFunctionCall(
            "wish".to_string(),
            String::new(),
            Box::new(thrown),
            Position::NONE,
        );
        assert_eq!(error_message(&nested), "哼！");
    }

    #[test]
    fn missing_console_arity_names_the_limit() {
        let missing = EvalAltResult::ErrorFunctionNotFound(
            "log (Console, i64, i64)".to_string(),
            Position::NONE,
        );
        assert_eq!(
            error_message(&missing),
            format!("console.log accepts at most {} arguments", MAX_CONSOLE_ARGS)
        );

        let other = EvalAltResult::ErrorFunctionNotFound("wish (i64)".to_string(), Position::NONE);
        assert!(error_message(&other).contains("wish"));
    }
}
