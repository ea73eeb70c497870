use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use hl_api::{Herlang, HerlangOptions, RunOutcome};
use hl_core::{HerlangError, OutputEvent};
use hl_runtime::ExecutorOptions;

use crate::emit::{dialect_line, event_line, translation_lines};
use crate::{load_dialect_files, load_source, DialectListing, DialectsArgs, RunArgs, TranslateArgs};

pub(crate) fn run_translate(args: TranslateArgs) -> Result<i32, HerlangError> {
    let lines = translate_lines(args)?;
    for line in lines {
        println!("{}", line);
    }
    Ok(0)
}

pub(crate) fn translate_lines(args: TranslateArgs) -> Result<Vec<String>, HerlangError> {
    let herlang = Herlang::new(HerlangOptions {
        extra_dialects: load_dialect_files(&args.dialect.dialect_files)?,
        ..HerlangOptions::default()
    })?;
    let source = load_source(&args.source)?;
    let result = herlang.translate(&source, &args.dialect.dialect)?;
    if let Some(diagnostic) = result.first_fatal() {
        return Err(HerlangError::translation_syntax(diagnostic));
    }
    Ok(translation_lines(&result))
}

pub(crate) fn run_program(args: RunArgs) -> Result<i32, HerlangError> {
    let lines = run_lines(args, |line| println!("{}", line))?;
    tracing::debug!(lines, "run finished");
    Ok(0)
}

/// Runs the program and hands every protocol line to `emit` as it is
/// produced. Returns the number of lines emitted.
pub(crate) fn run_lines(
    args: RunArgs,
    mut emit: impl FnMut(String),
) -> Result<usize, HerlangError> {
    let herlang = Herlang::new(HerlangOptions {
        extra_dialects: load_dialect_files(&args.dialect.dialect_files)?,
        executor: ExecutorOptions {
            seed: args.seed,
            ..ExecutorOptions::default()
        },
    })?;
    let source = load_source(&args.source)?;
    let events = herlang.subscribe();

    let outcome = herlang.run(&source, &args.dialect.dialect)?;
    if let RunOutcome::NotTranslated(translation) = &outcome {
        tracing::warn!(dialect = %translation.dialect_id, "program did not translate");
    }

    emit("RESULT:OK".to_string());
    let mut emitted = 1 + drain(&events, &mut emit);

    while let Some(deadline) = herlang.next_deadline() {
        let wait = deadline.saturating_sub(herlang.now_ms());
        if !args.no_wait {
            thread::sleep(Duration::from_millis(wait));
        }
        herlang.advance(wait);
        emitted += drain(&events, &mut emit);
    }
    Ok(emitted)
}

fn drain(events: &Receiver<OutputEvent>, emit: &mut impl FnMut(String)) -> usize {
    events
        .try_iter()
        .map(|event| emit(event_line(&event)))
        .count()
}

pub(crate) fn run_dialects(args: DialectsArgs) -> Result<i32, HerlangError> {
    for line in dialect_lines(&args)? {
        println!("{}", line);
    }
    Ok(0)
}

pub(crate) fn dialect_lines(args: &DialectsArgs) -> Result<Vec<String>, HerlangError> {
    let herlang = Herlang::new(HerlangOptions {
        extra_dialects: load_dialect_files(&args.dialect_files)?,
        ..HerlangOptions::default()
    })?;
    let mut lines = vec!["RESULT:OK".to_string()];
    lines.extend(herlang.dialects().iter().map(|dialect| {
        dialect_line(&DialectListing {
            id: dialect.id().to_string(),
            display_name: dialect.display_name().to_string(),
            aliases: dialect.aliases().to_vec(),
            post_processor: dialect.post_processor(),
            rules: dialect.rules().len(),
        })
    }));
    Ok(lines)
}
