use std::sync::mpsc::Receiver;

use hl_compiler::{translate, RhaiValidator, ScriptValidator};
use hl_core::{DialectSpec, HerlangError, OutputEvent, TranslationResult};
use hl_dialects::DialectStore;
use hl_runtime::{DragonState, ExecuteOutcome, Executor, ExecutorOptions};

pub use hl_runtime::ExecutionLimits;

#[derive(Debug, Clone, Default)]
pub struct HerlangOptions {
    /// Registered after the built-in dialects.
    pub extra_dialects: Vec<DialectSpec>,
    pub executor: ExecutorOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Blank input. Nothing was cleared or run.
    Skipped,
    /// Translation produced a fatal diagnostic; one `error` event was appended.
    NotTranslated(TranslationResult),
    Executed {
        translation: TranslationResult,
        outcome: ExecuteOutcome,
    },
}

/// Translation and execution behind one handle.
///
/// The dialect is an argument of every call; the engine holds no current
/// dialect.
pub struct Herlang {
    store: DialectStore,
    validator: Box<dyn ScriptValidator>,
    executor: Executor,
}

impl Herlang {
    pub fn new(options: HerlangOptions) -> Result<Self, HerlangError> {
        let validator = RhaiValidator::with_limits(&options.executor.limits);
        Self::with_validator(options, Box::new(validator))
    }

    pub fn with_validator(
        options: HerlangOptions,
        validator: Box<dyn ScriptValidator>,
    ) -> Result<Self, HerlangError> {
        let store = DialectStore::builtin_with(options.extra_dialects)?;
        Ok(Self {
            store,
            validator,
            executor: Executor::new(options.executor),
        })
    }

    pub fn dialects(&self) -> &DialectStore {
        &self.store
    }

    pub fn dialect_ids(&self) -> Vec<&str> {
        self.store.ids()
    }

    pub fn translate(&self, text: &str, dialect_id: &str) -> Result<TranslationResult, HerlangError> {
        translate(&self.store, self.validator.as_ref(), text, dialect_id)
    }

    pub fn execute(&self, code: &str) -> ExecuteOutcome {
        self.executor.execute(code)
    }

    /// Clears the output, translates and, when translation succeeded, runs.
    pub fn run(&self, text: &str, dialect_id: &str) -> Result<RunOutcome, HerlangError> {
        if text.trim().is_empty() {
            return Ok(RunOutcome::Skipped);
        }
        let translation = self.translate(text, dialect_id)?;
        self.executor.clear();

        if let Some(diagnostic) = translation.first_fatal() {
            tracing::debug!(dialect = %translation.dialect_id, "translation failed, skipping execution");
            self.executor.report_error(&diagnostic.render());
            return Ok(RunOutcome::NotTranslated(translation));
        }

        let outcome = self.executor.execute(&translation.generated_code);
        Ok(RunOutcome::Executed {
            translation,
            outcome,
        })
    }

    pub fn clear(&self) {
        self.executor.clear();
    }

    pub fn advance(&self, by_ms: u64) -> usize {
        self.executor.advance(by_ms)
    }

    pub fn settle(&self) -> usize {
        self.executor.settle()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.executor.next_deadline()
    }

    pub fn now_ms(&self) -> u64 {
        self.executor.now_ms()
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.executor.events()
    }

    pub fn subscribe(&self) -> Receiver<OutputEvent> {
        self.executor.subscribe()
    }

    pub fn dragon_state(&self) -> DragonState {
        self.executor.dragon_state()
    }
}
