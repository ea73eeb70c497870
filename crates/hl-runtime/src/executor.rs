use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::mpsc::Receiver;

use hl_core::{OutputEvent, OutputKind};
use rhai::{Array, Dynamic, Engine, ImmutableString, Scope, INT};

use crate::blind_box::BlindBox;
use crate::bridge::{dynamic_to_text, error_message, join_args};
use crate::builtins::{
    dragon_message, Console, DragonState, HerMagic, DRAGON_ART, DRAGON_DELAY_MS,
};
use crate::output::OutputLog;
use crate::scheduler::{Scheduler, TaskId};

/// Resource ceilings for one run. Exceeding any of them fails the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_operations: 1_000_000,
            max_call_levels: 64,
            max_string_size: 1 << 20,
            max_array_size: 100_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Blind-box seed. `None` seeds from the clock.
    pub seed: Option<u32>,
    pub dragon_delay_ms: u64,
    pub limits: ExecutionLimits,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            seed: None,
            dragon_delay_ms: DRAGON_DELAY_MS,
            limits: ExecutionLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    Completed,
    /// The run stopped early; one `error` event was appended.
    Failed { message: String },
    /// Another run was still in its synchronous phase. Nothing was appended.
    Rejected,
}

#[derive(Debug)]
enum DelayedEffect {
    DragonMessage(String),
}

#[derive(Debug)]
struct RuntimeState {
    log: OutputLog,
    scheduler: Scheduler<DelayedEffect>,
    blind_box: BlindBox,
    dragon_delay_ms: u64,
    dragon_task: Option<TaskId>,
    dragon_state: DragonState,
}

impl RuntimeState {
    fn emit(&mut self, kind: OutputKind, payload: impl Into<String>) {
        let now = self.scheduler.now_ms();
        self.log.append(kind, payload, now);
    }

    fn summon_dragon(&mut self, wish: &str) {
        if let Some(previous) = self.dragon_task.take() {
            if self.scheduler.cancel(previous).is_some() {
                tracing::debug!("pending dragon message replaced");
            }
        }
        self.emit(OutputKind::Artwork, DRAGON_ART);
        self.dragon_state = DragonState::ArtworkShown;

        let task = self.scheduler.schedule(
            self.dragon_delay_ms,
            DelayedEffect::DragonMessage(dragon_message(wish)),
        );
        self.dragon_task = Some(task);
        self.dragon_state = DragonState::MessagePending;
    }

    fn open_blind_box(&mut self) -> String {
        self.blind_box.open().to_string()
    }

    fn advance(&mut self, by_ms: u64) -> usize {
        let fired = self.scheduler.advance(by_ms);
        let count = fired.len();
        for task in fired {
            match task.payload {
                DelayedEffect::DragonMessage(message) => {
                    self.log.append(OutputKind::Message, message, task.at_ms);
                    if self.dragon_task == Some(task.id) {
                        self.dragon_task = None;
                        self.dragon_state = DragonState::MessageShown;
                    }
                }
            }
        }
        count
    }

    fn clear(&mut self) {
        self.log.clear();
        self.dragon_task = None;
        let cancelled = self.scheduler.cancel_all();
        if cancelled > 0 {
            tracing::debug!(cancelled, "pending effects cancelled by clear");
        }
        self.dragon_state = DragonState::Idle;
    }
}

struct RunGuard<'a>(&'a Cell<bool>);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Runs generated code against a scope that only exposes `console` and
/// `herlang`, turning every observable effect into an [`OutputEvent`].
///
/// Delayed effects wait on a virtual clock that the host moves with
/// [`Executor::advance`] or [`Executor::settle`].
pub struct Executor {
    engine: Engine,
    state: Rc<RefCell<RuntimeState>>,
    running: Cell<bool>,
}

impl Executor {
    pub fn new(options: ExecutorOptions) -> Self {
        let blind_box = options
            .seed
            .map(BlindBox::seeded)
            .unwrap_or_else(BlindBox::from_clock);
        let state = Rc::new(RefCell::new(RuntimeState {
            log: OutputLog::new(),
            scheduler: Scheduler::new(),
            blind_box,
            dragon_delay_ms: options.dragon_delay_ms,
            dragon_task: None,
            dragon_state: DragonState::Idle,
        }));
        let engine = build_engine(&state, &options.limits);
        Self {
            engine,
            state,
            running: Cell::new(false),
        }
    }

    /// Never returns an error: failures become one `error` event.
    pub fn execute(&self, code: &str) -> ExecuteOutcome {
        if self.running.replace(true) {
            tracing::warn!("execute rejected: a previous run has not finished");
            return ExecuteOutcome::Rejected;
        }
        let _guard = RunGuard(&self.running);

        let mut scope = Scope::new();
        match self.engine.run_with_scope(&mut scope, code) {
            Ok(()) => {
                tracing::debug!("run completed");
                ExecuteOutcome::Completed
            }
            Err(error) => {
                let message = error_message(&error);
                tracing::debug!(%message, "run failed");
                self.state
                    .borrow_mut()
                    .emit(OutputKind::Error, message.clone());
                ExecuteOutcome::Failed { message }
            }
        }
    }

    /// Appends an `error` event for a failure that happened before execution,
    /// such as a translation diagnostic.
    pub fn report_error(&self, message: &str) {
        self.state.borrow_mut().emit(OutputKind::Error, message);
    }

    /// Empties the log and cancels every pending delayed effect.
    pub fn clear(&self) {
        self.state.borrow_mut().clear();
    }

    /// Moves the virtual clock and appends delayed events that came due.
    pub fn advance(&self, by_ms: u64) -> usize {
        self.state.borrow_mut().advance(by_ms)
    }

    /// Advances until nothing is pending.
    pub fn settle(&self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            let by_ms = deadline.saturating_sub(self.now_ms());
            fired += self.advance(by_ms);
        }
        fired
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.state.borrow().scheduler.next_deadline()
    }

    pub fn now_ms(&self) -> u64 {
        self.state.borrow().scheduler.now_ms()
    }

    pub fn pending_tasks(&self) -> usize {
        self.state.borrow().scheduler.pending()
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.state.borrow().log.events().to_vec()
    }

    pub fn subscribe(&self) -> Receiver<OutputEvent> {
        self.state.borrow_mut().log.subscribe()
    }

    pub fn dragon_state(&self) -> DragonState {
        self.state.borrow().dragon_state
    }
}

// One registration per arity up to `MAX_CONSOLE_ARGS`.
macro_rules! register_console_method {
    (@arity $engine:ident, $state:ident, $name:literal, $kind:expr; $($arg:ident),*) => {{
        let sink = Rc::clone($state);
        $engine.register_fn($name, move |_: Console, $($arg: Dynamic),*| {
            sink.borrow_mut().emit($kind, join_args(&[$($arg),*]));
        });
    }};
    ($engine:ident, $state:ident, $name:literal, $kind:expr) => {
        register_console_method!(@arity $engine, $state, $name, $kind;);
        register_console_method!(@arity $engine, $state, $name, $kind; a);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e, f);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e, f, g);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e, f, g, h);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e, f, g, h, i);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e, f, g, h, i, j);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e, f, g, h, i, j, k);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e, f, g, h, i, j, k, l);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e, f, g, h, i, j, k, l, m);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e, f, g, h, i, j, k, l, m, n);
        register_console_method!(@arity $engine, $state, $name, $kind; a, b, c, d, e, f, g, h, i, j, k, l, m, n, o);
    };
}

/// Engine with the language settings and limits shared by validation and
/// execution. Host bindings are added on top by the executor.
pub fn script_engine(limits: &ExecutionLimits) -> Engine {
    let mut engine = Engine::new();
    engine.disable_symbol("eval");
    engine.set_max_operations(limits.max_operations);
    engine.set_max_call_levels(limits.max_call_levels);
    engine.set_max_string_size(limits.max_string_size);
    engine.set_max_array_size(limits.max_array_size);
    engine
}

fn build_engine(state: &Rc<RefCell<RuntimeState>>, limits: &ExecutionLimits) -> Engine {
    let mut engine = script_engine(limits);

    // The resolver also answers inside script functions, which cannot see
    // the outer scope.
    engine.register_type_with_name::<Console>("Console");
    engine.register_type_with_name::<HerMagic>("Herlang");
    engine.on_var(|name, _, _| match name {
        "console" => Ok(Some(Dynamic::from(Console))),
        "herlang" => Ok(Some(Dynamic::from(HerMagic))),
        _ => Ok(None),
    });

    register_console_method!(engine, state, "log", OutputKind::Log);
    register_console_method!(engine, state, "warn", OutputKind::Warn);

    let sink = Rc::clone(state);
    engine.on_print(move |text| sink.borrow_mut().emit(OutputKind::Log, text));
    let sink = Rc::clone(state);
    engine.on_debug(move |text, _, _| sink.borrow_mut().emit(OutputKind::Warn, text));

    let runtime = Rc::clone(state);
    engine.register_fn("summonDragon", move |_: HerMagic, wish: Dynamic| {
        runtime.borrow_mut().summon_dragon(&dynamic_to_text(&wish));
    });
    let runtime = Rc::clone(state);
    engine.register_fn("openBlindBox", move |_: HerMagic| {
        runtime.borrow_mut().open_blind_box()
    });

    engine.register_get("length", |text: &mut ImmutableString| {
        text.chars().count() as INT
    });
    engine.register_get("length", |items: &mut Array| items.len() as INT);

    engine
}

#[cfg(test)]
mod executor_tests {
    use super::*;
    use crate::builtins::{BLIND_BOX_ITEMS, MAX_CONSOLE_ARGS};

    fn executor() -> Executor {
        Executor::new(ExecutorOptions {
            seed: Some(7),
            ..ExecutorOptions::default()
        })
    }

    fn kinds(executor: &Executor) -> Vec<OutputKind> {
        executor.events().iter().map(|event| event.kind).collect()
    }

    #[test]
    fn declaration_produces_no_events() {
        let executor = executor();
        assert_eq!(executor.execute("let x = 5;"), ExecuteOutcome::Completed);
        assert!(executor.events().is_empty());
    }

    #[test]
    fn console_log_appends_one_log_event() {
        let executor = executor();
        assert_eq!(executor.execute("console.log(\"hi\")"), ExecuteOutcome::Completed);
        let events = executor.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, OutputKind::Log);
        assert_eq!(events[0].payload, "hi");
    }

    #[test]
    fn console_joins_arguments_and_warns() {
        let executor = executor();
        executor.execute("let x = 5; console.log(\"x is\", x * 2, true); console.warn(\"careful\");");
        let events = executor.events();
        assert_eq!(events[0].payload, "x is 10 true");
        assert_eq!(events[1].kind, OutputKind::Warn);
        assert_eq!(events[1].payload, "careful");
    }

    #[test]
    fn console_accepts_many_arguments_and_names_its_limit() {
        let executor = executor();
        let args = (1..=MAX_CONSOLE_ARGS).map(|n| n.to_string()).collect::<Vec<_>>();
        let code = format!("console.log({});", args.join(", "));
        assert_eq!(executor.execute(&code), ExecuteOutcome::Completed);
        assert_eq!(executor.events()[0].payload, args.join(" "));

        let too_many = format!("console.log({}, 0);", args.join(", "));
        let outcome = executor.execute(&too_many);
        let message = format!("console.log accepts at most {} arguments", MAX_CONSOLE_ARGS);
        assert_eq!(outcome, ExecuteOutcome::Failed { message: message.clone() });
        assert_eq!(executor.events()[1].payload, message);
    }

    #[test]
    fn thrown_value_becomes_one_error_event() {
        let executor = executor();
        let outcome = executor.execute("console.log(\"before\");\nthrow \"哼！我不干了！\";\nconsole.log(\"after\");");
        assert_eq!(
            outcome,
            ExecuteOutcome::Failed {
                message: "哼！我不干了！".to_string()
            }
        );
        assert_eq!(kinds(&executor), vec![OutputKind::Log, OutputKind::Error]);
        assert_eq!(executor.events()[1].payload, "哼！我不干了！");
    }

    #[test]
    fn errors_inside_functions_report_the_inner_cause() {
        let executor = executor();
        executor.execute("fn wish() { throw \"boom\"; }\nwish();");
        assert_eq!(executor.events()[0].payload, "boom");
    }

    #[test]
    fn builtins_are_reachable_inside_functions() {
        let executor = executor();
        executor.execute("fn greet(name) { console.log(\"hi \" + name); }\ngreet(\"her\");");
        assert_eq!(executor.events()[0].payload, "hi her");
    }

    #[test]
    fn no_other_ambient_names_exist() {
        let executor = executor();
        let outcome = executor.execute("fetch(\"https://example.com\");");
        assert!(matches!(outcome, ExecuteOutcome::Failed { .. }));
        assert_eq!(kinds(&executor), vec![OutputKind::Error]);
        assert!(matches!(executor.execute("eval(\"1\")"), ExecuteOutcome::Failed { .. }));
    }

    #[test]
    fn invalid_code_fails_softly() {
        let executor = executor();
        assert!(matches!(executor.execute("let = ;"), ExecuteOutcome::Failed { .. }));
        assert_eq!(kinds(&executor), vec![OutputKind::Error]);
    }

    #[test]
    fn runaway_loops_hit_the_operation_limit() {
        let executor = Executor::new(ExecutorOptions {
            seed: Some(1),
            limits: ExecutionLimits {
                max_operations: 10_000,
                ..ExecutionLimits::default()
            },
            ..ExecutorOptions::default()
        });
        assert!(matches!(executor.execute("loop {}"), ExecuteOutcome::Failed { .. }));
        assert_eq!(kinds(&executor), vec![OutputKind::Error]);
    }

    #[test]
    fn summon_dragon_shows_art_then_message_after_delay() {
        let executor = executor();
        executor.execute("herlang.summonDragon(\"x\")");
        assert_eq!(kinds(&executor), vec![OutputKind::Artwork]);
        assert_eq!(executor.events()[0].payload, DRAGON_ART);
        assert_eq!(executor.dragon_state(), DragonState::MessagePending);

        assert_eq!(executor.advance(DRAGON_DELAY_MS - 1), 0);
        assert_eq!(executor.advance(1), 1);
        let events = executor.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, OutputKind::Message);
        assert!(events[1].payload.contains("\"x\""));
        assert_eq!(events[1].timestamp_ms, DRAGON_DELAY_MS);
        assert!(events[0].sequence < events[1].sequence);
        assert_eq!(executor.dragon_state(), DragonState::MessageShown);
    }

    #[test]
    fn second_summon_replaces_the_pending_message() {
        let executor = executor();
        executor.execute("herlang.summonDragon(\"first\");");
        executor.advance(500);
        executor.execute("herlang.summonDragon(\"second\");");
        assert_eq!(executor.pending_tasks(), 1);
        executor.settle();

        let messages = executor
            .events()
            .into_iter()
            .filter(|event| event.kind == OutputKind::Message)
            .collect::<Vec<_>>();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].payload.contains("second"));
        assert_eq!(messages[0].timestamp_ms, 500 + DRAGON_DELAY_MS);
    }

    #[test]
    fn runtime_error_keeps_pending_dragon_message() {
        let executor = executor();
        executor.execute("herlang.summonDragon(\"a\");\nthrow \"oops\";");
        assert_eq!(executor.settle(), 1);
        assert_eq!(
            kinds(&executor),
            vec![OutputKind::Artwork, OutputKind::Error, OutputKind::Message]
        );
    }

    #[test]
    fn clear_cancels_pending_message() {
        let executor = executor();
        executor.execute("herlang.summonDragon(\"x\")");
        executor.clear();
        assert!(executor.events().is_empty());
        assert_eq!(executor.next_deadline(), None);
        assert_eq!(executor.settle(), 0);
        assert!(executor.events().is_empty());
        assert_eq!(executor.dragon_state(), DragonState::Idle);
    }

    #[test]
    fn sequence_keeps_counting_after_clear() {
        let executor = executor();
        executor.execute("console.log(1); console.log(2);");
        executor.clear();
        executor.execute("console.log(3);");
        assert_eq!(executor.events()[0].sequence, 2);
    }

    #[test]
    fn blind_box_draws_stay_in_the_reward_set() {
        let executor = executor();
        for _ in 0..1000 {
            let item = executor.state.borrow_mut().open_blind_box();
            assert!(BLIND_BOX_ITEMS.contains(&item.as_str()), "{}", item);
        }
        executor.execute("let 今日幸运 = herlang.openBlindBox();\nconsole.log(\"今日盲盒开出了：\", 今日幸运);");
        let payload = &executor.events()[0].payload;
        assert!(BLIND_BOX_ITEMS
            .iter()
            .any(|item| payload == &format!("今日盲盒开出了： {}", item)));
    }

    #[test]
    fn same_seed_draws_the_same_items() {
        let draw = || {
            let executor = executor();
            executor.execute("for i in 0..5 { console.log(herlang.openBlindBox()); }");
            executor
                .events()
                .into_iter()
                .map(|event| event.payload)
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(), draw());
        assert_eq!(draw()[..2], ["一根鸡腿🍗", "一个bug🐛"]);
    }

    #[test]
    fn print_and_debug_are_captured() {
        let executor = executor();
        executor.execute("print(\"p\"); debug(\"d\");");
        assert_eq!(kinds(&executor), vec![OutputKind::Log, OutputKind::Warn]);
        assert_eq!(executor.events()[0].payload, "p");
    }

    #[test]
    fn length_property_counts_characters() {
        let executor = executor();
        executor.execute("let name = \"小仙女\"; console.log(name.length, [1, 2].length);");
        assert_eq!(executor.events()[0].payload, "3 2");
    }

    #[test]
    fn nested_execute_is_rejected() {
        let executor = executor();
        executor.running.set(true);
        assert_eq!(executor.execute("console.log(1)"), ExecuteOutcome::Rejected);
        assert!(executor.events().is_empty());
        executor.running.set(false);
        assert_eq!(executor.execute("console.log(1)"), ExecuteOutcome::Completed);
    }

    #[test]
    fn subscribers_see_delayed_events() {
        let executor = executor();
        let receiver = executor.subscribe();
        executor.execute("herlang.summonDragon(\"x\")");
        executor.settle();
        let kinds = receiver.try_iter().map(|event| event.kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![OutputKind::Artwork, OutputKind::Message]);
    }
}
