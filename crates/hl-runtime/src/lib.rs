mod blind_box;
mod bridge;
mod builtins;
mod executor;
mod output;
mod scheduler;

pub use blind_box::BlindBox;
pub use builtins::{
    dragon_message, DragonState, BLIND_BOX_ITEMS, DRAGON_ART, DRAGON_DELAY_MS, MAX_CONSOLE_ARGS,
};
pub use executor::{script_engine, ExecuteOutcome, ExecutionLimits, Executor, ExecutorOptions};
pub use output::OutputLog;
pub use scheduler::{Fired, Scheduler, TaskId};
