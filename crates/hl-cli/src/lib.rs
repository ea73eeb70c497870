use std::ffi::OsString;

use clap::Parser;
use hl_core::HerlangError;

mod cli_args;
mod emit;
mod error_map;
mod logging;
mod models;
mod runner;
mod source_loader;

pub(crate) use cli_args::{Cli, Command, DialectsArgs, RunArgs, SourceArgs, TranslateArgs};
#[cfg(test)]
pub(crate) use cli_args::DialectArgs;
pub(crate) use error_map::{emit_error, map_cli_dialect_read, map_cli_source_read};
pub use logging::init_logging;
pub(crate) use models::DialectListing;
pub(crate) use source_loader::{load_dialect_files, load_source};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, HerlangError> {
    match cli.command {
        Command::Translate(args) => runner::run_translate(args),
        Command::Run(args) => runner::run_program(args),
        Command::Dialects(args) => runner::run_dialects(args),
    }
}
