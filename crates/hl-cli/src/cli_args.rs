use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "herlang")]
#[command(about = "Translate and run Herlang programs")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Print the generated script for a program.
    Translate(TranslateArgs),
    /// Translate, execute and print every output event.
    Run(RunArgs),
    /// List registered dialects.
    Dialects(DialectsArgs),
}

#[derive(Debug, Args)]
pub(crate) struct DialectArgs {
    #[arg(long = "dialect", default_value = "chinese")]
    pub(crate) dialect: String,
    #[arg(long = "dialect-file")]
    pub(crate) dialect_files: Vec<String>,
}

#[derive(Debug, Args)]
pub(crate) struct SourceArgs {
    #[arg(long = "file", conflicts_with = "code")]
    pub(crate) file: Option<String>,
    #[arg(long = "code")]
    pub(crate) code: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct TranslateArgs {
    #[command(flatten)]
    pub(crate) dialect: DialectArgs,
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    pub(crate) dialect: DialectArgs,
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Fire delayed events immediately instead of waiting for them.
    #[arg(long = "no-wait")]
    pub(crate) no_wait: bool,
    #[arg(long = "seed")]
    pub(crate) seed: Option<u32>,
}

#[derive(Debug, Args)]
pub(crate) struct DialectsArgs {
    #[arg(long = "dialect-file")]
    pub(crate) dialect_files: Vec<String>,
}
