pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{AnalyzeArgs, CliArgs, Commands, InitArgs, ModelsArgs, RefineArgs};
pub use output::{ListFormat, OutputFormatter};
