use feature_gen::cli::commands::{CliArgs, Commands};
use feature_gen::cli::handlers::{
    handle_analyze, handle_init, handle_models, handle_refine, handle_templates,
};
use feature_gen::util::logging::{init_logging, resolve_level, LoggingConfig};
use feature_gen::VERSION;

use clap::Parser;
use std::env;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("feature-gen v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Init(init_args) => handle_init(init_args).await,
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args).await,
        Commands::Refine(refine_args) => handle_refine(refine_args).await,
        Commands::Models(models_args) => handle_models(models_args).await,
        Commands::Templates => handle_templates().await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    if let Some(level) = &args.log_level {
        if feature_gen::util::logging::parse_level(level).is_none() {
            eprintln!(
                "Invalid log level '{}'. Valid levels: trace, debug, info, warn, error",
                level
            );
        }
    }

    let env_level = env::var("FEATURE_GEN_LOG_LEVEL").ok();
    let level = resolve_level(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
        env_level.as_deref(),
    );

    let mut config = LoggingConfig::from_env();
    config.level = level;
    init_logging(config);
}
