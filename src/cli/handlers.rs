//! Command handlers
//!
//! Each handler returns the process exit code. Failures are logged with
//! `error!` and turned into `1`; nothing below this layer exits.

use super::commands::{AnalyzeArgs, InitArgs, ModelsArgs, RefineArgs};
use super::output::{ListFormat, OutputFormatter};
use crate::analyzer::{is_video, AnalysisResult, BatchEntry, MockupAnalyzer};
use crate::config::FeatureGenConfig;
use crate::gateway::ModelGateway;
use crate::progress::{ConsoleHandler, ProgressHandler};
use crate::requirements::RequirementsComposer;
use anyhow::{bail, Context, Result};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

fn load_config() -> Result<FeatureGenConfig> {
    let config = FeatureGenConfig::from_env().context("Invalid environment configuration")?;
    config.validate().context("Invalid configuration")?;
    debug!("{}", config);
    Ok(config)
}

fn console_progress() -> Arc<dyn ProgressHandler> {
    Arc::new(ConsoleHandler::new())
}

fn build_gateway(
    config: &FeatureGenConfig,
    progress: Arc<dyn ProgressHandler>,
) -> Result<Arc<ModelGateway>> {
    let gateway = config
        .create_gateway()
        .context("Failed to initialize model gateway")?
        .with_progress(progress);
    Ok(Arc::new(gateway))
}

fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

fn print_install_hint(endpoint: &str) {
    eprintln!("\nOllama is not running or not reachable at {}", endpoint);
    eprintln!("\nPossible solutions:");
    eprintln!("  - Install Ollama: curl -fsSL https://ollama.com/install.sh | sh");
    eprintln!("  - Or visit: https://ollama.com");
    eprintln!("  - Start the service: ollama serve");
    eprintln!("  - Check FEATURE_GEN_OLLAMA_HOST / OLLAMA_HOST");
}

pub async fn handle_init(args: &InitArgs) -> i32 {
    exit_code(run_init(args).await)
}

async fn run_init(args: &InitArgs) -> Result<()> {
    info!("Checking Ollama setup and models");
    let config = load_config()?;
    let gateway = build_gateway(&config, console_progress())?;

    if !gateway.check_health().await {
        print_install_hint(&gateway.endpoint());
        bail!("Ollama is not available");
    }
    println!("\u{2713} Ollama is running at {}", gateway.endpoint());

    let models = gateway.list_models().await;
    println!();
    print!(
        "{}",
        OutputFormatter::new(ListFormat::Human).format_models(&models)?
    );

    let recommended = gateway.recommended_models().clone();
    println!("\nRecommended models:");
    println!("  Vision model: {}", recommended.vision);
    println!("  LLM model:    {}", recommended.llm);

    let mut missing = Vec::new();
    for model in [&recommended.vision, &recommended.llm] {
        if !gateway.model_exists(model).await {
            missing.push(model.clone());
        }
    }

    if missing.is_empty() {
        println!("\n\u{2713} All recommended models are available");
        return Ok(());
    }

    println!("\nMissing models: {}", missing.join(", "));
    if args.no_pull || !(args.yes || confirm_pull()?) {
        println!("\nYou can pull models later with:");
        for model in &missing {
            println!("  ollama pull {}", model);
        }
        return Ok(());
    }

    let mut failed = Vec::new();
    for model in &missing {
        if !gateway.pull_model(model).await {
            failed.push(model.as_str());
        }
    }
    if !failed.is_empty() {
        bail!("Failed to pull: {}", failed.join(", "));
    }

    println!("\n\u{2713} Setup complete");
    Ok(())
}

/// Asks on stdin; anything but an explicit "no" on a terminal counts as yes
fn confirm_pull() -> Result<bool> {
    if !io::stdin().is_terminal() {
        debug!("stdin is not a terminal, not pulling without --yes");
        return Ok(false);
    }

    print!("Pull the missing models now? [Y/n] ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input.is_empty() || input == "y" || input == "yes")
}

pub async fn handle_analyze(args: &AnalyzeArgs) -> i32 {
    exit_code(run_analyze(args).await)
}

async fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let config = load_config()?;
    let vision_model = args
        .vision_model
        .clone()
        .unwrap_or_else(|| config.vision_model.clone());
    let llm_model = args
        .llm_model
        .clone()
        .unwrap_or_else(|| config.llm_model.clone());
    let frame_interval = match args.frame_interval {
        Some(n) => usize::try_from(n).context("Frame interval out of range")?,
        None => config.frame_interval,
    };

    let inputs = &args.inputs;
    let video_input = inputs.len() == 1 && is_video(&inputs[0]);
    if !video_input && inputs.iter().any(|p| is_video(p)) {
        bail!("A video must be the only input");
    }
    if inputs.len() > 1 && args.prompt.is_some() {
        warn!("--prompt only applies to single-image analysis, ignoring it");
    }

    let progress = console_progress();
    let gateway = build_gateway(&config, progress.clone())?;
    let analyzer = MockupAnalyzer::new(gateway.clone()).with_progress(progress.clone());
    let composer =
        RequirementsComposer::new(gateway, config.template_store()).with_progress(progress);

    info!(
        "Analyzing {} {}",
        inputs.len(),
        if video_input { "video" } else { "image(s)" }
    );

    let (requirements, analyses) = if video_input {
        let video = analyzer
            .analyze_video(&inputs[0], frame_interval, &vision_model)
            .await?;
        report_failures(&video.frame_analyses);

        let successful: Vec<&AnalysisResult> = video.successful().collect();
        let requirements = match successful.as_slice() {
            [] => bail!("No frames of {} could be analyzed", video.video_name),
            [only] => {
                composer
                    .build_requirements(only, &args.template, &llm_model, args.format)
                    .await?
            }
            _ => {
                composer
                    .build_multi_screen_requirements(
                        &video.frame_analyses,
                        &args.template,
                        &llm_model,
                    )
                    .await?
            }
        };
        (requirements, serde_json::to_value(&video)?)
    } else if inputs.len() == 1 {
        let analysis = analyzer
            .analyze_image(&inputs[0], &vision_model, args.prompt.as_deref())
            .await?;
        let requirements = composer
            .build_requirements(&analysis, &args.template, &llm_model, args.format)
            .await?;
        (requirements, serde_json::to_value(&analysis)?)
    } else {
        let entries = analyzer.analyze_batch(inputs, &vision_model).await;
        report_failures(&entries);
        let requirements = composer
            .build_multi_screen_requirements(&entries, &args.template, &llm_model)
            .await?;
        (requirements, serde_json::to_value(&entries)?)
    };

    if let Some(path) = &args.analysis_output {
        let json = serde_json::to_string_pretty(&analyses)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Analysis saved to: {}", path.display());
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&inputs[0]));
    let saved = composer.save_output(&requirements, &output_path, args.format.prompt_name())?;

    println!("\u{2713} Analysis complete");
    println!("Requirements saved to: {}", saved.display());
    println!("\nNext steps:");
    println!("  - Review: cat {}", saved.display());
    println!(
        "  - Refine: feature-gen refine {} --feedback \"...\"",
        saved.display()
    );
    Ok(())
}

fn report_failures(entries: &[BatchEntry]) {
    let failed = entries.iter().filter(|e| e.is_error()).count();
    if failed > 0 {
        warn!("{} of {} analyses failed", failed, entries.len());
    }
}

/// `<first-input-stem>-requirements.md` in the working directory
fn default_output_path(first_input: &Path) -> PathBuf {
    let stem = first_input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mockup".to_string());
    PathBuf::from(format!("{}-requirements.md", stem))
}

pub async fn handle_refine(args: &RefineArgs) -> i32 {
    exit_code(run_refine(args).await)
}

async fn run_refine(args: &RefineArgs) -> Result<()> {
    let config = load_config()?;
    let llm_model = args
        .llm_model
        .clone()
        .unwrap_or_else(|| config.llm_model.clone());

    let requirements = std::fs::read_to_string(&args.requirements)
        .with_context(|| format!("Failed to read {}", args.requirements.display()))?;
    let feedback = match (&args.feedback, &args.feedback_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => bail!("Provide --feedback or --feedback-file"),
    };
    if feedback.trim().is_empty() {
        bail!("Feedback is empty");
    }

    let gateway = build_gateway(&config, console_progress())?;
    let composer = RequirementsComposer::new(gateway, config.template_store())
        .with_progress(console_progress());

    let refined = composer
        .refine_requirements(&requirements, &feedback, &llm_model)
        .await?;

    let output = args.output.as_ref().unwrap_or(&args.requirements);
    let saved = composer.save_output(&refined, output, "markdown")?;
    println!("\u{2713} Requirements refined");
    println!("Saved to: {}", saved.display());
    Ok(())
}

pub async fn handle_models(args: &ModelsArgs) -> i32 {
    exit_code(run_models(args).await)
}

async fn run_models(args: &ModelsArgs) -> Result<()> {
    let config = load_config()?;
    let gateway = build_gateway(&config, console_progress())?;

    if !gateway.check_health().await {
        print_install_hint(&gateway.endpoint());
        bail!("Ollama is not available");
    }

    let models = gateway.list_models().await;
    let format: ListFormat = args.format.into();
    print!("{}", OutputFormatter::new(format).format_models(&models)?);

    if models.is_empty() && format == ListFormat::Human {
        let recommended = gateway.recommended_models();
        println!("Pull models with:");
        println!("  ollama pull {}", recommended.vision);
        println!("  ollama pull {}", recommended.llm);
    }
    Ok(())
}

pub async fn handle_templates() -> i32 {
    exit_code(run_templates())
}

fn run_templates() -> Result<()> {
    let config = load_config()?;
    let store = config.template_store();
    for dir in store.search_dirs() {
        debug!("Template search directory: {}", dir.display());
    }

    let templates = store.list();
    print!(
        "{}",
        OutputFormatter::new(ListFormat::Human).format_templates(&templates)?
    );
    Ok(())
}
