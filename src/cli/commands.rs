use crate::requirements::{OutputFormat, DEFAULT_TEMPLATE};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Turn UI mockups into software requirements with local AI models
#[derive(Parser, Debug)]
#[command(
    name = "feature-gen",
    about = "Turn UI mockups into software requirements with local AI models",
    version,
    long_about = "feature-gen sends mockup images, wireframes or screen recordings to a \
                  local vision model served by Ollama, then asks a text model to turn the \
                  analysis into a structured requirements document."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Check Ollama and install recommended models",
        long_about = "Checks that the Ollama service is reachable, lists installed models and \
                      offers to pull the recommended vision and text models.\n\n\
                      Examples:\n  \
                      feature-gen init\n  \
                      feature-gen init --yes\n  \
                      feature-gen init --no-pull"
    )]
    Init(InitArgs),

    #[command(
        about = "Analyze mockups and generate requirements",
        long_about = "Analyzes one image, several images (one screen each) or a single video \
                      and writes a requirements document.\n\n\
                      Examples:\n  \
                      feature-gen analyze login.png\n  \
                      feature-gen analyze home.png cart.png checkout.png -t web_app\n  \
                      feature-gen analyze walkthrough.mp4 --frame-interval 60\n  \
                      feature-gen analyze sketch.jpg -f json -o sketch-reqs"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Refine a requirements document with feedback",
        long_about = "Sends an existing requirements document and your feedback to the text \
                      model and writes the revised document.\n\n\
                      Examples:\n  \
                      feature-gen refine login-requirements.md --feedback \"Add 2FA\"\n  \
                      feature-gen refine reqs.md --feedback-file review.txt -o reqs-v2.md"
    )]
    Refine(RefineArgs),

    #[command(about = "List installed models")]
    Models(ModelsArgs),

    #[command(about = "List available requirement templates")]
    Templates,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InitArgs {
    #[arg(short = 'y', long, help = "Pull missing models without asking")]
    pub yes: bool,

    #[arg(long, conflicts_with = "yes", help = "Never pull models")]
    pub no_pull: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        value_name = "INPUT",
        required = true,
        help = "Mockup images (png, jpg, jpeg, webp) or a single video"
    )]
    pub inputs: Vec<PathBuf>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Output file (default: <first-input>-requirements.md)"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 't',
        long,
        value_name = "NAME",
        default_value = DEFAULT_TEMPLATE,
        help = "Requirements template"
    )]
    pub template: String,

    #[arg(long, value_name = "MODEL", help = "Vision model for image analysis")]
    pub vision_model: Option<String>,

    #[arg(long, value_name = "MODEL", help = "Text model for requirements")]
    pub llm_model: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "markdown",
        help = "Requirements format"
    )]
    pub format: OutputFormat,

    #[arg(
        long,
        value_name = "N",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Analyze every Nth video frame"
    )]
    pub frame_interval: Option<u64>,

    #[arg(long, value_name = "TEXT", help = "Replace the default vision prompt")]
    pub prompt: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Also write the raw analyses as JSON"
    )]
    pub analysis_output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RefineArgs {
    #[arg(value_name = "FILE", help = "Requirements document to refine")]
    pub requirements: PathBuf,

    #[arg(
        long,
        value_name = "TEXT",
        required_unless_present = "feedback_file",
        conflicts_with = "feedback_file",
        help = "Feedback to apply"
    )]
    pub feedback: Option<String>,

    #[arg(long, value_name = "FILE", help = "Read feedback from a file")]
    pub feedback_file: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Output file (default: overwrite the input)"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "MODEL", help = "Text model for refinement")]
    pub llm_model: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ModelsArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: ListFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<ListFormatArg> for super::output::ListFormat {
    fn from(arg: ListFormatArg) -> Self {
        match arg {
            ListFormatArg::Json => super::output::ListFormat::Json,
            ListFormatArg::Yaml => super::output::ListFormat::Yaml,
            ListFormatArg::Human => super::output::ListFormat::Human,
        }
    }
}
