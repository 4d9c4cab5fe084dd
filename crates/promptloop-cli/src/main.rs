//! Promptloop CLI - declared prompts over datasets.
//!
//! `check` validates a prompt declaration, `render` prints the
//! assembled template, and `run` generates and revises outputs for
//! every record of a dataset.

mod data;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use promptloop_core::{Prompt, PromptConfig};
use promptloop_runtime::{CompletionConfig, PromptRunner, ProviderRegistry, ReviseOptions};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "promptloop")]
#[command(about = "Declared prompts with evaluation and revision", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a prompt declaration
    Check {
        /// Prompt declaration file (YAML)
        prompt: PathBuf,
    },

    /// Print the assembled prompt template
    Render {
        /// Prompt declaration file (YAML)
        prompt: PathBuf,
        /// Dataset whose first record fills the input tags
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Generate and revise outputs for every record of a dataset
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Prompt declaration file (YAML)
    prompt: PathBuf,

    /// Dataset to read records from (.json, .jsonl, .yaml)
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the processed dataset
    #[arg(short, long)]
    output: PathBuf,

    /// Provider to run against
    #[arg(long, default_value = "anthropic")]
    provider: String,

    /// Model identifier
    #[arg(long, default_value = "claude-3-5-sonnet-20241022")]
    model: String,

    /// Maximum tokens per completion
    #[arg(long, default_value_t = 4096)]
    max_tokens: u32,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Nucleus sampling cutoff
    #[arg(long, default_value_t = 1.0)]
    top_p: f32,

    /// Revision rounds allowed after the initial generation
    #[arg(long, default_value_t = 6)]
    max_revisions: usize,

    /// Skip model-judged checks when evaluating
    #[arg(long)]
    deterministic_only: bool,

    /// Generate only; skip the evaluate-revise loop
    #[arg(long)]
    no_revise: bool,

    /// Process at most this many records
    #[arg(long)]
    max_records: Option<usize>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Check { prompt } => cmd_check(&prompt),
        Commands::Render { prompt, data } => cmd_render(&prompt, data.as_deref()),
        Commands::Run(args) => cmd_run(args).await,
    }
}

fn load_prompt(path: &Path) -> Result<(PromptConfig, Prompt)> {
    let config = PromptConfig::from_yaml_file(path)
        .with_context(|| format!("failed to load prompt declaration {}", path.display()))?;
    let prompt = config.build().context("prompt declaration did not build")?;
    Ok((config, prompt))
}

fn cmd_check(path: &Path) -> Result<()> {
    let (_, prompt) = load_prompt(path)?;
    let evaluations: usize = prompt
        .outputs
        .iter()
        .map(|output| output.evaluations.len())
        .sum();
    println!(
        "OK: {} input(s), {} output(s), {} evaluation(s)",
        prompt.effective_inputs().len(),
        prompt.outputs.len(),
        evaluations
    );
    Ok(())
}

fn cmd_render(path: &Path, data: Option<&Path>) -> Result<()> {
    let (_, prompt) = load_prompt(path)?;
    let rendered = match data {
        Some(data_path) => {
            let records = data::read_records(data_path)?;
            let first = records
                .first()
                .with_context(|| format!("dataset {} has no records", data_path.display()))?;
            prompt.render_with(first)
        }
        None => prompt.render(),
    };
    println!("{rendered}");
    Ok(())
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let (config, prompt) = load_prompt(&args.prompt)?;

    let registry = ProviderRegistry::with_defaults();
    let provider = registry
        .create(&args.provider, &serde_json::json!({}))
        .with_context(|| format!("failed to construct provider `{}`", args.provider))?;

    let completion = CompletionConfig {
        model: args.model,
        max_tokens: args.max_tokens,
        temperature: args.temperature,
        top_p: args.top_p,
        ..CompletionConfig::default()
    };
    let mut runner = PromptRunner::new(provider, prompt)
        .with_completion(completion)
        .with_system_prompt(config.system_prompt.clone());

    let mut records = data::read_records(&args.input)?;
    if let Some(max_records) = args.max_records {
        records.truncate(max_records);
    }
    let total = records.len();
    let revise = ReviseOptions {
        max_revisions: args.max_revisions,
        deterministic_only: args.deterministic_only,
    };

    let mut processed = Vec::with_capacity(total);
    for (index, record) in records.into_iter().enumerate() {
        tracing::info!(record = index + 1, total, "Running prompt");
        let generated = runner.generate(&record).await?;
        let finished = if args.no_revise {
            generated
        } else {
            runner.revise(&generated, &revise).await
        };
        processed.push(finished);
    }

    data::write_records(&args.output, &processed)?;
    tracing::info!(tokens = %runner.tokens().total(), "Run finished");
    println!(
        "Wrote {} record(s) to {}",
        processed.len(),
        args.output.display()
    );
    Ok(())
}
