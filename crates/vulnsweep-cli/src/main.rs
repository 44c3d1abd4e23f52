use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use vulnsweep_core::{build_classifier, report_path, run_models, RunConfiguration};

#[derive(Parser, Debug)]
#[command(
    name = "vulnsweep",
    author,
    version,
    about = "Ask language models for a security verdict on every source file in a tree"
)]
struct Cli {
    /// JSON configuration file holding the API key
    #[arg(
        long = "config",
        value_name = "FILE",
        default_value = vulnsweep_core::config::DEFAULT_CONFIG_PATH,
        global = true
    )]
    config: PathBuf,

    /// Source directory to analyze (overrides `root_dir` from the configuration)
    #[arg(long = "root", value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// Model identifier to run; repeat to run several, in order
    #[arg(long = "model", value_name = "ID", global = true)]
    models: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze the source tree once per model and write one workbook each
    Analyze,
    /// List the models that would run and the report each one writes
    Models,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    match cli.command.unwrap_or(Commands::Analyze) {
        Commands::Analyze => analyze(&config).await?,
        Commands::Models => list_models(&config),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<RunConfiguration> {
    let mut config = RunConfiguration::load(&cli.config)?;
    if let Some(root) = &cli.root {
        config.root_dir = root.clone();
    }
    if !cli.models.is_empty() {
        config = config.with_models(cli.models.clone())?;
    }
    Ok(config)
}

async fn analyze(config: &RunConfiguration) -> Result<()> {
    let classifier = build_classifier(&config.classifier)?;
    let outcomes = run_models(config, classifier.as_ref()).await?;

    println!(
        "{} model(s) analyzed in {}",
        outcomes.len(),
        config.root_dir.display()
    );
    for outcome in outcomes {
        match &outcome.save_error {
            None => println!(
                "- {model:<48} {files:>4} file(s), {failed} failed -> {path}",
                model = outcome.model,
                files = outcome.files,
                failed = outcome.failed_files,
                path = outcome.report_path.display()
            ),
            Some(err) => {
                warn!(model = %outcome.model, "report missing");
                println!(
                    "- {model:<48} {files:>4} file(s), report not saved: {err}",
                    model = outcome.model,
                    files = outcome.files,
                )
            }
        }
    }
    Ok(())
}

fn list_models(config: &RunConfiguration) {
    println!(
        "{} model(s) configured for {} (provider {})",
        config.models.len(),
        config.root_dir.display(),
        config.classifier.provider
    );
    for model in &config.models {
        println!(
            "- {model:<48} -> {}",
            report_path(&config.root_dir, model).display()
        );
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
