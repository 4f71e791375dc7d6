//! authorfold - author-grouped leave-one-out evaluation
//!
//! Usage:
//!   authorfold run --config run.toml --corpus vols/ --metadata meta.tsv --output preds.csv
//!   authorfold run ... --coefficients coefs.csv --term-scores bns.tsv --workers 8
//!   authorfold vocabulary --config run.toml --corpus vols/ --metadata meta.tsv

use anyhow::{Context, Result};
use authorfold::config::RunConfig;
use authorfold::pipeline::{Pipeline, RunOutput};
use authorfold::report;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Evaluate text models with leave-one-out folds that exclude same-author
/// documents.
#[derive(Parser)]
#[command(name = "authorfold")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print the run summary as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

/// Input paths shared by every subcommand.
#[derive(clap::Args)]
struct Inputs {
    /// Run configuration (TOML)
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// Directory of per-volume word-count files
    #[arg(long, value_name = "DIR")]
    corpus: PathBuf,

    /// Tab-separated metadata table
    #[arg(long, value_name = "FILE")]
    metadata: PathBuf,

    /// Override the configured worker count
    #[arg(long)]
    workers: Option<usize>,

    /// Override the configured vocabulary size
    #[arg(long)]
    vocab_size: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run grouped leave-one-out and write per-document predictions
    Run {
        #[command(flatten)]
        inputs: Inputs,

        /// Predictions CSV
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Coefficients of a model fitted on every trainable document
        #[arg(long, value_name = "FILE")]
        coefficients: Option<PathBuf>,

        /// Bi-normal separation scores of the selected terms
        #[arg(long, value_name = "FILE")]
        term_scores: Option<PathBuf>,
    },

    /// Print the selected vocabulary, one term per line
    Vocabulary {
        #[command(flatten)]
        inputs: Inputs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run {
            inputs,
            output,
            coefficients,
            term_scores,
        } => {
            let pipeline = Pipeline::new(load_config(&inputs)?);
            let result = pipeline
                .run(&inputs.corpus, &inputs.metadata)
                .context("evaluation failed")?;
            write_reports(
                &pipeline,
                &result,
                &output,
                coefficients.as_deref(),
                term_scores.as_deref(),
            )?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result.summary)?);
            } else {
                let s = &result.summary;
                info!(
                    documents = s.documents,
                    predicted = s.predicted,
                    unavailable = s.unavailable,
                    banned = s.banned,
                    "run complete"
                );
            }
        }
        Commands::Vocabulary { inputs } => {
            let pipeline = Pipeline::new(load_config(&inputs)?);
            let prepared = pipeline
                .prepare(&inputs.corpus, &inputs.metadata)
                .context("vocabulary selection failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(prepared.selection.vocabulary().terms())?);
            } else {
                for term in prepared.selection.vocabulary().terms() {
                    println!("{term}");
                }
            }
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "authorfold=debug"
    } else if quiet {
        "authorfold=warn"
    } else {
        "authorfold=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(inputs: &Inputs) -> Result<RunConfig> {
    let mut config = RunConfig::load(&inputs.config)
        .with_context(|| format!("cannot load config {}", inputs.config.display()))?;
    config
        .apply_overrides(inputs.workers, inputs.vocab_size)
        .context("invalid command-line override")?;
    Ok(config)
}

fn write_reports(
    pipeline: &Pipeline,
    result: &RunOutput,
    output: &Path,
    coefficients: Option<&Path>,
    term_scores: Option<&Path>,
) -> Result<()> {
    let auxiliary = &pipeline.config().report.auxiliary;
    report::write_file(output, |f| report::write_predictions(f, auxiliary, &result.rows))
        .with_context(|| format!("cannot write {}", output.display()))?;

    if let Some(path) = coefficients {
        match &result.coefficients {
            Some(rows) => report::write_file(path, |f| report::write_coefficients(f, rows))
                .with_context(|| format!("cannot write {}", path.display()))?,
            None => tracing::warn!(path = %path.display(), "no full-model fit, coefficients not written"),
        }
    }

    if let Some(path) = term_scores {
        match &result.term_scores {
            Some(scores) => report::write_file(path, |f| report::write_term_scores(f, scores))
                .with_context(|| format!("cannot write {}", path.display()))?,
            None => tracing::warn!(path = %path.display(), "frequency selection has no term scores"),
        }
    }
    Ok(())
}
