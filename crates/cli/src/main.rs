use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blobsieve_core::{
    evaluate_suite_file, load_classifier, render_markdown_summary, run_classification, Blob,
    Classifier, ScanOptions,
};
use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "blobsieve",
    version,
    about = "Classify the files of a dumped Android partition into proprietary blob sections."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Walk a partition dump and emit a JSON classification report.
    Classify(ClassifyArgs),
    /// Classify literal partition-relative paths.
    Check(CheckArgs),
    /// List registered sections in priority order.
    Sections(SectionsArgs),
    /// Evaluate the classifier against a fixture suite.
    Eval(EvalArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// JSON config adding ignore rules and sections.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ClassifyArgs {
    /// Root of the dumped partition (e.g. dump/vendor).
    #[arg(long, value_name = "DIR")]
    root: PathBuf,

    /// Output report path.
    #[arg(long, default_value = "blobsieve-report.json", value_name = "FILE")]
    output: PathBuf,

    /// Optional markdown summary output file.
    #[arg(long, value_name = "FILE")]
    md: Option<PathBuf>,

    /// Maximum traversal depth (root is depth 0).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Exclude glob patterns matched against root-relative paths (repeatable).
    #[arg(long = "exclude", value_name = "GLOB", num_args = 1.., action = ArgAction::Append)]
    exclude: Vec<String>,

    /// Log walk progress.
    #[arg(long)]
    progress: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Paths relative to the partition root.
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Args)]
struct SectionsArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Args)]
struct EvalArgs {
    /// Evaluation suite JSON file.
    #[arg(long, value_name = "FILE", default_value = "fixtures/classify-suite.json")]
    suite: PathBuf,

    /// Optional JSON output file for evaluation result.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify(args) => run_classify_command(args),
        Commands::Check(args) => run_check_command(args),
        Commands::Sections(args) => run_sections_command(args),
        Commands::Eval(args) => run_eval_command(args),
    }
}

fn build_classifier(args: &ConfigArgs) -> Result<Classifier> {
    let classifier = load_classifier(args.config.as_deref()).with_context(|| match &args.config {
        Some(path) => format!("failed to load classifier config {}", path.display()),
        None => "failed to build stock classifier".to_string(),
    })?;
    debug!(
        sections = classifier.registry().sections().len(),
        patterns = classifier.catalog().patterns().len(),
        "classifier ready"
    );
    Ok(classifier)
}

fn run_classify_command(args: ClassifyArgs) -> Result<()> {
    let classifier = build_classifier(&args.config)?;
    let options = ScanOptions {
        root: args.root,
        max_depth: args.max_depth,
        excludes: args.exclude,
        config: args
            .config
            .config
            .as_ref()
            .map(|path| path.to_string_lossy().to_string()),
        progress: args.progress,
        ..ScanOptions::default()
    };

    let report = run_classification(&options, &classifier)?;
    write_json(&args.output, &report, "report")?;

    println!("Report written to {}", args.output.display());
    println!(
        "Classified {} blob(s): {} categorized in {} section(s), {} uncategorized, {} excluded, {} warning(s).",
        report.metrics.scanned_files,
        report.metrics.categorized,
        report.sections.len(),
        report.metrics.uncategorized,
        report.metrics.excluded,
        report.warnings.len()
    );

    if let Some(md_path) = args.md {
        let markdown = render_markdown_summary(&report);
        fs::write(&md_path, markdown).with_context(|| {
            format!("failed to write markdown summary to {}", md_path.display())
        })?;
        println!("Markdown summary written to {}", md_path.display());
    }

    Ok(())
}

fn run_check_command(args: CheckArgs) -> Result<()> {
    let classifier = build_classifier(&args.config)?;
    for path in &args.paths {
        let blob = Blob::from_relative(path)
            .with_context(|| format!("invalid blob path {}", path.display()))?;
        println!("{}: {}", blob, classifier.classify_file(&blob));
    }
    Ok(())
}

fn run_sections_command(args: SectionsArgs) -> Result<()> {
    let classifier = build_classifier(&args.config)?;
    for (index, section) in classifier.registry().sections().iter().enumerate() {
        println!("{}. {}", index + 1, section.name());
        if !section.interfaces().is_empty() {
            println!("   interfaces: {}", section.interfaces().join(", "));
        }
        if !section.libraries().is_empty() {
            println!("   libraries: {}", section.libraries().join(", "));
        }
        if !section.folders().is_empty() {
            println!("   folders: {}", section.folders().join(", "));
        }
    }
    Ok(())
}

fn run_eval_command(args: EvalArgs) -> Result<()> {
    let classifier = build_classifier(&args.config)?;
    let result = evaluate_suite_file(&args.suite, &classifier)?;
    println!(
        "Eval: {}/{} cases passed | accuracy {:.3}",
        result.passed_cases, result.total_cases, result.accuracy
    );

    for case in &result.case_results {
        println!(
            "- [{}] {} | {} | expected {} | observed {}{}",
            if case.passed { "PASS" } else { "FAIL" },
            case.name,
            case.path,
            case.expected,
            case.observed,
            case.detail
                .as_ref()
                .map(|detail| format!(" ({detail})"))
                .unwrap_or_default()
        );
    }

    if let Some(output) = args.output {
        write_json(&output, &result, "eval")?;
        println!("Evaluation JSON written to {}", output.display());
    }

    if result.passed_cases != result.total_cases {
        anyhow::bail!(
            "{} evaluation case(s) failed",
            result.total_cases - result.passed_cases
        );
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T, label: &str) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {label}"))?;
    fs::write(path, payload)
        .with_context(|| format!("failed to write {label} to {}", path.display()))?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn parses_classify_with_repeated_excludes() {
        let cli = Cli::try_parse_from([
            "blobsieve",
            "classify",
            "--root",
            "dump/vendor",
            "--exclude",
            "**/*.tmp",
            "--exclude",
            "firmware",
            "--config",
            "blobsieve.json",
        ])
        .expect("arguments parse");

        match cli.command {
            Commands::Classify(args) => {
                assert_eq!(args.exclude, ["**/*.tmp", "firmware"]);
                assert_eq!(args.output.to_str(), Some("blobsieve-report.json"));
                assert!(args.config.config.is_some());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn check_requires_a_path() {
        assert!(Cli::try_parse_from(["blobsieve", "check"]).is_err());
    }
}
