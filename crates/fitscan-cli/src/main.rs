//! fitscan CLI - garment scene screening.
//!
//! Single binary that provides:
//! - `fitscan analyze <FILE>` - scores, confidence and anomalies
//! - `fitscan checklist <FILE>` - manual-validation checklist
//! - `fitscan default-config` - print the default engine configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use fitscan_core::{AnalysisResult, Analyzer, EngineConfig, Priority};

#[derive(Parser)]
#[command(name = "fitscan")]
#[command(about = "Garment scene accessibility, inclusivity and sustainability screening", version)]
struct Cli {
    /// Engine configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a glTF/GLB garment scene
    Analyze {
        /// Scene file
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the manual-validation checklist for a scene
    Checklist {
        /// Scene file
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the default configuration as YAML
    DefaultConfig,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// `--verbose` forces debug; otherwise a valid `RUST_LOG` wins over the
/// `info` default.
fn log_filter(verbose: bool, env: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    fmt()
        .with_env_filter(log_filter(cli.verbose, env.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze { file, format } => {
            let result = run_analysis(&file, cli.config.as_deref())?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Text => print_report(&file, &result),
            }
            Ok(())
        }
        Commands::Checklist { file, format } => {
            let result = run_analysis(&file, cli.config.as_deref())?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&result.checklist)?)
                }
                OutputFormat::Text => print_checklist(&result),
            }
            Ok(())
        }
        Commands::DefaultConfig => {
            print!("{}", EngineConfig::default().to_yaml()?);
            Ok(())
        }
    }
}

fn run_analysis(file: &Path, config_path: Option<&Path>) -> Result<AnalysisResult> {
    let config = EngineConfig::load_or_default(config_path).context("Failed to load config")?;
    let analyzer = Analyzer::with_config(config)?;

    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    tracing::info!(file = %file.display(), bytes = bytes.len(), "Loaded scene file");

    analyzer
        .analyze_bytes(&bytes)
        .with_context(|| format!("Failed to parse {}", file.display()))
}

fn print_report(file: &Path, result: &AnalysisResult) {
    let summary = &result.summary;
    let scores = &result.scores;
    let confidence = &result.confidence;

    println!("fitscan report: {}", file.display());
    println!("==========================");
    println!();
    println!(
        "Generator: {}",
        summary.generator.as_deref().unwrap_or("<none>")
    );
    println!(
        "Nodes: {}, meshes: {}, materials: {}, garment: {:?}",
        summary.node_count, summary.mesh_count, summary.material_count, summary.garment_type
    );
    if let Some(reason) = summary.unsupported {
        println!("Baseline scoring: {}", reason.describe());
    }
    println!();
    println!("Scores");
    println!("  Inclusivity:    {:>3}", scores.inclusivity.score);
    println!("  Accessibility:  {:>3}", scores.accessibility.score);
    println!("  Sustainability: {:>3}", scores.sustainability.score);
    println!();
    println!("Confidence: {:.2}", confidence.overall);
    for category in confidence.categories() {
        println!(
            "  {:<24} {:.2} ({}/{} surviving, weight {:.2})",
            category.category.label(),
            category.confidence,
            category.surviving,
            category.detected,
            category.weight
        );
    }
    if confidence.anomaly_penalty > 0.0 {
        println!("  anomaly penalty          -{:.2}", confidence.anomaly_penalty);
    }

    if !result.anomalies.is_empty() {
        println!();
        println!("Anomalies:");
        for flag in &result.anomalies {
            println!("  [{:?}] {}", flag.severity, flag.message);
        }
    }

    if !result.features.is_empty() {
        println!();
        println!("Features: {}", result.features.len());
        for feature in result.features.iter().take(10) {
            println!(
                "  - {:?} '{}' {:.2}",
                feature.subtype, feature.source.name, feature.confidence
            );
        }
        if result.features.len() > 10 {
            println!("  ... and {} more", result.features.len() - 10);
        }
    }

    if !result.recommendations.is_empty() {
        println!();
        println!("Recommendations:");
        for rec in &result.recommendations {
            println!("  - {rec}");
        }
    }

    println!();
    println!(
        "Checklist: {} items, ~{} minutes (run 'fitscan checklist' for details)",
        result.checklist.len(),
        result.checklist_minutes
    );
}

fn print_checklist(result: &AnalysisResult) {
    println!("Validation checklist");
    println!("====================");
    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        let items: Vec<_> = result
            .checklist
            .iter()
            .filter(|i| i.priority == priority)
            .collect();
        if items.is_empty() {
            continue;
        }
        println!();
        println!("{priority:?} ({})", items.len());
        for item in items {
            println!(
                "  - {} [{:?}, {} min]",
                item.description, item.reviewer, item.effort_minutes
            );
        }
    }
    println!();
    println!("Estimated effort: {} minutes", result.checklist_minutes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_is_honoured_unless_verbose() {
        assert_eq!(log_filter(false, None).to_string(), "info");
        assert_eq!(
            log_filter(false, Some("fitscan_core=trace")).to_string(),
            "fitscan_core=trace"
        );
        assert_eq!(log_filter(true, Some("warn")).to_string(), "debug");
    }

    #[test]
    fn invalid_rust_log_falls_back_to_info() {
        assert_eq!(log_filter(false, Some("fitscan=loud")).to_string(), "info");
    }
}
