//! Multimodal SVM CLI Module
//!
//! Command-line interface for running cross-validated experiments and
//! printing saved F1 summaries.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::DataLoader;
use crate::experiment::{Experiment, ExperimentConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{:<14} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    println!("  {} {}...", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("  {} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "multimodal-svm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cross-validated SVM experiments over text and audio utterance features")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON experiment configuration; flags override its fields
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Per-field overrides of the experiment configuration
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Dataset file (JSON array of utterances)
    #[arg(long, global = true)]
    pub dataset: Option<PathBuf>,

    /// Word embeddings file (GloVe text format)
    #[arg(long, global = true)]
    pub embeddings: Option<PathBuf>,

    /// Audio features file (JSON object keyed by utterance id)
    #[arg(long, global = true)]
    pub audio_features: Option<PathBuf>,

    /// Directory for results files
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Model name used for the results file
    #[arg(long, global = true)]
    pub model_name: Option<String>,

    /// Number of train + report repetitions
    #[arg(long, global = true)]
    pub runs: Option<usize>,

    /// Number of stratified folds
    #[arg(long, global = true)]
    pub folds: Option<usize>,

    /// Number of label classes
    #[arg(long, global = true)]
    pub num_classes: Option<usize>,

    /// Use target utterance text
    #[arg(long, global = true, value_name = "BOOL")]
    pub text: Option<bool>,

    /// Use target utterance audio
    #[arg(long, global = true, value_name = "BOOL")]
    pub audio: Option<bool>,

    /// Append speaker features
    #[arg(long, global = true, value_name = "BOOL")]
    pub author: Option<bool>,

    /// Append context features
    #[arg(long, global = true, value_name = "BOOL")]
    pub context: Option<bool>,

    /// SVM regularization parameter
    #[arg(long = "svm-c", global = true)]
    pub svm_c: Option<f64>,

    /// Random seed for fold shuffling and SMO
    #[arg(long, global = true)]
    pub seed: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, mut config: ExperimentConfig) -> ExperimentConfig {
        if let Some(path) = &self.dataset {
            config.dataset_path = path.clone();
        }
        if let Some(path) = &self.embeddings {
            config.embedding_path = Some(path.clone());
        }
        if let Some(path) = &self.audio_features {
            config.audio_features_path = Some(path.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(name) = &self.model_name {
            config.model_name = name.clone();
        }
        if let Some(runs) = self.runs {
            config.runs = runs;
        }
        if let Some(folds) = self.folds {
            config.n_folds = folds;
        }
        if let Some(n) = self.num_classes {
            config.num_classes = n;
        }
        if let Some(text) = self.text {
            config.use_target_text = text;
        }
        if let Some(audio) = self.audio {
            config.use_target_audio = audio;
        }
        if let Some(author) = self.author {
            config.use_author = author;
        }
        if let Some(context) = self.context {
            config.use_context = context;
        }
        if let Some(c) = self.svm_c {
            config.svm.c = c;
        }
        if let Some(seed) = self.seed {
            config = config.with_random_state(seed);
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every fold once and save the results
    Train,

    /// Print the F1 summary of saved results
    Report {
        /// Model name to report on (defaults to the configured one)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show dataset information
    Info,
}

// ─── Configuration ─────────────────────────────────────────────────────────────

/// Resolve the experiment configuration from the config file and flags
pub fn load_config(cli: &Cli) -> anyhow::Result<ExperimentConfig> {
    let base = match &cli.config {
        Some(path) => ExperimentConfig::from_file(path)?,
        None => ExperimentConfig::default(),
    };
    Ok(cli.overrides.apply(base))
}

fn print_config(config: &ExperimentConfig) {
    let modality = config
        .modality()
        .map(|m| format!("{:?}", m))
        .unwrap_or_else(|_| "none".to_string());

    println!("  {}", kv("Model", &config.model_name));
    println!("  {}", kv("Dataset", &config.dataset_path.display().to_string()));
    println!("  {}", kv("Folds", &config.n_folds.to_string()));
    println!("  {}", kv("Modality", &modality));
    println!("  {}", kv("Author", &config.use_author.to_string()));
    println!("  {}", kv("Context", &config.use_context.to_string()));
    println!("  {}", kv("C", &config.svm.c.to_string()));
    println!();
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Default command: `runs` repetitions of train and report
pub fn cmd_run(config: ExperimentConfig) -> anyhow::Result<()> {
    section("Experiment");
    print_config(&config);

    let runs = config.runs;
    let experiment = Experiment::new(config);
    let start = Instant::now();
    experiment.run(&mut std::io::stdout().lock())?;

    println!();
    step_ok(&format!("{} run(s) in {:.2?}", runs, start.elapsed()));
    println!();
    Ok(())
}

pub fn cmd_train(config: ExperimentConfig) -> anyhow::Result<()> {
    section("Train");
    print_config(&config);

    let experiment = Experiment::new(config);
    step_run("Cross-validating");
    let start = Instant::now();
    let results = experiment.train()?;
    step_done(&format!("{} folds in {:.2?}", results.len(), start.elapsed()));

    let path = experiment.store().path(&experiment.config().model_name);
    step_ok(&format!("Saved → {}", path.display()));
    println!();
    Ok(())
}

pub fn cmd_report(config: ExperimentConfig, model: Option<&str>) -> anyhow::Result<()> {
    section("Report");

    let model_name = model.unwrap_or(config.model_name.as_str()).to_string();
    let experiment = Experiment::new(config);
    experiment.print_results(&model_name, &mut std::io::stdout().lock())?;

    println!();
    Ok(())
}

pub fn cmd_info(config: ExperimentConfig) -> anyhow::Result<()> {
    section("Dataset Info");

    let mut loader = DataLoader::from_json_file(&config.dataset_path)?;
    if let Some(path) = &config.audio_features_path {
        loader = loader.with_audio_features(path)?;
    }

    let mut classes: BTreeMap<usize, usize> = BTreeMap::new();
    for label in loader.labels() {
        *classes.entry(label).or_insert(0) += 1;
    }
    let speakers: std::collections::BTreeSet<&str> =
        loader.utterances().iter().map(|u| u.speaker.as_str()).collect();
    let with_audio = loader.utterances().iter().filter(|u| u.audio.is_some()).count();
    let with_context = loader.utterances().iter().filter(|u| !u.context.is_empty()).count();

    println!("  {}", kv("File", &config.dataset_path.display().to_string()));
    println!("  {}", kv("Utterances", &loader.len().to_string()));
    println!("  {}", kv("Speakers", &speakers.len().to_string()));
    println!("  {}", kv("With audio", &with_audio.to_string()));
    println!("  {}", kv("With context", &with_context.to_string()));
    println!();

    println!("  {:<10} {:>8}", muted("Label"), muted("Count"));
    println!("  {}", dim(&"─".repeat(20)));
    for (label, count) in &classes {
        println!("  {:<10} {:>8}", label, count);
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_command() {
        let cli = Cli::try_parse_from(["multimodal-svm"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_report_with_overrides() {
        let cli = Cli::try_parse_from([
            "multimodal-svm",
            "report",
            "--model",
            "SVM_bimodal",
            "--output-dir",
            "/tmp/results",
        ])
        .unwrap();

        match &cli.command {
            Some(Commands::Report { model }) => assert_eq!(model.as_deref(), Some("SVM_bimodal")),
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.overrides.output_dir, Some(PathBuf::from("/tmp/results")));
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "multimodal-svm",
            "--audio",
            "true",
            "--text",
            "false",
            "--author",
            "true",
            "--folds",
            "3",
            "--seed",
            "7",
            "train",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert!(!config.use_target_text);
        assert!(config.use_target_audio);
        assert!(config.use_author);
        assert_eq!(config.n_folds, 3);
        assert_eq!(config.random_state, Some(7));
        assert_eq!(config.svm.random_state, Some(7));
    }
}
