//! Result persistence and F1 summaries

use crate::error::{ExperimentError, Result};
use crate::evaluation::{f1_score, FoldResult, MACRO_AVG_KEY, MICRO_AVG_KEY, WEIGHTED_AVG_KEY};
use crate::training::CVResults;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Stores one JSON array of fold results per model name
#[derive(Debug, Clone)]
pub struct ResultStore {
    output_dir: PathBuf,
}

impl ResultStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `{output_dir}/{model_name}.json`
    pub fn path(&self, model_name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.json", model_name))
    }

    /// Write fold results, creating the output directory if needed.
    /// An existing file for the same model is replaced.
    pub fn save(&self, model_name: &str, results: &[FoldResult]) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self.path(model_name);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, results)?;
        writer.flush()?;

        tracing::info!(path = %path.display(), folds = results.len(), "Saved fold results");
        Ok(path)
    }

    /// Read fold results back; a missing file is an I/O error
    pub fn load(&self, model_name: &str) -> Result<Vec<FoldResult>> {
        let path = self.path(model_name);
        let file = File::open(&path)?;
        let results: Vec<FoldResult> = serde_json::from_reader(BufReader::new(file))?;
        tracing::debug!(path = %path.display(), folds = results.len(), "Loaded fold results");
        Ok(results)
    }
}

/// Micro, macro and weighted F1 of one fold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldFscores {
    pub micro: f64,
    pub macro_: f64,
    pub weighted: f64,
}

impl FoldFscores {
    pub fn from_result(result: &FoldResult, fold: usize) -> Result<Self> {
        Ok(Self {
            micro: f1_score(result, fold, MICRO_AVG_KEY)?,
            macro_: f1_score(result, fold, MACRO_AVG_KEY)?,
            weighted: f1_score(result, fold, WEIGHTED_AVG_KEY)?,
        })
    }
}

/// Per-fold F1 scores and their fold means
#[derive(Debug, Clone)]
pub struct FscoreSummary {
    pub folds: Vec<FoldFscores>,
    pub micro: CVResults,
    pub macro_: CVResults,
    pub weighted: CVResults,
}

impl FscoreSummary {
    pub fn from_results(results: &[FoldResult]) -> Result<Self> {
        if results.is_empty() {
            return Err(ExperimentError::DataError("no fold results to summarize".to_string()));
        }

        let folds = results
            .iter()
            .enumerate()
            .map(|(i, r)| FoldFscores::from_result(r, i + 1))
            .collect::<Result<Vec<_>>>()?;

        let micro = CVResults::from_scores(folds.iter().map(|f| f.micro).collect());
        let macro_ = CVResults::from_scores(folds.iter().map(|f| f.macro_).collect());
        let weighted = CVResults::from_scores(folds.iter().map(|f| f.weighted).collect());

        Ok(Self {
            folds,
            micro,
            macro_,
            weighted,
        })
    }

    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }

    /// One line per fold followed by the average line
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .folds
            .iter()
            .enumerate()
            .map(|(i, f)| format_line(&format!("Fold {}", i + 1), f.micro, f.macro_, f.weighted))
            .collect();
        lines.push(format_line(
            "Avg",
            self.micro.mean_score,
            self.macro_.mean_score,
            self.weighted.mean_score,
        ));
        lines
    }

    /// Print the summary between `#` rules
    pub fn write_to<W: Write>(&self, model_name: &str, out: &mut W) -> Result<()> {
        let rule = "#".repeat(20);
        tracing::info!(model = model_name, folds = self.n_folds(), "Fold F-scores");
        writeln!(out, "{}", rule)?;
        for line in self.lines() {
            writeln!(out, "{}", line)?;
        }
        writeln!(out, "{}", rule)?;
        Ok(())
    }
}

fn format_line(label: &str, micro: f64, macro_: f64, weighted: f64) -> String {
    format!(
        "{}: Micro Fscore: {:.4}  Macro Fscore: {:.4}  Weighted Fscore: {:.4}",
        label, micro, macro_, weighted
    )
}
