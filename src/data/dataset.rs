//! Utterance dataset loading and fold splitting

use crate::error::{ExperimentError, Result};
use crate::training::{CVSplit, StratifiedKFold};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One labelled utterance with its optional context and audio frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub id: String,
    #[serde(alias = "text")]
    pub utterance: String,
    #[serde(default)]
    pub speaker: String,
    /// Preceding dialogue turns
    #[serde(default)]
    pub context: Vec<String>,
    pub label: usize,
    /// Frame-level audio features (`frames × dim`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Vec<Vec<f64>>>,
}

/// Inputs and class indices for one side of a fold
#[derive(Debug, Clone, Default)]
pub struct DataSplit {
    pub inputs: Vec<Utterance>,
    pub labels: Vec<usize>,
}

impl DataSplit {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Loads the dataset and hands out stratified folds and index-based splits
#[derive(Debug, Clone)]
pub struct DataLoader {
    utterances: Vec<Utterance>,
}

impl DataLoader {
    pub fn new(utterances: Vec<Utterance>) -> Self {
        Self { utterances }
    }

    /// Load a JSON array of utterance records
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let utterances: Vec<Utterance> = serde_json::from_reader(BufReader::new(file))?;

        if utterances.is_empty() {
            return Err(ExperimentError::DataError(format!(
                "dataset {} contains no utterances",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), utterances = utterances.len(), "Loaded dataset");
        Ok(Self::new(utterances))
    }

    /// Merge audio frames from a JSON object keyed by utterance id.
    /// Utterances absent from the file keep whatever audio they already had.
    pub fn with_audio_features(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut features: HashMap<String, Vec<Vec<f64>>> =
            serde_json::from_reader(BufReader::new(file))?;

        let mut merged = 0;
        for utt in &mut self.utterances {
            if let Some(frames) = features.remove(&utt.id) {
                utt.audio = Some(frames);
                merged += 1;
            }
        }

        tracing::info!(path = %path.display(), merged, unused = features.len(), "Merged audio features");
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    pub fn labels(&self) -> Vec<usize> {
        self.utterances.iter().map(|u| u.label).collect()
    }

    /// Stratified k-fold (train, test) index pairs over the whole dataset
    pub fn stratified_k_fold(
        &self,
        n_splits: usize,
        shuffle: bool,
        random_state: Option<u64>,
    ) -> Result<Vec<CVSplit>> {
        let mut cv = StratifiedKFold::new(n_splits).with_shuffle(shuffle);
        if let Some(seed) = random_state {
            cv = cv.with_random_state(seed);
        }
        cv.split(&self.labels())
    }

    /// Select rows by index
    pub fn get_split(&self, indices: &[usize]) -> Result<DataSplit> {
        let mut split = DataSplit {
            inputs: Vec::with_capacity(indices.len()),
            labels: Vec::with_capacity(indices.len()),
        };

        for &idx in indices {
            let utt = self.utterances.get(idx).ok_or_else(|| {
                ExperimentError::InvalidInput(format!(
                    "index {} out of range for dataset of {} utterances",
                    idx,
                    self.utterances.len()
                ))
            })?;
            split.labels.push(utt.label);
            split.inputs.push(utt.clone());
        }

        Ok(split)
    }
}
