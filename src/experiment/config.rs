//! Experiment configuration

use crate::error::{ExperimentError, Result};
use crate::training::SVMConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which target-utterance signal feeds the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    /// Pooled word embeddings only
    Text,
    /// Pooled audio frames only
    Audio,
    /// Text columns followed by audio columns
    Bimodal,
}

impl Modality {
    /// Resolve the modality policy from the two target flags
    pub fn from_flags(use_text: bool, use_audio: bool) -> Result<Self> {
        match (use_text, use_audio) {
            (true, false) => Ok(Modality::Text),
            (false, true) => Ok(Modality::Audio),
            (true, true) => Ok(Modality::Bimodal),
            (false, false) => Err(ExperimentError::InvalidModalities),
        }
    }

    pub fn uses_text(&self) -> bool {
        matches!(self, Modality::Text | Modality::Bimodal)
    }

    pub fn uses_audio(&self) -> bool {
        matches!(self, Modality::Audio | Modality::Bimodal)
    }
}

/// Configuration for a cross-validated SVM experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Name used for the results file (`{output_dir}/{model_name}.json`)
    pub model_name: String,

    /// Number of train + report repetitions
    pub runs: usize,

    /// Number of stratified folds
    pub n_folds: usize,

    /// Number of label classes (one-hot width)
    pub num_classes: usize,

    /// Use pooled text of the target utterance
    pub use_target_text: bool,

    /// Use pooled audio of the target utterance
    pub use_target_audio: bool,

    /// Append one-hot speaker features
    pub use_author: bool,

    /// Append pooled context features
    pub use_context: bool,

    /// Shuffle within each class before dealing folds
    pub shuffle: bool,

    /// Random seed for fold shuffling and SMO pair selection
    pub random_state: Option<u64>,

    /// Directory for results files
    pub output_dir: PathBuf,

    /// JSON array of utterance records
    pub dataset_path: PathBuf,

    /// Optional JSON object of audio frames keyed by utterance id
    pub audio_features_path: Option<PathBuf>,

    /// GloVe-format word vectors, needed for text and context features
    pub embedding_path: Option<PathBuf>,

    /// Classifier hyperparameters
    pub svm: SVMConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            model_name: "SVM".to_string(),
            runs: 1,
            n_folds: 5,
            num_classes: 2,
            use_target_text: true,
            use_target_audio: false,
            use_author: false,
            use_context: false,
            shuffle: true,
            random_state: Some(42),
            output_dir: PathBuf::from("./output"),
            dataset_path: PathBuf::from("./data/dataset.json"),
            audio_features_path: None,
            embedding_path: None,
            svm: SVMConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; absent fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExperimentError::ConfigError(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            ExperimentError::ConfigError(format!("invalid config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn with_num_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = num_classes;
        self
    }

    pub fn with_modalities(mut self, text: bool, audio: bool) -> Self {
        self.use_target_text = text;
        self.use_target_audio = audio;
        self
    }

    pub fn with_author(mut self, enabled: bool) -> Self {
        self.use_author = enabled;
        self
    }

    pub fn with_context(mut self, enabled: bool) -> Self {
        self.use_context = enabled;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self.svm.random_state = Some(seed);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_dataset(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_embeddings(mut self, path: impl Into<PathBuf>) -> Self {
        self.embedding_path = Some(path.into());
        self
    }

    pub fn with_audio_features(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio_features_path = Some(path.into());
        self
    }

    pub fn with_svm(mut self, svm: SVMConfig) -> Self {
        self.svm = svm;
        self
    }

    /// Modality policy selected by the target flags
    pub fn modality(&self) -> Result<Modality> {
        Modality::from_flags(self.use_target_text, self.use_target_audio)
    }

    /// Whether any enabled block needs word embeddings
    pub fn needs_embeddings(&self) -> bool {
        self.use_target_text || self.use_context
    }

    /// Check the configuration before any data is touched
    pub fn validate(&self) -> Result<()> {
        self.modality()?;

        if self.model_name.trim().is_empty() {
            return Err(ExperimentError::ConfigError("model_name must not be empty".to_string()));
        }
        if self.runs == 0 {
            return Err(ExperimentError::ConfigError("runs must be at least 1".to_string()));
        }
        if self.n_folds < 2 {
            return Err(ExperimentError::ConfigError(format!(
                "n_folds must be at least 2, got {}",
                self.n_folds
            )));
        }
        if self.num_classes < 2 {
            return Err(ExperimentError::ConfigError(format!(
                "num_classes must be at least 2, got {}",
                self.num_classes
            )));
        }
        if !(self.svm.c > 0.0) {
            return Err(ExperimentError::ConfigError(format!(
                "svm.c must be positive, got {}",
                self.svm.c
            )));
        }
        if self.needs_embeddings() && self.embedding_path.is_none() {
            return Err(ExperimentError::ConfigError(
                "text and context features require embedding_path".to_string()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_from_flags() {
        assert_eq!(Modality::from_flags(true, false).unwrap(), Modality::Text);
        assert_eq!(Modality::from_flags(false, true).unwrap(), Modality::Audio);
        assert_eq!(Modality::from_flags(true, true).unwrap(), Modality::Bimodal);
        assert!(matches!(
            Modality::from_flags(false, false),
            Err(ExperimentError::InvalidModalities)
        ));
    }

    #[test]
    fn test_defaults() {
        let config = ExperimentConfig::default();
        assert_eq!(config.model_name, "SVM");
        assert_eq!(config.runs, 1);
        assert_eq!(config.svm.c, 10.0);
        assert_eq!(config.output_dir, PathBuf::from("./output"));
    }

    #[test]
    fn test_validate() {
        let config = ExperimentConfig::new().with_embeddings("glove.txt");
        assert!(config.validate().is_ok());

        let no_modality = config.clone().with_modalities(false, false);
        assert!(matches!(no_modality.validate(), Err(ExperimentError::InvalidModalities)));

        let one_fold = config.clone().with_folds(1);
        assert!(matches!(one_fold.validate(), Err(ExperimentError::ConfigError(_))));

        let audio_only = ExperimentConfig::new().with_modalities(false, true);
        assert!(audio_only.validate().is_ok());

        let text_without_embeddings = ExperimentConfig::new();
        assert!(text_without_embeddings.validate().is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"model_name": "SVM_bimodal", "use_target_audio": true, "svm": {"c": 1.0, "kernel": "RBF", "gamma": {"value": 0.1}, "tol": 0.001, "max_iter": 100, "random_state": 3}}"#,
        )
        .unwrap();

        let config = ExperimentConfig::from_file(&path).unwrap();
        assert_eq!(config.model_name, "SVM_bimodal");
        assert!(config.use_target_text);
        assert!(config.use_target_audio);
        assert_eq!(config.n_folds, 5);
        assert_eq!(config.svm.c, 1.0);
        assert_eq!(config.modality().unwrap(), Modality::Bimodal);
    }

    #[test]
    fn test_from_file_missing() {
        let err = ExperimentConfig::from_file("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, ExperimentError::ConfigError(_)));
    }
}
