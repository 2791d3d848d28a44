//! Per-fold feature extraction
//!
//! [`DataHelper`] is built once per fold from the train and test splits.
//! Everything it learns (vocabulary, speaker set, audio width) comes from the
//! train split only; the test split is transformed with it.

use super::dataset::{DataSplit, Utterance};
use super::embeddings::{EmbeddingMatrix, WordEmbeddings};
use crate::error::{ExperimentError, Result};
use crate::preprocessing::{mean_pool, one_hot, stack_rows, CategoryEncoder, TextTokenizer, Vocabulary};
use ndarray::{Array1, Array2};

/// Side of a fold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Test => write!(f, "test"),
        }
    }
}

/// Feature blocks available for one fold. Every method returns one row per
/// utterance of the requested split.
pub trait FoldFeatures {
    /// Pooled word embeddings of the target utterance
    fn text_pool(&self, split: Split) -> Result<Array2<f64>>;

    /// Pooled audio frames of the target utterance
    fn audio_pool(&self, split: Split) -> Result<Array2<f64>>;

    /// One-hot speaker identity
    fn author(&self, split: Split) -> Result<Array2<f64>>;

    /// Pooled text of the preceding context turns
    fn context_pool(&self, split: Split) -> Result<Array2<f64>>;

    /// One-hot labels with `n_classes` columns
    fn one_hot_output(&self, split: Split, n_classes: usize) -> Result<Array2<f64>>;
}

/// Feature extraction for one train/test fold
pub struct DataHelper {
    train: DataSplit,
    test: DataSplit,
    vocabulary: Vocabulary,
    embeddings: Option<EmbeddingMatrix>,
    speakers: CategoryEncoder,
}

impl DataHelper {
    /// Fit vocabulary (train utterances and their context) and the speaker
    /// set on the train split. Without `embeddings`, text and context
    /// features are unavailable.
    pub fn new(train: DataSplit, test: DataSplit, embeddings: Option<&WordEmbeddings>) -> Self {
        let documents: Vec<&str> = train
            .inputs
            .iter()
            .flat_map(|u| std::iter::once(u.utterance.as_str()).chain(u.context.iter().map(|c| c.as_str())))
            .collect();

        let mut vocabulary = Vocabulary::new(TextTokenizer::new());
        vocabulary.fit(&documents);

        let embeddings = embeddings.map(|e| e.embedding_matrix(&vocabulary));

        let mut speakers = CategoryEncoder::new();
        speakers.fit(train.inputs.iter().map(|u| u.speaker.as_str()));

        tracing::debug!(
            train = train.len(),
            test = test.len(),
            vocabulary = vocabulary.len(),
            speakers = speakers.n_categories(),
            "Prepared fold features"
        );

        Self {
            train,
            test,
            vocabulary,
            embeddings,
            speakers,
        }
    }

    fn split(&self, split: Split) -> &DataSplit {
        match split {
            Split::Train => &self.train,
            Split::Test => &self.test,
        }
    }

    fn embedding_matrix(&self) -> Result<&EmbeddingMatrix> {
        self.embeddings.as_ref().ok_or_else(|| {
            ExperimentError::ConfigError(
                "text and context features require word embeddings (embedding_path)".to_string()
            )
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Word ids of each target utterance in the split
    pub fn vectorize_utterance(&self, split: Split) -> Vec<Vec<usize>> {
        self.split(split)
            .inputs
            .iter()
            .map(|u| self.vocabulary.vectorize(&u.utterance))
            .collect()
    }

    /// Mean embedding of a word-id sequence
    pub fn pool_text(&self, ids: &[usize]) -> Result<Array1<f64>> {
        Ok(self.embedding_matrix()?.pool(ids))
    }

    /// Audio width, taken from the first train utterance with frames
    fn audio_dim(&self) -> Result<usize> {
        self.train
            .inputs
            .iter()
            .filter_map(|u| u.audio.as_ref())
            .flat_map(|frames| frames.first())
            .map(|frame| frame.len())
            .next()
            .ok_or_else(|| ExperimentError::DataError(
                "audio features enabled but no train utterance has audio frames".to_string()
            ))
    }

    fn pool_audio(utt: &Utterance, dim: usize) -> Result<Array1<f64>> {
        let frames = utt.audio.as_ref().ok_or_else(|| {
            ExperimentError::DataError(format!("utterance {} has no audio features", utt.id))
        })?;
        mean_pool(frames.iter().map(|f| f.as_slice()), dim).map_err(|e| {
            ExperimentError::DataError(format!("utterance {}: {}", utt.id, e))
        })
    }
}

impl FoldFeatures for DataHelper {
    fn text_pool(&self, split: Split) -> Result<Array2<f64>> {
        let matrix = self.embedding_matrix()?;
        let rows: Vec<Array1<f64>> = self
            .vectorize_utterance(split)
            .iter()
            .map(|ids| matrix.pool(ids))
            .collect();
        stack_rows(&rows, matrix.dim())
    }

    fn audio_pool(&self, split: Split) -> Result<Array2<f64>> {
        let dim = self.audio_dim()?;
        let rows = self
            .split(split)
            .inputs
            .iter()
            .map(|u| Self::pool_audio(u, dim))
            .collect::<Result<Vec<_>>>()?;
        stack_rows(&rows, dim)
    }

    fn author(&self, split: Split) -> Result<Array2<f64>> {
        self.speakers
            .transform(self.split(split).inputs.iter().map(|u| u.speaker.as_str()))
    }

    fn context_pool(&self, split: Split) -> Result<Array2<f64>> {
        let matrix = self.embedding_matrix()?;
        let dim = matrix.dim();

        let rows = self
            .split(split)
            .inputs
            .iter()
            .map(|u| {
                let turns: Vec<Vec<f64>> = u
                    .context
                    .iter()
                    .map(|c| matrix.pool(&self.vocabulary.vectorize(c)).to_vec())
                    .collect();
                mean_pool(turns.iter().map(|t| t.as_slice()), dim)
            })
            .collect::<Result<Vec<_>>>()?;
        stack_rows(&rows, dim)
    }

    fn one_hot_output(&self, split: Split, n_classes: usize) -> Result<Array2<f64>> {
        one_hot(&self.split(split).labels, n_classes)
    }
}
