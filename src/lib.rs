//! Multimodal SVM - cross-validated utterance classification
//!
//! This crate runs stratified k-fold experiments that classify dialogue
//! utterances with a kernel SVM over pooled text and audio features:
//! - Dataset loading, fold splitting and per-fold feature extraction
//! - Word-embedding and audio-frame mean pooling, speaker and context blocks
//! - SMO-trained SVM with one-vs-rest multiclass support
//! - Classification reports, JSON result persistence and F1 summaries
//!
//! # Modules
//!
//! - [`data`] - Utterance datasets, embeddings and fold feature helpers
//! - [`preprocessing`] - Tokenization, vocabularies, encoders and pooling
//! - [`training`] - Kernel SVM and cross-validation splitters
//! - [`evaluation`] - Classification report and confusion matrix
//! - [`experiment`] - Configuration, fold orchestration and result storage
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data and features
pub mod data;
pub mod preprocessing;

// Model fitting and scoring
pub mod training;
pub mod evaluation;

// Experiment driver
pub mod experiment;

// Interface
pub mod cli;

pub use error::{ExperimentError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::data::{DataHelper, DataLoader, DataSplit, FoldFeatures, Split, Utterance, WordEmbeddings};
    pub use crate::error::{ExperimentError, Result};
    pub use crate::evaluation::{svm_test, ClassificationReport, Evaluation, FoldResult};
    pub use crate::experiment::{
        build_fold_inputs, Experiment, ExperimentConfig, FeatureSelection, FscoreSummary, Modality,
        ResultStore,
    };
    pub use crate::training::{svm_train, Gamma, KernelType, SVMClassifier, SVMConfig};
}
