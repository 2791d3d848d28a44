//! Dataset access and per-fold feature extraction

pub mod dataset;
pub mod embeddings;
pub mod helper;

pub use dataset::{DataLoader, DataSplit, Utterance};
pub use embeddings::{EmbeddingMatrix, WordEmbeddings};
pub use helper::{DataHelper, FoldFeatures, Split};
