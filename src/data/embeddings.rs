//! Pretrained word embeddings (GloVe text format)

use crate::error::{ExperimentError, Result};
use crate::preprocessing::Vocabulary;
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Word → vector lookup with a fixed dimension
#[derive(Debug, Clone, Default)]
pub struct WordEmbeddings {
    vectors: HashMap<String, Vec<f64>>,
    dim: usize,
}

impl WordEmbeddings {
    pub fn new(dim: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dim,
        }
    }

    /// Load `word v1 v2 ... vd` lines; the first line fixes the dimension
    pub fn from_glove_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let embeddings = Self::from_reader(BufReader::new(file))?;
        tracing::info!(
            path = %path.display(),
            words = embeddings.len(),
            dim = embeddings.dim(),
            "Loaded word embeddings"
        );
        Ok(embeddings)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut embeddings = Self::new(0);

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };

            let values: std::result::Result<Vec<f64>, _> = parts.map(str::parse::<f64>).collect();
            let values = values.map_err(|e| {
                ExperimentError::DataError(format!("embeddings line {}: {}", line_no + 1, e))
            })?;

            if embeddings.dim == 0 {
                embeddings.dim = values.len();
            }
            embeddings.insert(word, values).map_err(|_| {
                ExperimentError::DataError(format!(
                    "embeddings line {}: expected {} values",
                    line_no + 1,
                    embeddings.dim
                ))
            })?;
        }

        if embeddings.dim == 0 {
            return Err(ExperimentError::DataError("embeddings file is empty".to_string()));
        }
        Ok(embeddings)
    }

    pub fn insert(&mut self, word: &str, vector: Vec<f64>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(ExperimentError::ShapeError {
                expected: format!("embedding of length {}", self.dim),
                actual: format!("embedding of length {}", vector.len()),
            });
        }
        self.vectors.insert(word.to_string(), vector);
        Ok(())
    }

    pub fn get(&self, word: &str) -> Option<&[f64]> {
        self.vectors.get(word).map(|v| v.as_slice())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Matrix with one row per vocabulary id. Ids without a pretrained
    /// vector (including the unknown slot) get a zero row and are marked
    /// as not known.
    pub fn embedding_matrix(&self, vocabulary: &Vocabulary) -> EmbeddingMatrix {
        let mut matrix = Array2::zeros((vocabulary.len(), self.dim));
        let mut known = vec![false; vocabulary.len()];

        for (id, word) in vocabulary.words().iter().enumerate() {
            if id == Vocabulary::UNKNOWN_ID {
                continue;
            }
            if let Some(vector) = self.get(word) {
                matrix.row_mut(id).assign(&Array1::from(vector.to_vec()));
                known[id] = true;
            }
        }

        tracing::debug!(
            vocabulary = vocabulary.len(),
            covered = known.iter().filter(|k| **k).count(),
            "Built embedding matrix"
        );
        EmbeddingMatrix { matrix, known }
    }
}

/// Vocabulary-aligned embedding rows
#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
    pub matrix: Array2<f64>,
    pub known: Vec<bool>,
}

impl EmbeddingMatrix {
    pub fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    /// Mean of the embedding rows of known ids; zeros when none are known
    pub fn pool(&self, ids: &[usize]) -> Array1<f64> {
        let mut sum = Array1::zeros(self.dim());
        let mut count = 0usize;
        for &id in ids {
            if self.known.get(id).copied().unwrap_or(false) {
                sum += &self.matrix.row(id);
                count += 1;
            }
        }
        if count > 0 {
            sum /= count as f64;
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::TextTokenizer;
    use std::io::Cursor;

    const GLOVE: &str = "great 1.0 0.0\nidea 0.0 1.0\n\nbad -1.0 0.5\n";

    #[test]
    fn test_from_reader() {
        let emb = WordEmbeddings::from_reader(Cursor::new(GLOVE)).unwrap();
        assert_eq!(emb.dim(), 2);
        assert_eq!(emb.len(), 3);
        assert_eq!(emb.get("bad"), Some(&[-1.0, 0.5][..]));
    }

    #[test]
    fn test_from_reader_ragged_line() {
        let err = WordEmbeddings::from_reader(Cursor::new("a 1 2\nb 1\n")).unwrap_err();
        assert!(matches!(err, ExperimentError::DataError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = WordEmbeddings::from_glove_file("/nonexistent/glove.txt").unwrap_err();
        assert!(matches!(err, ExperimentError::IoError(_)));
    }

    #[test]
    fn test_from_reader_empty() {
        assert!(WordEmbeddings::from_reader(Cursor::new("")).is_err());
    }

    #[test]
    fn test_embedding_matrix_and_pool() {
        let emb = WordEmbeddings::from_reader(Cursor::new(GLOVE)).unwrap();
        let mut vocab = Vocabulary::new(TextTokenizer::new());
        vocab.fit(&["great idea", "great mystery"]);

        let em = emb.embedding_matrix(&vocab);
        assert_eq!(em.matrix.nrows(), vocab.len());
        assert!(!em.known[Vocabulary::UNKNOWN_ID]);

        let ids = vocab.vectorize("great idea mystery nonsense");
        let pooled = em.pool(&ids);
        // mystery has no vector, nonsense is out of vocabulary
        assert_eq!(pooled.to_vec(), vec![0.5, 0.5]);

        assert_eq!(em.pool(&[]).to_vec(), vec![0.0, 0.0]);
    }
}
