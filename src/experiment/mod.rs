//! Cross-validated SVM experiment
//!
//! [`Experiment::train`] runs stratified k-fold over the dataset. For every
//! fold it builds a [`DataHelper`] from the train split, assembles the
//! enabled feature blocks, fits an SVM and scores the held-out split. The
//! fold reports are saved as one JSON array under the model name and can be
//! summarized later with [`Experiment::print_results`].

pub mod config;
pub mod results;

pub use config::{ExperimentConfig, Modality};
pub use results::{FoldFscores, FscoreSummary, ResultStore};

use crate::data::{DataHelper, DataLoader, FoldFeatures, Split, WordEmbeddings};
use crate::error::{ExperimentError, Result};
use crate::evaluation::{render_confusion, svm_test, FoldResult};
use crate::preprocessing::concat_columns;
use crate::training::{svm_train, CVSplit};
use ndarray::Array2;
use std::io::Write;

/// Which feature blocks make up a fold's input matrix.
///
/// Columns are laid out as: target modality (text, then audio when
/// bimodal), author, context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSelection {
    pub modality: Modality,
    pub use_author: bool,
    pub use_context: bool,
}

impl FeatureSelection {
    pub fn from_config(config: &ExperimentConfig) -> Result<Self> {
        Ok(Self {
            modality: config.modality()?,
            use_author: config.use_author,
            use_context: config.use_context,
        })
    }

    /// Assemble the input matrix for one side of a fold
    pub fn build<F: FoldFeatures + ?Sized>(&self, features: &F, split: Split) -> Result<Array2<f64>> {
        let mut blocks = Vec::with_capacity(4);

        if self.modality.uses_text() {
            blocks.push(features.text_pool(split)?);
        }
        if self.modality.uses_audio() {
            blocks.push(features.audio_pool(split)?);
        }
        if self.use_author {
            blocks.push(features.author(split)?);
        }
        if self.use_context {
            blocks.push(features.context_pool(split)?);
        }

        concat_columns(&blocks)
    }
}

/// Train and test matrices for one fold
#[derive(Debug, Clone)]
pub struct FoldInputs {
    pub train_x: Array2<f64>,
    pub train_y: Array2<f64>,
    pub test_x: Array2<f64>,
    pub test_y: Array2<f64>,
}

/// Build inputs and one-hot outputs for both sides of a fold
pub fn build_fold_inputs<F: FoldFeatures + ?Sized>(
    features: &F,
    selection: &FeatureSelection,
    num_classes: usize,
) -> Result<FoldInputs> {
    let train_x = selection.build(features, Split::Train)?;
    let test_x = selection.build(features, Split::Test)?;
    let train_y = features.one_hot_output(Split::Train, num_classes)?;
    let test_y = features.one_hot_output(Split::Test, num_classes)?;

    if train_x.nrows() != train_y.nrows() {
        return Err(ExperimentError::row_mismatch("train features", train_y.nrows(), train_x.nrows()));
    }
    if test_x.nrows() != test_y.nrows() {
        return Err(ExperimentError::row_mismatch("test features", test_y.nrows(), test_x.nrows()));
    }

    Ok(FoldInputs {
        train_x,
        train_y,
        test_x,
        test_y,
    })
}

/// Cross-validated SVM experiment over one dataset
#[derive(Debug, Clone)]
pub struct Experiment {
    config: ExperimentConfig,
    store: ResultStore,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Self {
        let store = ResultStore::new(config.output_dir.clone());
        Self { config, store }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Load the configured dataset and embeddings, run every fold and save
    /// the results under the configured model name
    pub fn train(&self) -> Result<Vec<FoldResult>> {
        self.config.validate()?;

        let mut loader = DataLoader::from_json_file(&self.config.dataset_path)?;
        if let Some(audio_path) = &self.config.audio_features_path {
            loader = loader.with_audio_features(audio_path)?;
        }

        let embeddings = match (&self.config.embedding_path, self.config.needs_embeddings()) {
            (Some(path), true) => Some(WordEmbeddings::from_glove_file(path)?),
            _ => None,
        };

        self.train_on(&loader, embeddings.as_ref())
    }

    /// Run every fold over an already loaded dataset and save the results
    pub fn train_on(
        &self,
        loader: &DataLoader,
        embeddings: Option<&WordEmbeddings>,
    ) -> Result<Vec<FoldResult>> {
        let selection = FeatureSelection::from_config(&self.config)?;

        let folds = loader.stratified_k_fold(
            self.config.n_folds,
            self.config.shuffle,
            self.config.random_state,
        )?;

        tracing::info!(
            model = %self.config.model_name,
            folds = folds.len(),
            utterances = loader.len(),
            modality = ?selection.modality,
            author = selection.use_author,
            context = selection.use_context,
            "Starting cross-validation"
        );

        let mut results = Vec::with_capacity(folds.len());
        for fold in &folds {
            results.push(self.train_fold(loader, fold, &selection, embeddings)?);
        }

        self.store.save(&self.config.model_name, &results)?;
        Ok(results)
    }

    fn train_fold(
        &self,
        loader: &DataLoader,
        fold: &CVSplit,
        selection: &FeatureSelection,
        embeddings: Option<&WordEmbeddings>,
    ) -> Result<FoldResult> {
        let fold_no = fold.fold_idx + 1;
        tracing::info!(fold = fold_no, "Present fold");

        let train = loader.get_split(&fold.train_indices)?;
        let test = loader.get_split(&fold.test_indices)?;
        let helper = DataHelper::new(train, test, embeddings);

        let inputs = build_fold_inputs(&helper, selection, self.config.num_classes)?;
        tracing::debug!(
            fold = fold_no,
            train_shape = ?inputs.train_x.dim(),
            test_shape = ?inputs.test_x.dim(),
            "Assembled fold inputs"
        );

        let classifier = svm_train(&inputs.train_x, &inputs.train_y, &self.config.svm)?;
        let evaluation = svm_test(&classifier, &inputs.test_x, &inputs.test_y)?;

        tracing::info!(
            fold = fold_no,
            support_vectors = classifier.n_support_vectors(),
            "Confusion matrix:\n{}",
            render_confusion(&evaluation.confusion)
        );
        tracing::info!(fold = fold_no, "Classification report:\n{}", evaluation.report_text);

        Ok(evaluation.report.to_fold_result())
    }

    /// Summarize saved results for `model_name` and print them to `out`
    pub fn print_results<W: Write>(&self, model_name: &str, out: &mut W) -> Result<FscoreSummary> {
        let results = self.store.load(model_name)?;
        let summary = FscoreSummary::from_results(&results)?;
        summary.write_to(model_name, out)?;
        Ok(summary)
    }

    /// `runs` repetitions of train followed by printing the summary
    pub fn run<W: Write>(&self, out: &mut W) -> Result<()> {
        for run in 1..=self.config.runs {
            tracing::info!(run, runs = self.config.runs, "Starting run");
            self.train()?;
            self.print_results(&self.config.model_name, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Blocks of fixed widths with `rows` rows on both sides
    struct FixedBlocks {
        rows: usize,
        text: usize,
        audio: usize,
        author: usize,
        context: usize,
    }

    impl FixedBlocks {
        fn block(&self, width: usize, fill: f64) -> Result<Array2<f64>> {
            Ok(Array2::from_elem((self.rows, width), fill))
        }
    }

    impl FoldFeatures for FixedBlocks {
        fn text_pool(&self, _split: Split) -> Result<Array2<f64>> {
            self.block(self.text, 1.0)
        }
        fn audio_pool(&self, _split: Split) -> Result<Array2<f64>> {
            self.block(self.audio, 2.0)
        }
        fn author(&self, _split: Split) -> Result<Array2<f64>> {
            self.block(self.author, 3.0)
        }
        fn context_pool(&self, _split: Split) -> Result<Array2<f64>> {
            self.block(self.context, 4.0)
        }
        fn one_hot_output(&self, _split: Split, n_classes: usize) -> Result<Array2<f64>> {
            let labels: Vec<usize> = (0..self.rows).map(|i| i % n_classes).collect();
            crate::preprocessing::one_hot(&labels, n_classes)
        }
    }

    fn blocks() -> FixedBlocks {
        FixedBlocks {
            rows: 4,
            text: 50,
            audio: 20,
            author: 5,
            context: 10,
        }
    }

    #[test]
    fn test_feature_selection_widths() {
        let features = blocks();
        let cases = [
            (Modality::Text, false, false, 50),
            (Modality::Audio, false, false, 20),
            (Modality::Bimodal, false, false, 70),
            (Modality::Text, true, false, 55),
            (Modality::Audio, false, true, 30),
            (Modality::Bimodal, true, true, 85),
        ];

        for (modality, use_author, use_context, width) in cases {
            let selection = FeatureSelection { modality, use_author, use_context };
            let x = selection.build(&features, Split::Train).unwrap();
            assert_eq!(x.dim(), (4, width), "{:?} author={} context={}", modality, use_author, use_context);
        }
    }

    #[test]
    fn test_column_order() {
        let selection = FeatureSelection {
            modality: Modality::Bimodal,
            use_author: true,
            use_context: true,
        };
        let x = selection.build(&blocks(), Split::Test).unwrap();
        let row = x.row(0);
        assert_eq!(row[0], 1.0);
        assert_eq!(row[49], 1.0);
        assert_eq!(row[50], 2.0);
        assert_eq!(row[69], 2.0);
        assert_eq!(row[70], 3.0);
        assert_eq!(row[75], 4.0);
        assert_eq!(row[84], 4.0);
    }

    #[test]
    fn test_build_fold_inputs_rows() {
        let selection = FeatureSelection {
            modality: Modality::Text,
            use_author: true,
            use_context: false,
        };
        let inputs = build_fold_inputs(&blocks(), &selection, 2).unwrap();
        assert_eq!(inputs.train_x.nrows(), inputs.train_y.nrows());
        assert_eq!(inputs.test_x.nrows(), inputs.test_y.nrows());
        assert_eq!(inputs.train_y.ncols(), 2);
    }

    #[test]
    fn test_invalid_modalities_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExperimentConfig::new()
            .with_modalities(false, false)
            .with_output_dir(dir.path().join("out"))
            .with_dataset(dir.path().join("missing.json"));
        let experiment = Experiment::new(config);

        assert!(matches!(experiment.train(), Err(ExperimentError::InvalidModalities)));
        assert!(!dir.path().join("out").exists());
    }
}
