use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use log::info;
use rand::{rngs::StdRng, SeedableRng};

use crate::config::TrainingSettings;
use crate::data::catalog::Catalog;
use crate::data::dataset::DatasetBuilder;
use crate::data::split::stratified_split;
use crate::data::vocabulary::ClassVocabulary;
use crate::error::Result;
use crate::eval::metrics::{report, ClassificationReport};
use crate::network::metadata::ModelMetadata;
use crate::network::network::NeuralNetwork;
use crate::train::epoch_stats::EpochStats;
use crate::train::loop_fn::{train_loop, TrainingOutcome};
use crate::train::train_config::TrainConfig;

/// Side channels of a training run. All optional.
#[derive(Default)]
pub struct TrainOptions {
    /// Best network so far is written here whenever it improves.
    pub checkpoint_path: Option<PathBuf>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

/// Result of `train_classifier`.
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    /// `outcome.best_network` carries the model metadata.
    pub outcome: TrainingOutcome,
    /// Best network scored on the validation partition.
    pub validation_report: ClassificationReport,
    pub vocabulary: ClassVocabulary,
    /// Examples after augmentation.
    pub examples: usize,
}

impl TrainedClassifier {
    pub fn network(&self) -> &NeuralNetwork {
        &self.outcome.best_network
    }
}

/// Catalog in, trained classifier out: builds the dataset, normalizes it,
/// splits it, initializes a network and runs `train_loop`.
///
/// Settings are validated before any image is read.
pub fn train_classifier(
    catalog: &Catalog,
    settings: &TrainingSettings,
    options: TrainOptions,
) -> Result<TrainedClassifier> {
    settings.validate()?;

    let dataset = DatasetBuilder::new(settings.image_size, settings.augment).build(catalog)?;
    let normalized = dataset.normalized_features()?;
    let split = stratified_split(
        &normalized,
        &dataset.labels,
        settings.validation_fraction,
        settings.split_seed,
    )?;
    info!(
        "split {} examples into {} train / {} validation",
        dataset.len(),
        split.train_labels.len(),
        split.val_labels.len()
    );

    let input_size = settings.image_size.feature_len();
    let output_size = dataset.vocabulary.len();
    let mut network = match settings.init_seed {
        Some(seed) => NeuralNetwork::with_rng(
            input_size,
            settings.hidden_size,
            output_size,
            settings.learning_rate,
            &mut StdRng::seed_from_u64(seed),
        )?,
        None => NeuralNetwork::new(input_size, settings.hidden_size, output_size, settings.learning_rate)?,
    };
    // Set before the loop so every checkpoint is self-describing.
    network.metadata = Some(ModelMetadata {
        description: None,
        image_size: settings.image_size,
        classes: dataset.vocabulary.clone(),
        normalization: dataset.stats.clone(),
    });

    let config = TrainConfig {
        desired_error: settings.desired_error,
        max_epochs: settings.max_epochs,
        report_every: settings.report_every,
        checkpoint_path: options.checkpoint_path,
        progress_tx: options.progress_tx,
        stop_flag: options.stop_flag,
    };
    let outcome = train_loop(&mut network, &split, &config)?;

    let (predicted, _) = outcome.best_network.predict(&split.val_inputs)?;
    let validation_report = report(&split.val_labels, &predicted, &dataset.vocabulary);

    Ok(TrainedClassifier {
        outcome,
        validation_report,
        vocabulary: dataset.vocabulary,
        examples: dataset.labels.len(),
    })
}
