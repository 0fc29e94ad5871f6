use std::path::Path;

use approx::assert_relative_eq;
use image::{Rgb, RgbImage};

use fishnet::data::split::stratified_split;
use fishnet::{
    train_classifier, Catalog, CatalogRecord, Classifier, DatasetBuilder, ImageSize, NeuralNetwork,
    StopReason, TrainOptions, TrainingSettings,
};

const SIZE: ImageSize = ImageSize { width: 8, height: 8 };

fn record(file: &str, class: &str) -> CatalogRecord {
    CatalogRecord {
        file_name: file.into(),
        class_name: class.into(),
        kernels_applied: vec![],
        color_filter: None,
    }
}

/// Angels are warm, trouts are cold; each image gets its own stripe pattern.
fn write_fish(dir: &Path, name: &str, warm: bool, variant: u32) {
    let image = RgbImage::from_fn(16, 12, |x, y| {
        let stripe = ((x + variant * 3) % 4 * 12 + y) as u8;
        if warm {
            Rgb([210 + stripe % 40, 70 + stripe, 30])
        } else {
            Rgb([25, 60 + stripe, 190 + stripe % 60])
        }
    });
    image.save(dir.join(name)).unwrap();
}

/// Two classes, three images each.
fn two_class_catalog(dir: &Path) -> Catalog {
    let mut records = Vec::new();
    for i in 0..3u32 {
        let angel = format!("angel_{}.png", i);
        let trout = format!("trout_{}.png", i);
        write_fish(dir, &angel, true, i);
        write_fish(dir, &trout, false, i);
        records.push(record(&angel, "Angel"));
        records.push(record(&trout, "Trout"));
    }
    Catalog::new(dir, records)
}

fn settings() -> TrainingSettings {
    TrainingSettings {
        hidden_size: 16,
        image_size: SIZE,
        init_seed: Some(7),
        desired_error: 0.01,
        max_epochs: Some(500),
        ..Default::default()
    }
}

#[test]
fn augmented_dataset_has_eight_examples_per_image() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = two_class_catalog(dir.path());

    let dataset = DatasetBuilder::new(SIZE, true).build(&catalog).unwrap();
    assert_eq!(dataset.len(), 48);
    assert_eq!(dataset.features.cols, SIZE.feature_len());
    assert_eq!(dataset.vocabulary.names(), &["Angel", "Trout"]);
    assert_eq!(dataset.labels.iter().filter(|&&l| l == 0).count(), 24);

    let split = stratified_split(&dataset.features, &dataset.labels, 0.2, 42).unwrap();
    assert_eq!(split.val_labels.len(), 10);
    assert!(split.val_labels.contains(&0));
    assert!(split.val_labels.contains(&1));
    assert_eq!(split.train_labels.len() + split.val_labels.len(), 48);
}

#[test]
fn trained_model_round_trips_through_its_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = two_class_catalog(dir.path());
    let model_path = dir.path().join("models").join("fish.json");

    let options = TrainOptions { checkpoint_path: Some(model_path.clone()), ..Default::default() };
    let trained = train_classifier(&catalog, &settings(), options).unwrap();

    assert!(matches!(
        trained.outcome.stop_reason,
        StopReason::ReachedDesiredError | StopReason::EpochLimit
    ));
    assert_eq!(trained.examples, 48);
    assert_eq!(trained.outcome.best_validation_accuracy, 1.0);
    assert_eq!(trained.validation_report.accuracy, 1.0);
    assert!(!model_path.with_file_name("fish.json.tmp").exists());

    let loaded = NeuralNetwork::load(&model_path).unwrap();
    assert_eq!(&loaded, trained.network());

    let classifier = Classifier::load(&model_path).unwrap();
    for r in &catalog.records {
        let fresh = classifier.classify_path(catalog.resolve(r)).unwrap();
        let in_memory = Classifier::from_network(trained.network().clone())
            .unwrap()
            .classify_path(catalog.resolve(r))
            .unwrap();
        assert_eq!(fresh.class_index, in_memory.class_index);
        assert_relative_eq!(fresh.confidence, in_memory.confidence, max_relative = 1e-12);
        assert_eq!(fresh.class_name, r.class_name);
    }
}

#[test]
fn evaluate_scores_the_unaugmented_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = two_class_catalog(dir.path());
    let model_path = dir.path().join("fish.json");

    let options = TrainOptions { checkpoint_path: Some(model_path.clone()), ..Default::default() };
    train_classifier(&catalog, &settings(), options).unwrap();

    let report = Classifier::load(&model_path).unwrap().evaluate(&catalog).unwrap();
    assert_eq!(report.classes.len(), 2);
    assert_eq!(report.classes[0].support, 3);
    assert_eq!(report.classes[1].support, 3);
    assert_relative_eq!(report.accuracy, 1.0);
    assert_eq!(report.confusion, vec![vec![3, 0], vec![0, 3]]);
}

#[test]
fn catalog_file_with_tagging_tool_keys_trains() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = Vec::new();
    for i in 0..3u32 {
        write_fish(dir.path(), &format!("a{}.png", i), true, i);
        write_fish(dir.path(), &format!("t{}.png", i), false, i);
        entries.push(format!(r#"{{"name": "a{}.png", "tipo_pez": "Angel", "filter": "none", "kernels_applied": []}}"#, i));
        entries.push(format!(r#"{{"name": "t{}.png", "tipo_pez": "Trout"}}"#, i));
    }
    let catalog_path = dir.path().join("catalog.json");
    std::fs::write(&catalog_path, format!("[{}]", entries.join(","))).unwrap();

    let catalog = Catalog::load_json(&catalog_path).unwrap();
    assert_eq!(catalog.len(), 6);

    let quick = TrainingSettings { augment: false, max_epochs: Some(3), ..settings() };
    let trained = train_classifier(&catalog, &quick, TrainOptions::default()).unwrap();
    assert_eq!(trained.examples, 6);
    assert_eq!(trained.outcome.epochs, trained.outcome.loss_history.len());
    assert_eq!(trained.vocabulary.names(), &["Angel", "Trout"]);
}
