use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use clap::{Parser, Subcommand};
use log::error;

use fishnet::{
    train_classifier, Catalog, Classifier, Error, Result, TrainOptions, TrainingSettings,
};

/// Train and run a fish image classifier.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train a model on a labelled catalog
    Train {
        /// Catalog JSON; file names resolve against its directory
        #[arg(long)]
        catalog: PathBuf,
        /// Where the best model is written during training
        #[arg(long)]
        model: PathBuf,
        /// Training settings JSON; defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop after this many epochs even if the target loss is not reached
        #[arg(long)]
        max_epochs: Option<usize>,
    },
    /// Classify one or more images
    Classify {
        #[arg(long)]
        model: PathBuf,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Score a model against a labelled catalog
    Evaluate {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        catalog: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let result = match args.command {
        Command::Train { catalog, model, config, max_epochs } => train(catalog, model, config, max_epochs),
        Command::Classify { model, images } => classify(model, images),
        Command::Evaluate { model, catalog } => evaluate(model, catalog),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn train(catalog: PathBuf, model: PathBuf, config: Option<PathBuf>, max_epochs: Option<usize>) -> Result<()> {
    let catalog = Catalog::load_json(&catalog)?;
    let mut settings = match config {
        Some(path) => TrainingSettings::load_json(path)?,
        None => TrainingSettings::default(),
    };
    if max_epochs.is_some() {
        settings.max_epochs = max_epochs;
    }

    let (tx, rx) = mpsc::channel();
    let options = TrainOptions {
        checkpoint_path: Some(model.clone()),
        progress_tx: Some(tx),
        stop_flag: None,
    };
    let worker = thread::spawn(move || train_classifier(&catalog, &settings, options));

    // Ends when the worker drops its sender.
    for stats in rx {
        println!(
            "epoch {:>6}  loss {:.6}  val acc {:>7.3}%  {:>8.2}s",
            stats.epoch,
            stats.loss,
            stats.validation_accuracy * 100.0,
            stats.elapsed_secs
        );
    }

    let trained = worker
        .join()
        .map_err(|_| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "training thread panicked")))??;

    println!(
        "stopped after {} epochs ({:?}); {} examples, best validation accuracy {:.3}%",
        trained.outcome.epochs,
        trained.outcome.stop_reason,
        trained.examples,
        trained.outcome.best_validation_accuracy * 100.0
    );
    println!("{}", trained.validation_report);
    println!("model written to {}", model.display());
    Ok(())
}

fn classify(model: PathBuf, images: Vec<PathBuf>) -> Result<()> {
    let classifier = Classifier::load(&model)?;
    for path in images {
        match classifier.classify_path(&path) {
            Ok(p) => println!("{}\t{}\t{:.2}%", path.display(), p.class_name, p.confidence * 100.0),
            Err(e) => error!("{}", e),
        }
    }
    Ok(())
}

fn evaluate(model: PathBuf, catalog: PathBuf) -> Result<()> {
    let classifier = Classifier::load(&model)?;
    let catalog = Catalog::load_json(&catalog)?;
    println!("{}", classifier.evaluate(&catalog)?);
    Ok(())
}
