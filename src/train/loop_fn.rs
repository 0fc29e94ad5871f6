use std::sync::atomic::Ordering;
use std::time::Instant;

use log::{info, warn};

use crate::data::split::TrainValSplit;
use crate::error::{Error, Result};
use crate::eval::metrics::accuracy;
use crate::network::network::NeuralNetwork;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

/// Why `train_loop` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Loss dropped to or below `desired_error`.
    ReachedDesiredError,
    /// `stop_flag` was set.
    Cancelled,
    /// The progress receiver was dropped.
    Disconnected,
    /// `max_epochs` ran out first.
    EpochLimit,
    /// The loss or a parameter became NaN or infinite; further steps cannot
    /// recover. The best network is the last finite one.
    Diverged,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Snapshot taken at the best validation accuracy (latest on ties).
    pub best_network: NeuralNetwork,
    pub best_validation_accuracy: f64,
    pub epochs: usize,
    pub final_loss: f64,
    /// Training loss of every epoch, in order.
    pub loss_history: Vec<f64>,
    pub stop_reason: StopReason,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Runs full-batch gradient descent on `split.train_*` until the loss
/// reaches `config.desired_error`.
///
/// After every step the validation partition is scored; whenever accuracy
/// is at least the best seen so far the network is snapshotted and, with a
/// `checkpoint_path`, written to disk. On cancellation the last written
/// checkpoint remains the valid model.
///
/// With `max_epochs: None` there is no iteration cap: the loss threshold is
/// the only natural exit. Callers that cannot guarantee the threshold is
/// reachable should set a ceiling or hold a `stop_flag`.
pub fn train_loop(
    network: &mut NeuralNetwork,
    split: &TrainValSplit,
    config: &TrainConfig,
) -> Result<TrainingOutcome> {
    config.validate()?;
    if split.train_labels.is_empty() {
        return Err(Error::EmptyDataset("training partition is empty".into()));
    }

    let start = Instant::now();
    let mut best_accuracy = 0.0;
    let mut best_network = network.clone();
    let mut loss_history: Vec<f64> = Vec::new();
    let mut epoch = 0usize;

    let stop_reason = loop {
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }
        }
        if config.max_epochs.map_or(false, |max| epoch >= max) {
            break StopReason::EpochLimit;
        }
        epoch += 1;

        let loss = network.train_step(&split.train_inputs, &split.train_labels)?;
        loss_history.push(loss);

        // The returned loss predates the update, so the parameters are
        // checked as well. A diverged network is never scored or saved.
        let diverged = !loss.is_finite() || !network.is_finite();
        let validation_accuracy = if diverged {
            0.0
        } else {
            validation_accuracy(network, split)?
        };
        if !diverged && validation_accuracy >= best_accuracy {
            best_accuracy = validation_accuracy;
            best_network = network.clone();
            if let Some(ref path) = config.checkpoint_path {
                network.save(path)?;
            }
        }

        let reached = loss <= config.desired_error;
        let last = diverged || reached || config.max_epochs == Some(epoch);

        if epoch == 1 || epoch % config.report_every == 0 || last {
            let stats = EpochStats {
                epoch,
                loss,
                validation_accuracy,
                elapsed_secs: start.elapsed().as_secs_f64(),
            };
            info!(
                "epoch {}, loss {:.6}, validation accuracy {:.3}%, {:.2}s",
                stats.epoch,
                stats.loss,
                stats.validation_accuracy * 100.0,
                stats.elapsed_secs
            );
            if let Some(ref tx) = config.progress_tx {
                // If the receiver has been dropped, stop training.
                if tx.send(stats).is_err() {
                    break StopReason::Disconnected;
                }
            }
        }

        if diverged {
            warn!("training diverged at epoch {} (loss {}), stopping", epoch, loss);
            break StopReason::Diverged;
        }
        if reached {
            break StopReason::ReachedDesiredError;
        }
    };

    info!(
        "training stopped after {} epochs ({:?}), best validation accuracy {:.3}%",
        epoch,
        stop_reason,
        best_accuracy * 100.0
    );

    Ok(TrainingOutcome {
        best_network,
        best_validation_accuracy: best_accuracy,
        epochs: epoch,
        final_loss: loss_history.last().copied().unwrap_or(f64::NAN),
        loss_history,
        stop_reason,
    })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Accuracy on the validation partition; 0 when it is empty.
fn validation_accuracy(network: &NeuralNetwork, split: &TrainValSplit) -> Result<f64> {
    if split.val_labels.is_empty() {
        return Ok(0.0);
    }
    let (predicted, _) = network.predict(&split.val_inputs)?;
    Ok(accuracy(&split.val_labels, &predicted))
}
