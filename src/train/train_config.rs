use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::error::{Error, Result};
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `desired_error`  : stop once the training loss is at or below this
/// - `max_epochs`     : optional safety ceiling. `None` means the loop runs
///                       until `desired_error` is reached or it is cancelled;
///                       an unreachable target then never terminates.
/// - `report_every`   : progress cadence in epochs
/// - `checkpoint_path`: where the best network is written, if anywhere
/// - `progress_tx`    : optional channel sender for `EpochStats`. If the
///                       receiver is dropped the loop terminates early.
/// - `stop_flag`      : optional atomic flag; when set to `true` from another
///                       thread the loop terminates before the next epoch.
pub struct TrainConfig {
    pub desired_error: f64,
    pub max_epochs: Option<usize>,
    pub report_every: usize,
    pub checkpoint_path: Option<PathBuf>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Minimal config: no ceiling, no checkpoint file, no channel, no stop flag.
    pub fn new(desired_error: f64) -> Self {
        TrainConfig {
            desired_error,
            max_epochs: None,
            report_every: 10,
            checkpoint_path: None,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.desired_error.is_finite() || self.desired_error <= 0.0 {
            return Err(Error::hyperparameter(
                "desired_error",
                format!("must be a positive finite number, got {}", self.desired_error),
            ));
        }
        if self.max_epochs == Some(0) {
            return Err(Error::hyperparameter("max_epochs", "must be at least 1 when set"));
        }
        if self.report_every == 0 {
            return Err(Error::hyperparameter("report_every", "must be at least 1"));
        }
        Ok(())
    }
}
