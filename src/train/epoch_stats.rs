use serde::{Serialize, Deserialize};

/// Progress event emitted by `train_loop`.
///
/// Sent on epoch 1, every `report_every` epochs and on the final epoch, when
/// a `progress_tx` channel is configured in `TrainConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Training loss of this epoch's step.
    pub loss: f64,
    /// Validation accuracy after this epoch's update, in [0, 1].
    pub validation_accuracy: f64,
    /// Wall-clock seconds since the loop started.
    pub elapsed_secs: f64,
}
