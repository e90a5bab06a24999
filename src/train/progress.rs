use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::train::predictor::Predictor;

/// Emitted once per epoch by the gradient backend and once in total by the
/// classical backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 1-based epoch number.
    pub epoch: usize,
    pub epochs_total: usize,
    /// Mean training loss for the epoch (0 for one-shot fits).
    pub loss: f64,
    /// Held-out score after the epoch.
    pub score: f64,
}

impl ProgressEvent {
    pub fn is_final(&self) -> bool {
        self.epoch >= self.epochs_total
    }

    /// The stdout progress line.
    pub fn line(&self) -> String {
        format!(
            "epoch {}/{}  loss={:.6}  score={:.6}",
            self.epoch, self.epochs_total, self.loss, self.score
        )
    }
}

/// Receives every progress event together with the model as it stands.
pub trait ProgressSink {
    fn on_epoch(&mut self, event: &ProgressEvent, model: &dyn Predictor) -> Result<()>;
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressEvent, &dyn Predictor) -> Result<()>,
{
    fn on_epoch(&mut self, event: &ProgressEvent, model: &dyn Predictor) -> Result<()> {
        self(event, model)
    }
}

/// Sink that ignores every event.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_epoch(&mut self, _event: &ProgressEvent, _model: &dyn Predictor) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_format() {
        let e = ProgressEvent { epoch: 3, epochs_total: 10, loss: 0.5, score: 0.25 };
        assert_eq!(e.line(), "epoch 3/10  loss=0.500000  score=0.250000");
        assert!(!e.is_final());
    }
}
