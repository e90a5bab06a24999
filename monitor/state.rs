use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use serde::Serialize;

use ferrite_fit::{PauseToken, ProgressEvent};

// ---------------------------------------------------------------------------
// Run lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Paused,
    Done,
    Failed,
}

/// What the training thread has reported so far.
#[derive(Debug, Default)]
pub struct Progress {
    pub latest: Option<ProgressEvent>,
    pub history: Vec<ProgressEvent>,
    /// Set once the run finishes.
    pub outcome: Option<Result<String, String>>,
}

/// Body of `GET /status`.
#[derive(Debug, Serialize)]
pub struct Status {
    pub state: RunState,
    pub latest: Option<ProgressEvent>,
    pub history: Vec<ProgressEvent>,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared between the training thread and every request thread. The pause
/// token is the only handle into the running trainer.
pub struct Monitor {
    pub pause: PauseToken,
    pub plot_path: PathBuf,
    started: SystemTime,
    progress: Mutex<Progress>,
}

pub type SharedMonitor = Arc<Monitor>;

impl Monitor {
    pub fn new(plot_path: PathBuf) -> Monitor {
        Monitor { pause: PauseToken::new(), plot_path, started: SystemTime::now(), progress: Mutex::new(Progress::default()) }
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        // A panicking request thread must not take the monitor down with it.
        self.progress.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, event: ProgressEvent) {
        let mut p = self.progress();
        p.latest = Some(event);
        p.history.push(event);
    }

    /// Stores the final report text, or the error that ended the run.
    pub fn finish(&self, outcome: Result<String, String>) {
        self.progress().outcome = Some(outcome);
    }

    pub fn state(&self) -> RunState {
        match &self.progress().outcome {
            Some(Ok(_)) => RunState::Done,
            Some(Err(_)) => RunState::Failed,
            None if self.pause.is_paused() => RunState::Paused,
            None => RunState::Running,
        }
    }

    pub fn status(&self) -> Status {
        let state = self.state();
        let p = self.progress();
        Status {
            state,
            latest: p.latest,
            history: p.history.clone(),
            error: match &p.outcome {
                Some(Err(e)) => Some(e.clone()),
                _ => None,
            },
        }
    }

    /// Report text, once this run has finished successfully.
    pub fn report(&self) -> Option<String> {
        match &self.progress().outcome {
            Some(Ok(text)) => Some(text.clone()),
            _ => None,
        }
    }

    /// Current plot frame. A file left over from an earlier run is ignored
    /// until this run rewrites it.
    pub fn plot(&self) -> Option<Vec<u8>> {
        let modified = fs::metadata(&self.plot_path).and_then(|m| m.modified()).ok()?;
        if modified < self.started {
            return None;
        }
        fs::read(&self.plot_path).ok()
    }
}
