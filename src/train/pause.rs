use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Cooperative pause flag shared between a training run and its controller.
///
/// The gradient backend calls `wait_while_paused` before every minibatch;
/// while paused it blocks with no timeout until `resume` is called.
#[derive(Debug, Clone, Default)]
pub struct PauseToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl PauseToken {
    pub fn new() -> PauseToken {
        PauseToken::default()
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        // a panicked holder cannot leave the bool in a torn state
        self.inner.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn pause(&self) {
        *self.flag() = true;
    }

    pub fn resume(&self) {
        *self.flag() = false;
        self.inner.1.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        *self.flag()
    }

    /// Blocks the calling thread for as long as the token is paused.
    pub fn wait_while_paused(&self) {
        let mut paused = self.flag();
        while *paused {
            paused = self.inner.1.wait(paused).unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn unpaused_token_does_not_block() {
        let token = PauseToken::new();
        token.wait_while_paused();
        assert!(!token.is_paused());
    }

    #[test]
    fn resume_releases_a_waiting_thread() {
        let token = PauseToken::new();
        token.pause();
        let (tx, rx) = mpsc::channel();
        let waiter = token.clone();
        let handle = thread::spawn(move || {
            waiter.wait_while_paused();
            tx.send(()).ok();
        });
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        token.resume();
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        handle.join().unwrap();
    }
}
