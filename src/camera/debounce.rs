use crate::runtime::{self, AsyncHandle};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct PendingTimer {
    token: u64,
    task: Box<dyn AsyncHandle>,
}

#[derive(Default)]
struct DebounceState {
    pending: Option<PendingTimer>,
    next_token: u64,
}

/// Coalesces bursts of events into one delayed action.
///
/// Each `schedule` cancels the previous timer and replaces its token; only
/// the timer whose token is still current when it fires runs its action.
pub struct Debouncer {
    delay: Duration,
    state: Arc<Mutex<DebounceState>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: Arc::new(Mutex::new(DebounceState::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restarts the timer with `action` as the only pending callback
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        state.next_token += 1;
        let token = state.next_token;
        if let Some(previous) = state.pending.take() {
            previous.task.cancel();
        }

        let delay = self.delay;
        let shared = Arc::clone(&self.state);
        // The lock is held while spawning, so the timer cannot observe a stale token
        let task = runtime::spawn(async move {
            runtime::async_delay(delay).await;
            let fire = match shared.lock() {
                Ok(mut state) => match &state.pending {
                    Some(pending) if pending.token == token => {
                        state.pending = None;
                        true
                    }
                    _ => false,
                },
                Err(_) => false,
            };
            if fire {
                action();
            }
        });

        state.pending = Some(PendingTimer { token, task });
    }

    /// Drops the pending timer, if any, without running it
    pub fn cancel(&self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(pending) = state.pending.take() {
                pending.task.cancel();
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.pending.is_some())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
