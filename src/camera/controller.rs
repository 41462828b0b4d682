use crate::{
    core::{config::CameraTimingConfig, viewport::Viewport},
    runtime::{self, AsyncHandle},
    traits::NativeMapAdapter,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A camera move waiting in the queue. Immutable once enqueued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRequest {
    pub viewport: Viewport,
    pub animated: bool,
}

impl MoveRequest {
    pub fn new(viewport: Viewport, animated: bool) -> Self {
        Self { viewport, animated }
    }
}

/// Phase of the camera drain loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    #[default]
    Idle,
    /// Requests are queued and a drain is running
    MoveRequested,
    /// A move was handed to the adapter and is settling
    Applying,
}

struct ControllerState {
    queue: VecDeque<MoveRequest>,
    phase: CameraState,
    drain: Option<Box<dyn AsyncHandle>>,
    /// Bumped on detach; a drain from an older generation stops at its next check
    generation: u64,
    attached: bool,
    applied: usize,
}

struct ControllerInner {
    adapter: Arc<dyn NativeMapAdapter>,
    timing: CameraTimingConfig,
    state: Mutex<ControllerState>,
}

/// Serializes camera moves against the native camera.
///
/// Requests drain in FIFO order through a single task. After each move the
/// drain waits out a settle delay before handing the next one to the adapter,
/// so two moves are never in flight at once.
#[derive(Clone)]
pub struct ViewportController {
    inner: Arc<ControllerInner>,
}

impl ViewportController {
    pub fn new(adapter: Arc<dyn NativeMapAdapter>, timing: CameraTimingConfig) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                adapter,
                timing,
                state: Mutex::new(ControllerState {
                    queue: VecDeque::new(),
                    phase: CameraState::Idle,
                    drain: None,
                    generation: 0,
                    attached: false,
                    applied: 0,
                }),
            }),
        }
    }

    /// Queues a move and starts draining if the controller is idle.
    ///
    /// Returns false if the controller is detached; the request is dropped.
    pub fn enqueue(&self, request: MoveRequest) -> bool {
        let Ok(mut state) = self.inner.state.lock() else {
            return false;
        };
        if !state.attached {
            log::debug!("Camera detached; dropping move to {:?}", request.viewport.center());
            return false;
        }

        state.queue.push_back(request);
        if state.phase == CameraState::Idle {
            state.phase = CameraState::MoveRequested;
            let generation = state.generation;
            let controller = self.clone();
            state.drain = Some(runtime::spawn(async move {
                controller.drain(generation).await;
            }));
        }
        true
    }

    async fn drain(&self, generation: u64) {
        loop {
            let request = {
                let Ok(mut state) = self.inner.state.lock() else {
                    return;
                };
                if state.generation != generation {
                    return;
                }
                match state.queue.pop_front() {
                    Some(request) => {
                        state.phase = CameraState::Applying;
                        request
                    }
                    None => {
                        state.phase = CameraState::Idle;
                        state.drain = None;
                        return;
                    }
                }
            };

            if request.viewport.has_unknown_center() {
                log::debug!("Discarding camera move with unknown center");
                continue;
            }

            match self
                .inner
                .adapter
                .move_camera(&request.viewport, request.animated)
            {
                Ok(()) => {
                    if let Ok(mut state) = self.inner.state.lock() {
                        state.applied += 1;
                    }
                }
                Err(e) => log::warn!("Camera move rejected, dropping it: {}", e),
            }

            runtime::async_delay(self.inner.timing.settle_delay(request.animated)).await;

            if let Ok(mut state) = self.inner.state.lock() {
                if state.generation != generation {
                    return;
                }
                state.phase = CameraState::MoveRequested;
            }
        }
    }

    pub fn attach(&self) {
        if let Ok(mut state) = self.inner.state.lock() {
            state.attached = true;
        }
    }

    /// Drops every queued move and stops the drain without further adapter calls
    pub fn detach(&self) {
        let Ok(mut state) = self.inner.state.lock() else {
            return;
        };
        let dropped = state.queue.len();
        state.queue.clear();
        state.generation += 1;
        state.attached = false;
        state.phase = CameraState::Idle;
        if let Some(drain) = state.drain.take() {
            drain.cancel();
        }
        if dropped > 0 {
            log::debug!("Camera detached; dropped {} queued moves", dropped);
        }
    }

    pub fn state(&self) -> CameraState {
        self.inner
            .state
            .lock()
            .map(|state| state.phase)
            .unwrap_or_default()
    }

    pub fn queued(&self) -> usize {
        self.inner
            .state
            .lock()
            .map(|state| state.queue.len())
            .unwrap_or(0)
    }

    /// Moves handed to the adapter successfully since creation
    pub fn applied(&self) -> usize {
        self.inner
            .state
            .lock()
            .map(|state| state.applied)
            .unwrap_or(0)
    }

    pub fn is_attached(&self) -> bool {
        self.inner
            .state
            .lock()
            .map(|state| state.attached)
            .unwrap_or(false)
    }

    pub fn timing(&self) -> &CameraTimingConfig {
        &self.inner.timing
    }
}
