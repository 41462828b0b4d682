//! Camera synchronization: queued moves out, debounced idle events in

pub mod controller;
pub mod debounce;

pub use controller::{CameraState, MoveRequest, ViewportController};
pub use debounce::Debouncer;
