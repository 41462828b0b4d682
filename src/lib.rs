//! # mapsync
//!
//! Keeps a declarative map model (pins, shapes, viewport) in sync with an
//! imperative, platform-native map widget.
//!
//! The crate covers the synchronization core only: viewport fitting over
//! point sets, incremental reconciliation of pins and shapes against native
//! handles, and a serialized, debounced camera pipeline that never feeds
//! native camera events back into new camera moves. Each platform plugs in
//! through [`traits::NativeMapAdapter`] and [`traits::ImageLoader`].

pub mod camera;
pub mod core;
pub mod images;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod spatial;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    builder::MapSurfaceBuilder,
    config::{CameraTimingConfig, SyncOptions, SyncProfile},
    geo::{Distance, DistanceUnit, LatLng, LatLngBounds},
    handles::{NativeHandle, SurfaceId},
    map::{MapState, MapSurface},
    viewport::Viewport,
};

pub use camera::{CameraState, MoveRequest, ViewportController};

pub use images::{ImageCache, ImageDescriptor};

pub use input::{MapEvent, SelectedItem, ViewportOrigin};

pub use layers::{
    marker::{Pin, PinRef},
    reconciler::SyncReport,
    vector::{ElementRef, Geometry, MapElement, ShapeStyle},
};

pub use spatial::fit::{fit_viewport, DistanceMode, FitOptions};

pub use traits::{ImageLoader, ImageRef, NativeImage, NativeMapAdapter};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Image load error: {0}")]
    ImageLoad(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Map surface is detached")]
    Detached,

    #[error("No item template set; call set_items first")]
    MissingTemplate,
}

/// Error type alias for convenience
pub type Error = MapError;
