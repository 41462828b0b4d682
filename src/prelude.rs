//! Prelude module for common mapsync types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapsync::prelude::*;`

pub use crate::core::{
    builder::MapSurfaceBuilder,
    config::{CameraTimingConfig, SyncOptions, SyncProfile},
    geo::{Distance, DistanceUnit, LatLng, LatLngBounds},
    handles::NativeHandle,
    map::MapSurface,
    viewport::Viewport,
};

pub use crate::layers::{
    marker::{Anchor, MarkerOptions, Pin, PinRef},
    reconciler::SyncReport,
    vector::{Color, ElementRef, Geometry, MapElement, ShapeStyle},
};

pub use crate::images::cache::{ImageCache, ImageDescriptor};

pub use crate::input::{
    events::{MapEvent, ViewportOrigin},
    selection::SelectedItem,
};

pub use crate::camera::controller::{CameraState, MoveRequest};

pub use crate::spatial::fit::{fit_viewport, DistanceMode, FitOptions};

pub use crate::traits::{ImageLoader, ImageRef, NativeBacked, NativeImage, NativeMapAdapter};

pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::{Error as MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
