//! Process-wide lookup table from [`SurfaceId`] to live surfaces.
//!
//! Pins and elements only remember the id of the surface that shows them.
//! The table holds weak references, so it never keeps a surface alive.

use crate::{
    core::{
        handles::SurfaceId,
        map::{MapSurface, SurfaceInner},
    },
    prelude::HashMap,
};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, Weak};

static SURFACES: Lazy<Mutex<HashMap<SurfaceId, Weak<SurfaceInner>>>> =
    Lazy::new(|| Mutex::new(HashMap::default()));

pub(crate) fn register(id: SurfaceId, surface: &Arc<SurfaceInner>) {
    if let Ok(mut surfaces) = SURFACES.lock() {
        surfaces.retain(|_, weak| weak.strong_count() > 0);
        surfaces.insert(id, Arc::downgrade(surface));
    }
}

pub(crate) fn unregister(id: SurfaceId) {
    if let Ok(mut surfaces) = SURFACES.lock() {
        surfaces.remove(&id);
    }
}

/// The surface with this id, if it still exists
pub fn lookup(id: SurfaceId) -> Option<MapSurface> {
    let weak = SURFACES.lock().ok()?.get(&id)?.clone();
    weak.upgrade().map(MapSurface::from_inner)
}
