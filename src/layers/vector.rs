use crate::{
    core::{
        geo::{Distance, LatLng, LatLngBounds},
        handles::{NativeHandle, SurfaceId},
        map::MapSurface,
        registry,
    },
    traits::{sealed::HandleSlot, NativeBacked},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

/// Shared reference to a map element; identity is the allocation
pub type ElementRef = Arc<MapElement>;

/// RGBA color handed to the adapter as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Stroke and fill of a shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub stroke_color: Color,
    /// Stroke width in device-independent pixels
    pub stroke_width: f32,
    /// Ignored for polylines
    pub fill_color: Color,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: Color::BLACK,
            stroke_width: 1.0,
            fill_color: Color::TRANSPARENT,
        }
    }
}

/// Shape of a map element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Polyline(Vec<LatLng>),
    Polygon(Vec<LatLng>),
    Circle { center: LatLng, radius: Distance },
}

impl Geometry {
    /// Bounds of the vertices; circles report their center only
    pub fn bounds(&self) -> Option<LatLngBounds> {
        match self {
            Geometry::Polyline(path) | Geometry::Polygon(path) => {
                LatLngBounds::from_points(path.iter().filter(|p| !p.is_unknown()))
            }
            Geometry::Circle { center, .. } if !center.is_unknown() => {
                Some(LatLngBounds::new(*center, *center))
            }
            Geometry::Circle { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Polyline(_) => "polyline",
            Geometry::Polygon(_) => "polygon",
            Geometry::Circle { .. } => "circle",
        }
    }
}

/// A declarative polyline, polygon or circle.
///
/// Like pins, elements are identified by reference. Geometry and style are
/// mutable in place; call [`MapElement::refresh`] to push changes.
pub struct MapElement {
    geometry: RwLock<Geometry>,
    style: RwLock<ShapeStyle>,
    native_handle: Mutex<Option<NativeHandle>>,
    surface: Mutex<Option<SurfaceId>>,
}

impl MapElement {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: RwLock::new(geometry),
            style: RwLock::new(ShapeStyle::default()),
            native_handle: Mutex::new(None),
            surface: Mutex::new(None),
        }
    }

    pub fn polyline(path: Vec<LatLng>) -> Self {
        Self::new(Geometry::Polyline(path))
    }

    pub fn polygon(ring: Vec<LatLng>) -> Self {
        Self::new(Geometry::Polygon(ring))
    }

    pub fn circle(center: LatLng, radius: Distance) -> Self {
        Self::new(Geometry::Circle { center, radius })
    }

    pub fn with_style(self, style: ShapeStyle) -> Self {
        self.set_style(style);
        self
    }

    pub fn into_ref(self) -> ElementRef {
        Arc::new(self)
    }

    pub fn geometry(&self) -> Geometry {
        match self.geometry.read() {
            Ok(geometry) => geometry.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_geometry(&self, geometry: Geometry) {
        if let Ok(mut slot) = self.geometry.write() {
            *slot = geometry;
        }
    }

    pub fn style(&self) -> ShapeStyle {
        self.style.read().map(|s| *s).unwrap_or_default()
    }

    pub fn set_style(&self, style: ShapeStyle) {
        if let Ok(mut slot) = self.style.write() {
            *slot = style;
        }
    }

    /// The surface this element was last added to, if still alive
    pub fn map(&self) -> Option<MapSurface> {
        let id = (*self.surface.lock().ok()?)?;
        registry::lookup(id)
    }

    pub(crate) fn set_surface(&self, surface: Option<SurfaceId>) {
        if let Ok(mut slot) = self.surface.lock() {
            *slot = surface;
        }
    }

    pub fn refresh(self: &Arc<Self>) -> crate::Result<bool> {
        match self.map() {
            Some(map) => map.refresh_element(self),
            None => Ok(false),
        }
    }
}

impl NativeBacked for MapElement {
    fn native_handle(&self) -> Option<NativeHandle> {
        self.native_handle.lock().ok().and_then(|h| *h)
    }
}

impl HandleSlot for MapElement {
    fn set_native_handle(&self, handle: Option<NativeHandle>) {
        if let Ok(mut slot) = self.native_handle.lock() {
            *slot = handle;
        }
    }
}

impl fmt::Debug for MapElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapElement")
            .field("geometry", &self.geometry())
            .field("style", &self.style())
            .field("native_handle", &self.native_handle())
            .finish()
    }
}
