use crate::{
    core::{
        geo::LatLng,
        handles::{NativeHandle, SurfaceId},
        map::MapSurface,
        registry,
    },
    images::cache::ImageDescriptor,
    traits::{sealed::HandleSlot, NativeBacked},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Shared reference to a pin; identity is the allocation, not the contents
pub type PinRef = Arc<Pin>;

/// Builds a pin for one bound item, or `None` to skip the item
pub type PinTemplate = dyn Fn(&serde_json::Value) -> Option<Pin> + Send + Sync;

/// Relative position of the icon hot-spot, `(0.5, 0.5)` being the center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Default for Anchor {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// Snapshot of everything an adapter needs to draw a marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub location: LatLng,
    pub label: String,
    pub address: Option<String>,
    pub anchor: Anchor,
    pub selected: bool,
}

#[derive(Debug, Clone, Default)]
struct PinData {
    label: String,
    address: Option<String>,
    location: Option<LatLng>,
    image: Option<ImageDescriptor>,
    anchor: Anchor,
    binding: Option<serde_json::Value>,
}

/// A declarative point marker.
///
/// Pins are shared as [`PinRef`]s. Two pins with identical contents are still
/// two different pins.
pub struct Pin {
    data: RwLock<PinData>,
    selected: AtomicBool,
    native_handle: Mutex<Option<NativeHandle>>,
    surface: Mutex<Option<SurfaceId>>,
}

impl Pin {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            data: RwLock::new(PinData {
                label: label.into(),
                ..PinData::default()
            }),
            selected: AtomicBool::new(false),
            native_handle: Mutex::new(None),
            surface: Mutex::new(None),
        }
    }

    pub fn at(self, location: LatLng) -> Self {
        self.set_location(Some(location));
        self
    }

    pub fn with_address(self, address: impl Into<String>) -> Self {
        if let Ok(mut data) = self.data.write() {
            data.address = Some(address.into());
        }
        self
    }

    pub fn with_image(self, image: ImageDescriptor) -> Self {
        self.set_image(Some(image));
        self
    }

    pub fn with_anchor(self, anchor: Anchor) -> Self {
        if let Ok(mut data) = self.data.write() {
            data.anchor = anchor;
        }
        self
    }

    /// Binds an external item to the pin; selection can match on it
    pub fn bound_to(self, value: serde_json::Value) -> Self {
        if let Ok(mut data) = self.data.write() {
            data.binding = Some(value);
        }
        self
    }

    pub fn into_ref(self) -> PinRef {
        Arc::new(self)
    }

    pub fn label(&self) -> String {
        self.data.read().map(|d| d.label.clone()).unwrap_or_default()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        if let Ok(mut data) = self.data.write() {
            data.label = label.into();
        }
    }

    pub fn location(&self) -> Option<LatLng> {
        self.data.read().ok().and_then(|d| d.location)
    }

    pub fn set_location(&self, location: Option<LatLng>) {
        if let Ok(mut data) = self.data.write() {
            data.location = location;
        }
    }

    /// True if the pin can be placed on the map
    pub fn has_known_location(&self) -> bool {
        self.location().map_or(false, |l| !l.is_unknown())
    }

    pub fn image(&self) -> Option<ImageDescriptor> {
        self.data.read().ok().and_then(|d| d.image.clone())
    }

    pub fn set_image(&self, image: Option<ImageDescriptor>) {
        if let Ok(mut data) = self.data.write() {
            data.image = image;
        }
    }

    pub fn binding(&self) -> Option<serde_json::Value> {
        self.data.read().ok().and_then(|d| d.binding.clone())
    }

    pub fn is_selected(&self) -> bool {
        self.selected.load(Ordering::SeqCst)
    }

    pub fn set_selected(&self, selected: bool) {
        self.selected.store(selected, Ordering::SeqCst);
    }

    /// Marker snapshot for the adapter, `None` while the location is unknown
    pub fn marker_options(&self) -> Option<MarkerOptions> {
        let data = self.data.read().ok()?;
        let location = data.location.filter(|l| !l.is_unknown())?;
        Some(MarkerOptions {
            location,
            label: data.label.clone(),
            address: data.address.clone(),
            anchor: data.anchor,
            selected: self.is_selected(),
        })
    }

    /// The surface this pin was last added to, if it is still alive
    pub fn map(&self) -> Option<MapSurface> {
        let id = (*self.surface.lock().ok()?)?;
        registry::lookup(id)
    }

    pub(crate) fn set_surface(&self, surface: Option<SurfaceId>) {
        if let Ok(mut slot) = self.surface.lock() {
            *slot = surface;
        }
    }

    /// Pushes changed label, location or image to the native marker.
    ///
    /// Returns false if the pin is not currently shown on a live surface.
    pub async fn refresh(self: &Arc<Self>) -> crate::Result<bool> {
        match self.map() {
            Some(map) => map.refresh_pin(self).await,
            None => Ok(false),
        }
    }
}

impl NativeBacked for Pin {
    fn native_handle(&self) -> Option<NativeHandle> {
        self.native_handle.lock().ok().and_then(|h| *h)
    }
}

impl HandleSlot for Pin {
    fn set_native_handle(&self, handle: Option<NativeHandle>) {
        if let Ok(mut slot) = self.native_handle.lock() {
            *slot = handle;
        }
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pin")
            .field("label", &self.label())
            .field("location", &self.location())
            .field("selected", &self.is_selected())
            .field("native_handle", &self.native_handle())
            .finish()
    }
}
