use crate::{
    core::{geo::LatLng, handles::NativeHandle, viewport::Viewport},
    input::selection::SelectedItem,
    layers::marker::PinRef,
};
use serde::{Deserialize, Serialize};

/// Where a viewport change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewportOrigin {
    /// Set by the owning application; the camera follows
    Declarative,
    /// Reported by the native camera after the user or an animation moved it
    Native,
}

/// Notifications a surface sends to the owning application
#[derive(Debug, Clone)]
pub enum MapEvent {
    ViewportChanged {
        viewport: Viewport,
        origin: ViewportOrigin,
    },
    /// Tap on the map outside any marker
    MapClicked { location: LatLng },
    /// Tap on a marker; reported even on read-only surfaces
    MarkerClicked { handle: NativeHandle, pin: PinRef },
    SelectionChanged { selected: Option<SelectedItem> },
}

impl MapEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::ViewportChanged { .. } => "viewport_changed",
            MapEvent::MapClicked { .. } => "map_clicked",
            MapEvent::MarkerClicked { .. } => "marker_clicked",
            MapEvent::SelectionChanged { .. } => "selection_changed",
        }
    }

    pub fn is_native_viewport_change(&self) -> bool {
        matches!(
            self,
            MapEvent::ViewportChanged {
                origin: ViewportOrigin::Native,
                ..
            }
        )
    }
}
