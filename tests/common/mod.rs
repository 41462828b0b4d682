//! Test doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use mapsync::{
    layers::{marker::MarkerOptions, vector::MapElement},
    prelude::*,
};
use std::any::Any;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One adapter call, as observed by [`RecordingAdapter`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AddMarker {
        handle: NativeHandle,
        label: String,
        has_icon: bool,
    },
    RemoveMarker(NativeHandle),
    UpdateMarker {
        handle: NativeHandle,
        label: String,
        has_icon: bool,
    },
    AddShape(NativeHandle),
    RemoveShape(NativeHandle),
    UpdateShape(NativeHandle),
    MoveCamera {
        viewport: Viewport,
        animated: bool,
    },
}

/// Fake native map that records every call and tracks live handles
#[derive(Default)]
pub struct RecordingAdapter {
    next_handle: AtomicU64,
    calls: Mutex<Vec<Call>>,
    camera_times: Mutex<Vec<Instant>>,
    markers: Mutex<BTreeSet<NativeHandle>>,
    shapes: Mutex<BTreeSet<NativeHandle>>,
    pub reject_camera: AtomicBool,
}

impl RecordingAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn mint(&self) -> NativeHandle {
        NativeHandle(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
        self.camera_times.lock().unwrap().clear();
    }

    pub fn marker_count(&self) -> usize {
        self.markers.lock().unwrap().len()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.lock().unwrap().len()
    }

    pub fn added_labels(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AddMarker { label, .. } => Some(label),
                _ => None,
            })
            .collect()
    }

    pub fn camera_moves(&self) -> Vec<(Viewport, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::MoveCamera { viewport, animated } => Some((viewport, animated)),
                _ => None,
            })
            .collect()
    }

    pub fn camera_times(&self) -> Vec<Instant> {
        self.camera_times.lock().unwrap().clone()
    }
}

impl NativeMapAdapter for RecordingAdapter {
    fn add_marker(&self, marker: &MarkerOptions, icon: Option<ImageRef>) -> Result<NativeHandle> {
        let handle = self.mint();
        self.markers.lock().unwrap().insert(handle);
        self.record(Call::AddMarker {
            handle,
            label: marker.label.clone(),
            has_icon: icon.is_some(),
        });
        Ok(handle)
    }

    fn remove_marker(&self, handle: NativeHandle) -> Result<()> {
        if !self.markers.lock().unwrap().remove(&handle) {
            return Err(format!("unknown marker {handle}").into());
        }
        self.record(Call::RemoveMarker(handle));
        Ok(())
    }

    fn update_marker(
        &self,
        handle: NativeHandle,
        marker: &MarkerOptions,
        icon: Option<ImageRef>,
    ) -> Result<()> {
        self.record(Call::UpdateMarker {
            handle,
            label: marker.label.clone(),
            has_icon: icon.is_some(),
        });
        Ok(())
    }

    fn add_shape(&self, _element: &MapElement) -> Result<NativeHandle> {
        let handle = self.mint();
        self.shapes.lock().unwrap().insert(handle);
        self.record(Call::AddShape(handle));
        Ok(handle)
    }

    fn remove_shape(&self, handle: NativeHandle) -> Result<()> {
        self.shapes.lock().unwrap().remove(&handle);
        self.record(Call::RemoveShape(handle));
        Ok(())
    }

    fn update_shape(&self, handle: NativeHandle, _element: &MapElement) -> Result<()> {
        self.record(Call::UpdateShape(handle));
        Ok(())
    }

    fn move_camera(&self, viewport: &Viewport, animated: bool) -> Result<()> {
        if self.reject_camera.load(Ordering::SeqCst) {
            return Err("camera not ready".into());
        }
        self.camera_times.lock().unwrap().push(Instant::now());
        self.record(Call::MoveCamera {
            viewport: *viewport,
            animated,
        });
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeImage(pub String);

impl NativeImage for FakeImage {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Loader that counts loads, can be slowed down and fails for `broken*` names
#[derive(Default)]
pub struct CountingLoader {
    pub loads: AtomicUsize,
    pub delay_ms: AtomicU64,
}

impl CountingLoader {
    pub fn new(delay_ms: u64) -> Arc<Self> {
        let loader = Self::default();
        loader.delay_ms.store(delay_ms, Ordering::SeqCst);
        Arc::new(loader)
    }
}

#[async_trait]
impl ImageLoader for CountingLoader {
    async fn load_image(&self, descriptor: &ImageDescriptor) -> Result<ImageRef> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        match descriptor {
            ImageDescriptor::Resource(name) if name.starts_with("broken") => {
                Err(format!("cannot decode {name}").into())
            }
            other => Ok(Arc::new(FakeImage(format!("{other:?}")))),
        }
    }
}

pub fn pin(label: &str, lat: f64, lng: f64) -> PinRef {
    Pin::new(label).at(LatLng::new(lat, lng)).into_ref()
}

/// Surface over a recording adapter and a loader with the given delay, already attached.
///
/// Waits for the initial region to settle and clears the recorded calls, so
/// tests start from an idle camera and an empty call log.
pub async fn attached_surface(
    options: SyncOptions,
    loader_delay_ms: u64,
) -> (MapSurface, Arc<RecordingAdapter>, Arc<CountingLoader>) {
    init_logging();
    let settle = options.camera.settle_delay(false);
    let adapter = RecordingAdapter::new();
    let loader = CountingLoader::new(loader_delay_ms);
    let surface = MapSurface::builder(adapter.clone())
        .with_image_loader(loader.clone())
        .with_options(options)
        .build()
        .unwrap();
    surface.attach().await;
    tokio::time::sleep(settle + Duration::from_millis(1)).await;
    assert_eq!(adapter.camera_moves().len(), 1, "initial region not applied");
    adapter.clear_calls();
    (surface, adapter, loader)
}

pub fn drain_events(surface: &MapSurface) -> Vec<MapEvent> {
    surface.events().try_iter().collect()
}
