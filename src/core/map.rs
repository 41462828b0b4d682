//! The map surface: declarative state plus the controllers that keep the
//! native widget in line with it.
//!
//! Declarative mutations flow out through the reconciler and the camera
//! queue; native callbacks flow back through the debouncer and the selection
//! logic. Nothing else talks to the adapter.

use crate::{
    camera::{
        controller::{MoveRequest, ViewportController},
        debounce::Debouncer,
    },
    core::{
        config::SyncOptions,
        geo::{Distance, LatLng},
        handles::{NativeHandle, SurfaceId},
        registry,
        viewport::Viewport,
    },
    images::cache::ImageCache,
    input::{
        events::{MapEvent, ViewportOrigin},
        selection::{self, SelectedItem},
    },
    layers::{
        marker::{Pin, PinRef, PinTemplate},
        reconciler::{ItemKey, Reconciler, SyncReport},
        vector::ElementRef,
    },
    prelude::HashSet,
    spatial::fit,
    traits::{ImageLoader, ImageRef, NativeMapAdapter},
    MapError, Result,
};
use crossbeam_channel::{Receiver, Sender};
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Root declarative state of one surface
pub struct MapState {
    pins: Vec<PinRef>,
    elements: Vec<ElementRef>,
    viewport: Viewport,
    selected: Option<SelectedItem>,
    /// Last declarative move with a known center; re-applied without animation on attach
    last_move: MoveRequest,
    items: Vec<serde_json::Value>,
    template: Option<Arc<PinTemplate>>,
}

impl MapState {
    fn new(options: &SyncOptions) -> Self {
        Self {
            pins: Vec::new(),
            elements: Vec::new(),
            viewport: options.initial_viewport.unwrap_or_default(),
            selected: None,
            last_move: MoveRequest::new(options.initial_viewport.unwrap_or_default(), false),
            items: Vec::new(),
            template: None,
        }
    }

    pub fn pins(&self) -> &[PinRef] {
        &self.pins
    }

    pub fn elements(&self) -> &[ElementRef] {
        &self.elements
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selected(&self) -> Option<&SelectedItem> {
        self.selected.as_ref()
    }

    pub fn last_move(&self) -> MoveRequest {
        self.last_move
    }

    /// Swaps the declared pins; pins that drop out lose their selection flag
    fn replace_pins(&mut self, pins: Vec<PinRef>) {
        let kept: HashSet<ItemKey> = pins.iter().map(ItemKey::of).collect();
        self.pins
            .iter()
            .filter(|pin| !kept.contains(&ItemKey::of(*pin)))
            .for_each(|pin| pin.set_selected(false));
        self.pins = pins;
    }

    fn retain_pins(&mut self, keep: impl Fn(&PinRef) -> bool) {
        let pins = self.pins.iter().filter(|pin| keep(pin)).cloned().collect();
        self.replace_pins(pins);
    }
}

enum AddOutcome {
    Added,
    Failed,
    /// Undeclared, detached or no longer placeable while the image resolved
    Dropped,
}

pub(crate) struct SurfaceInner {
    id: SurfaceId,
    adapter: Arc<dyn NativeMapAdapter>,
    images: ImageCache,
    options: SyncOptions,
    state: Mutex<MapState>,
    reconciler: Mutex<Reconciler>,
    camera: ViewportController,
    debouncer: Debouncer,
    events_tx: Sender<MapEvent>,
    events_rx: Receiver<MapEvent>,
    attached: AtomicBool,
    /// Bumped on every detach; async completions from an older generation are dropped
    generation: AtomicU64,
}

impl Drop for SurfaceInner {
    fn drop(&mut self) {
        self.debouncer.cancel();
        self.camera.detach();
        registry::unregister(self.id);
    }
}

/// A map surface bound to one native map widget.
///
/// Cloning is cheap and yields another handle to the same surface. Methods
/// that start timers or camera moves must run inside a tokio runtime.
#[derive(Clone)]
pub struct MapSurface {
    inner: Arc<SurfaceInner>,
}

impl MapSurface {
    pub(crate) fn new(
        adapter: Arc<dyn NativeMapAdapter>,
        loader: Arc<dyn ImageLoader>,
        options: SyncOptions,
    ) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let inner = Arc::new(SurfaceInner {
            id: SurfaceId::next(),
            camera: ViewportController::new(adapter.clone(), options.camera),
            debouncer: Debouncer::new(options.camera.debounce()),
            images: ImageCache::new(loader),
            state: Mutex::new(MapState::new(&options)),
            reconciler: Mutex::new(Reconciler::new()),
            adapter,
            options,
            events_tx,
            events_rx,
            attached: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        });
        registry::register(inner.id, &inner);
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<SurfaceInner>) -> Self {
        Self { inner }
    }

    pub fn builder(adapter: Arc<dyn NativeMapAdapter>) -> crate::core::builder::MapSurfaceBuilder {
        crate::core::builder::MapSurfaceBuilder::new(adapter)
    }

    pub fn id(&self) -> SurfaceId {
        self.inner.id
    }

    pub fn options(&self) -> &SyncOptions {
        &self.inner.options
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached.load(Ordering::SeqCst)
    }

    /// Receiver for outbound notifications; all clones share one queue
    pub fn events(&self) -> Receiver<MapEvent> {
        self.inner.events_rx.clone()
    }

    pub fn camera(&self) -> &ViewportController {
        &self.inner.camera
    }

    pub fn image_cache(&self) -> &ImageCache {
        &self.inner.images
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Connects the surface to its native widget.
    ///
    /// Re-applies the last requested region without animation, then adds
    /// every declared element and pin.
    pub async fn attach(&self) -> SyncReport {
        if self.inner.attached.swap(true, Ordering::SeqCst) {
            log::debug!("Surface {} already attached", self.id().raw());
            return SyncReport::default();
        }
        self.inner.camera.attach();

        let (pins, elements, last_move) = {
            let state = self.lock_state();
            (state.pins.clone(), state.elements.clone(), state.last_move)
        };

        self.inner
            .camera
            .enqueue(MoveRequest::new(last_move.viewport, false));

        let mut report = self.sync_elements(&elements);
        report.merge(self.sync_pins(pins).await);
        log::debug!("Surface {} attached: {:?}", self.id().raw(), report);
        report
    }

    /// Disconnects from the native widget.
    ///
    /// Pending debounce timers and queued camera moves are dropped, native
    /// handles are forgotten without adapter calls and cached images are
    /// disposed. Declarative state is kept for the next attach.
    pub fn detach(&self) {
        if !self.inner.attached.swap(false, Ordering::SeqCst) {
            return;
        }
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.debouncer.cancel();
        self.inner.camera.detach();

        let (pins, elements) = self.lock_reconciler().clear();
        pins.iter().for_each(|pin| pin.set_surface(None));
        elements.iter().for_each(|element| element.set_surface(None));
        self.inner.images.clear();

        log::debug!(
            "Surface {} detached; forgot {} markers and {} shapes",
            self.id().raw(),
            pins.len(),
            elements.len()
        );
    }

    // ------------------------------------------------------------------
    // Pins
    // ------------------------------------------------------------------

    /// Replaces the declared pins and reconciles against the native markers
    pub async fn set_pins(&self, pins: Vec<PinRef>) -> SyncReport {
        self.lock_state().replace_pins(pins.clone());
        self.sync_pins(pins).await
    }

    pub async fn add_pin(&self, pin: PinRef) -> SyncReport {
        let pins = {
            let mut state = self.lock_state();
            state.pins.push(pin);
            state.pins.clone()
        };
        self.sync_pins(pins).await
    }

    /// Removes the pin by reference; other pins with equal contents stay
    pub async fn remove_pin(&self, pin: &PinRef) -> SyncReport {
        let pins = {
            let mut state = self.lock_state();
            state.retain_pins(|p| !Arc::ptr_eq(p, pin));
            state.pins.clone()
        };
        self.sync_pins(pins).await
    }

    pub fn pins(&self) -> Vec<PinRef> {
        self.lock_state().pins.clone()
    }

    /// Builds one pin per item through `template` and shows them.
    ///
    /// Each pin is bound to its item, so selecting the item selects the pin.
    pub async fn set_items<F>(&self, items: Vec<serde_json::Value>, template: F) -> SyncReport
    where
        F: Fn(&serde_json::Value) -> Option<Pin> + Send + Sync + 'static,
    {
        let template: Arc<PinTemplate> = Arc::new(template);
        let pins: Vec<PinRef> = items
            .iter()
            .filter_map(|item| build_item_pin(&template, item))
            .collect();

        {
            let mut state = self.lock_state();
            state.items = items;
            state.template = Some(template);
            state.replace_pins(pins.clone());
        }
        self.sync_pins(pins).await
    }

    /// Appends an item to the items source; requires a prior `set_items`
    pub async fn add_item(&self, item: serde_json::Value) -> Result<SyncReport> {
        let pins = {
            let mut state = self.lock_state();
            let template = state.template.clone().ok_or(MapError::MissingTemplate)?;
            if let Some(pin) = build_item_pin(&template, &item) {
                state.pins.push(pin);
            }
            state.items.push(item);
            state.pins.clone()
        };
        Ok(self.sync_pins(pins).await)
    }

    /// Removes every item equal to `item` and the pins bound to it
    pub async fn remove_item(&self, item: &serde_json::Value) -> SyncReport {
        let pins = {
            let mut state = self.lock_state();
            state.items.retain(|i| i != item);
            state.retain_pins(|pin| pin.binding().as_ref() != Some(item));
            state.pins.clone()
        };
        self.sync_pins(pins).await
    }

    pub fn items(&self) -> Vec<serde_json::Value> {
        self.lock_state().items.clone()
    }

    async fn sync_pins(&self, declared: Vec<PinRef>) -> SyncReport {
        let mut report = SyncReport::default();
        if !self.is_attached() {
            return report;
        }
        let started = Instant::now();
        let generation = self.generation();

        let to_add = {
            let mut reconciler = self.lock_reconciler();
            reconciler.pins.cancel_undeclared_pending(&declared);
            let diff = reconciler.reconcile_pins(&declared);
            report.skipped_unknown = diff.skipped_unknown;
            let declared_keys: HashSet<ItemKey> = declared.iter().map(ItemKey::of).collect();

            // Removals first, so a replaced pin never shows twice
            for (pin, _) in &diff.to_remove {
                // A declared pin that lost its location can still refresh itself back
                let keep_surface = declared_keys.contains(&ItemKey::of(pin));
                if self.remove_live_pin(&mut reconciler, pin, keep_surface) {
                    report.removed += 1;
                }
            }
            for pin in &diff.to_add {
                reconciler.pins.begin_pending(pin);
            }
            diff.to_add
        };

        if report.skipped_unknown > 0 {
            log::debug!("Skipped {} pins with unknown location", report.skipped_unknown);
        }

        // Each add awaits only its own icon; pins without images go in immediately
        let outcomes = join_all(
            to_add
                .into_iter()
                .map(|pin| self.add_pin_marker(pin, generation)),
        )
        .await;
        for outcome in outcomes {
            match outcome {
                AddOutcome::Added => report.added += 1,
                AddOutcome::Failed => report.failed += 1,
                AddOutcome::Dropped => {}
            }
        }

        log::debug!(
            "Reconciled pins in {:?}: {} added, {} removed, {} skipped, {} failed",
            started.elapsed(),
            report.added,
            report.removed,
            report.skipped_unknown,
            report.failed
        );
        report
    }

    async fn add_pin_marker(&self, pin: PinRef, generation: u64) -> AddOutcome {
        let icon = self.resolve_icon(&pin).await;
        if !self.is_current(generation) {
            return AddOutcome::Dropped;
        }

        let mut reconciler = self.lock_reconciler();
        if !reconciler.pins.finish_pending(&pin) {
            log::debug!("Pin {:?} removed while its image loaded", pin.label());
            return AddOutcome::Dropped;
        }
        let Some(marker) = pin.marker_options() else {
            return AddOutcome::Dropped;
        };

        match self.inner.adapter.add_marker(&marker, icon) {
            Ok(handle) => {
                if reconciler.pins.insert(pin.clone(), handle) {
                    pin.set_surface(Some(self.inner.id));
                    AddOutcome::Added
                } else {
                    if let Err(e) = self.inner.adapter.remove_marker(handle) {
                        log::warn!("Failed to remove duplicate marker {}: {}", handle, e);
                    }
                    AddOutcome::Failed
                }
            }
            Err(e) => {
                log::warn!("Failed to add marker for pin {:?}: {}", marker.label, e);
                AddOutcome::Failed
            }
        }
    }

    /// Icon for the pin, or `None` for the default marker
    async fn resolve_icon(&self, pin: &Pin) -> Option<ImageRef> {
        let descriptor = pin.image()?;
        match self.inner.images.get(&descriptor).await {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!(
                    "Using default marker for pin {:?}; image failed: {}",
                    pin.label(),
                    e
                );
                None
            }
        }
    }

    /// Pushes a pin's current label, location and icon to the native map.
    ///
    /// A live pin whose location became unknown loses its marker; a declared
    /// pin that regained a location gets one again. Returns `Ok(false)` if
    /// nothing on this surface changed.
    pub async fn refresh_pin(&self, pin: &PinRef) -> Result<bool> {
        if !self.is_attached() {
            return Err(MapError::Detached.into());
        }
        let generation = self.generation();
        if !self.lock_reconciler().pins.contains(pin) {
            return Ok(self.restore_pin(pin).await);
        }
        if !pin.has_known_location() {
            let mut reconciler = self.lock_reconciler();
            return Ok(self.remove_live_pin(&mut reconciler, pin, true));
        }

        let icon = self.resolve_icon(pin).await;
        if !self.is_current(generation) {
            return Err(MapError::Detached.into());
        }

        let mut reconciler = self.lock_reconciler();
        let Some(handle) = reconciler.pins.handle_of(pin) else {
            return Ok(false);
        };
        let Some(marker) = pin.marker_options() else {
            return Ok(self.remove_live_pin(&mut reconciler, pin, true));
        };
        self.inner
            .adapter
            .update_marker(handle, &marker, icon)
            .map_err(|e| MapError::Adapter(e.to_string()))?;
        Ok(true)
    }

    /// Re-adds a declared pin that is not live, if it can be placed now
    async fn restore_pin(&self, pin: &PinRef) -> bool {
        let declared = self.pins();
        if !pin.has_known_location() || !declared.iter().any(|p| Arc::ptr_eq(p, pin)) {
            return false;
        }
        self.sync_pins(declared).await.added > 0 && self.lock_reconciler().pins.contains(pin)
    }

    /// Drops a live pin's marker; returns false if the pin was not live
    fn remove_live_pin(
        &self,
        reconciler: &mut Reconciler,
        pin: &PinRef,
        keep_surface: bool,
    ) -> bool {
        let Some(handle) = reconciler.pins.remove(pin) else {
            return false;
        };
        if !keep_surface {
            pin.set_surface(None);
        }
        if let Err(e) = self.inner.adapter.remove_marker(handle) {
            log::warn!("Failed to remove marker {}: {}", handle, e);
        }
        true
    }

    pub fn live_pin_count(&self) -> usize {
        self.lock_reconciler().pins.len()
    }

    /// Pins whose add is still waiting on an image
    pub fn pending_pin_count(&self) -> usize {
        self.lock_reconciler().pins.pending_len()
    }

    pub fn pin_for_handle(&self, handle: NativeHandle) -> Option<PinRef> {
        self.lock_reconciler().pin_for_handle(handle)
    }

    // ------------------------------------------------------------------
    // Map elements
    // ------------------------------------------------------------------

    pub fn set_map_elements(&self, elements: Vec<ElementRef>) -> SyncReport {
        self.lock_state().elements = elements.clone();
        self.sync_elements(&elements)
    }

    pub fn add_element(&self, element: ElementRef) -> SyncReport {
        let elements = {
            let mut state = self.lock_state();
            state.elements.push(element);
            state.elements.clone()
        };
        self.sync_elements(&elements)
    }

    pub fn remove_element(&self, element: &ElementRef) -> SyncReport {
        let elements = {
            let mut state = self.lock_state();
            state.elements.retain(|e| !Arc::ptr_eq(e, element));
            state.elements.clone()
        };
        self.sync_elements(&elements)
    }

    pub fn elements(&self) -> Vec<ElementRef> {
        self.lock_state().elements.clone()
    }

    fn sync_elements(&self, declared: &[ElementRef]) -> SyncReport {
        let mut report = SyncReport::default();
        if !self.is_attached() {
            return report;
        }

        let mut reconciler = self.lock_reconciler();
        let diff = reconciler.reconcile_elements(declared);

        for (element, handle) in &diff.to_remove {
            reconciler.elements.remove(element);
            element.set_surface(None);
            if let Err(e) = self.inner.adapter.remove_shape(*handle) {
                log::warn!("Failed to remove shape {}: {}", handle, e);
            }
            report.removed += 1;
        }

        for element in diff.to_add {
            match self.inner.adapter.add_shape(&element) {
                Ok(handle) => {
                    if reconciler.elements.insert(element.clone(), handle) {
                        element.set_surface(Some(self.inner.id));
                        report.added += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to add {}: {}", element.geometry().kind(), e);
                    report.failed += 1;
                }
            }
        }

        if !report.is_noop() {
            log::debug!(
                "Reconciled elements: {} added, {} removed, {} failed",
                report.added,
                report.removed,
                report.failed
            );
        }
        report
    }

    /// Pushes a live element's current geometry and style to its shape
    pub fn refresh_element(&self, element: &ElementRef) -> Result<bool> {
        if !self.is_attached() {
            return Err(MapError::Detached.into());
        }
        let reconciler = self.lock_reconciler();
        let Some(handle) = reconciler.elements.handle_of(element) else {
            return Ok(false);
        };
        self.inner
            .adapter
            .update_shape(handle, element)
            .map_err(|e| MapError::Adapter(e.to_string()))?;
        Ok(true)
    }

    pub fn live_element_count(&self) -> usize {
        self.lock_reconciler().elements.len()
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    pub fn viewport(&self) -> Viewport {
        self.lock_state().viewport
    }

    /// Declarative viewport change; the camera follows with an animation
    pub fn set_viewport(&self, viewport: Viewport) {
        self.move_to_region(viewport, true);
    }

    /// Requests a camera move to `viewport`.
    ///
    /// While detached the request is only remembered and applied on attach.
    /// Requests with an unknown center never replace the remembered region.
    pub fn move_to_region(&self, viewport: Viewport, animated: bool) {
        let request = MoveRequest::new(viewport, animated);
        let known = !viewport.has_unknown_center();
        if known {
            {
                let mut state = self.lock_state();
                state.last_move = request;
                state.viewport = viewport;
            }
            self.emit(MapEvent::ViewportChanged {
                viewport,
                origin: ViewportOrigin::Declarative,
            });
        }
        if self.is_attached() {
            self.inner.camera.enqueue(request);
        }
    }

    /// Moves to `center`, keeping the current radius
    pub fn set_center(&self, center: LatLng) {
        if center.is_unknown() {
            log::debug!("Ignoring unknown center");
            return;
        }
        let viewport = self.viewport().with_center(center);
        self.move_to_region(viewport, true);
    }

    /// Zooms to show `radius` around the current center
    pub fn set_zoom_level(&self, radius: Distance) {
        if radius == Distance::ZERO {
            log::debug!("Ignoring zero zoom radius");
            return;
        }
        let viewport = self.viewport().with_radius(radius);
        self.move_to_region(viewport, true);
    }

    /// Moves the camera to cover every declared pin with a known location
    pub fn fit_to_pins(&self) -> Option<Viewport> {
        let locations: Vec<Option<LatLng>> =
            self.pins().iter().map(|pin| pin.location()).collect();
        let viewport = fit::fit_viewport(locations, &self.inner.options.fit)?;
        self.move_to_region(viewport, true);
        Some(viewport)
    }

    /// Native camera settled at `viewport`.
    ///
    /// Bursts are debounced; the survivor updates the declarative viewport
    /// without enqueueing a camera move.
    pub fn on_camera_idle(&self, viewport: Viewport) {
        if !self.is_attached() {
            return;
        }
        let generation = self.generation();
        let surface = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(move || {
            if let Some(inner) = surface.upgrade() {
                MapSurface::from_inner(inner).apply_native_viewport(viewport, generation);
            }
        });
    }

    fn apply_native_viewport(&self, viewport: Viewport, generation: u64) {
        if !self.is_current(generation) || viewport.has_unknown_center() {
            return;
        }
        self.lock_state().viewport = viewport;
        self.emit(MapEvent::ViewportChanged {
            viewport,
            origin: ViewportOrigin::Native,
        });
    }

    // ------------------------------------------------------------------
    // Selection and taps
    // ------------------------------------------------------------------

    pub fn selected_item(&self) -> Option<SelectedItem> {
        self.lock_state().selected.clone()
    }

    /// Selects `item` (or nothing), clearing any previous selection first.
    ///
    /// Returns the pin that ended up selected.
    pub fn set_selected_item(&self, item: Option<SelectedItem>) -> Option<PinRef> {
        let (pins, changed) = {
            let mut state = self.lock_state();
            let changed = state.selected != item;
            state.selected = item.clone();
            (state.pins.clone(), changed)
        };

        let selected = selection::apply_selection(&pins, item.as_ref());
        if changed {
            self.emit(MapEvent::SelectionChanged { selected: item });
        }
        selected
    }

    /// Native marker tap; returns false for handles this surface does not know
    pub fn on_marker_tapped(&self, handle: NativeHandle) -> bool {
        let Some(pin) = self.pin_for_handle(handle) else {
            log::debug!("Tap on unknown marker {}", handle);
            return false;
        };

        self.emit(MapEvent::MarkerClicked {
            handle,
            pin: pin.clone(),
        });
        if self.inner.options.readonly {
            return true;
        }
        self.set_selected_item(Some(SelectedItem::for_pin(&pin)));
        true
    }

    pub fn on_map_tapped(&self, location: LatLng) {
        self.emit(MapEvent::MapClicked { location });
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn emit(&self, event: MapEvent) {
        // The surface owns a receiver, so the channel never disconnects
        let _ = self.inner.events_tx.send(event);
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.is_attached() && self.generation() == generation
    }

    fn lock_state(&self) -> MutexGuard<'_, MapState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_reconciler(&self) -> MutexGuard<'_, Reconciler> {
        self.inner
            .reconciler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn build_item_pin(template: &Arc<PinTemplate>, item: &serde_json::Value) -> Option<PinRef> {
    let pin = template(item)?;
    Some(pin.bound_to(item.clone()).into_ref())
}

impl std::fmt::Debug for MapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSurface")
            .field("id", &self.inner.id)
            .field("attached", &self.is_attached())
            .field("viewport", &self.viewport())
            .finish()
    }
}
