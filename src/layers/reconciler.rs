//! Snapshot diffing between declared pins/elements and live native handles.
//!
//! The reconciler never talks to the adapter. It answers "what must be added
//! and what must be removed" and records the outcome of each adapter call, so
//! the surface can keep exactly one native handle per declared item.

use crate::{
    core::handles::NativeHandle,
    layers::{marker::Pin, vector::MapElement},
    prelude::{HashMap, HashSet},
    traits::NativeBacked,
};
use std::sync::Arc;

/// Reference identity of a shared item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey(usize);

impl ItemKey {
    pub fn of<T>(item: &Arc<T>) -> Self {
        Self(Arc::as_ptr(item) as *const () as usize)
    }
}

/// Result of diffing a declared snapshot against a live set
#[derive(Debug)]
pub struct Diff<T> {
    pub to_add: Vec<Arc<T>>,
    pub to_remove: Vec<(Arc<T>, NativeHandle)>,
    /// Declared items that cannot be placed (unknown location)
    pub skipped_unknown: usize,
}

impl<T> Diff<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

impl<T> Default for Diff<T> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_remove: Vec::new(),
            skipped_unknown: 0,
        }
    }
}

pub type PinDiff = Diff<Pin>;
pub type ElementDiff = Diff<MapElement>;

/// Counts reported by one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    pub skipped_unknown: usize,
    /// Adapter add calls that failed; the item stays unrendered
    pub failed: usize,
}

impl SyncReport {
    /// True if the pass neither changed nor attempted anything
    pub fn is_noop(&self) -> bool {
        *self == SyncReport::default()
    }

    pub fn merge(&mut self, other: SyncReport) {
        self.added += other.added;
        self.removed += other.removed;
        self.skipped_unknown += other.skipped_unknown;
        self.failed += other.failed;
    }
}

/// Items currently rendered natively, keyed by identity
pub struct LiveSet<T> {
    entries: HashMap<ItemKey, (Arc<T>, NativeHandle)>,
    /// Insertion order, so removals are issued deterministically
    order: Vec<ItemKey>,
    by_handle: HashMap<NativeHandle, ItemKey>,
    /// Items whose add is waiting on an async step (image resolution)
    pending: HashSet<ItemKey>,
}

impl<T: NativeBacked> LiveSet<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::default(),
            order: Vec::new(),
            by_handle: HashMap::default(),
            pending: HashSet::default(),
        }
    }

    /// Diffs `declared` against the live and pending items.
    ///
    /// Items rejected by `placeable` are counted and never added; live items
    /// that stopped being placeable are removed. Duplicate references in
    /// `declared` are added once.
    pub fn diff(&self, declared: &[Arc<T>], placeable: impl Fn(&T) -> bool) -> Diff<T> {
        let mut diff = Diff::default();
        let mut kept = HashSet::default();

        for item in declared {
            let key = ItemKey::of(item);
            if kept.contains(&key) {
                continue;
            }
            if !placeable(&**item) {
                diff.skipped_unknown += 1;
                continue;
            }
            kept.insert(key);
            if !self.entries.contains_key(&key) && !self.pending.contains(&key) {
                diff.to_add.push(item.clone());
            }
        }

        for key in &self.order {
            if !kept.contains(key) {
                if let Some((item, handle)) = self.entries.get(key) {
                    diff.to_remove.push((item.clone(), *handle));
                }
            }
        }

        diff
    }

    /// Drops pending adds for items that are no longer declared
    pub fn cancel_undeclared_pending(&mut self, declared: &[Arc<T>]) -> usize {
        let declared: HashSet<ItemKey> = declared.iter().map(ItemKey::of).collect();
        let before = self.pending.len();
        self.pending.retain(|key| declared.contains(key));
        before - self.pending.len()
    }

    pub fn begin_pending(&mut self, item: &Arc<T>) {
        self.pending.insert(ItemKey::of(item));
    }

    /// Returns false if the pending add was cancelled in the meantime
    pub fn finish_pending(&mut self, item: &Arc<T>) -> bool {
        self.pending.remove(&ItemKey::of(item))
    }

    pub fn is_pending(&self, item: &Arc<T>) -> bool {
        self.pending.contains(&ItemKey::of(item))
    }

    /// Records a freshly added native item and writes its handle.
    ///
    /// An item may only be live once; a second insert is a bug in the caller.
    pub fn insert(&mut self, item: Arc<T>, handle: NativeHandle) -> bool {
        let key = ItemKey::of(&item);
        if self.entries.contains_key(&key) {
            debug_assert!(false, "item added twice to the live set ({handle})");
            log::error!("Item already live; ignoring duplicate native handle {}", handle);
            return false;
        }

        item.set_native_handle(Some(handle));
        self.by_handle.insert(handle, key);
        self.order.push(key);
        self.entries.insert(key, (item, handle));
        true
    }

    /// Forgets a live item and clears its handle
    pub fn remove(&mut self, item: &Arc<T>) -> Option<NativeHandle> {
        let key = ItemKey::of(item);
        let (item, handle) = self.entries.remove(&key)?;
        self.order.retain(|k| *k != key);
        self.by_handle.remove(&handle);
        item.set_native_handle(None);
        Some(handle)
    }

    pub fn contains(&self, item: &Arc<T>) -> bool {
        self.entries.contains_key(&ItemKey::of(item))
    }

    pub fn handle_of(&self, item: &Arc<T>) -> Option<NativeHandle> {
        self.entries.get(&ItemKey::of(item)).map(|(_, handle)| *handle)
    }

    pub fn item_for_handle(&self, handle: NativeHandle) -> Option<Arc<T>> {
        let key = self.by_handle.get(&handle)?;
        self.entries.get(key).map(|(item, _)| item.clone())
    }

    /// Live items in insertion order
    pub fn items(&self) -> Vec<Arc<T>> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|(item, _)| item.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Forgets every live and pending item without touching the native side.
    ///
    /// Returns the items that were live, with their handles already cleared.
    pub fn clear(&mut self) -> Vec<Arc<T>> {
        let items = self.items();
        for item in &items {
            item.set_native_handle(None);
        }
        self.entries.clear();
        self.order.clear();
        self.by_handle.clear();
        self.pending.clear();
        items
    }
}

impl<T: NativeBacked> Default for LiveSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Live sets for pins and map elements of one surface
#[derive(Default)]
pub struct Reconciler {
    pub pins: LiveSet<Pin>,
    pub elements: LiveSet<MapElement>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins to add (known location, not yet live) and live pins to remove
    pub fn reconcile_pins(&self, declared: &[Arc<Pin>]) -> PinDiff {
        self.pins.diff(declared, Pin::has_known_location)
    }

    /// Elements are never filtered by location
    pub fn reconcile_elements(&self, declared: &[Arc<MapElement>]) -> ElementDiff {
        self.elements.diff(declared, |_| true)
    }

    pub fn pin_for_handle(&self, handle: NativeHandle) -> Option<Arc<Pin>> {
        self.pins.item_for_handle(handle)
    }

    /// Forgets everything, as on detach
    pub fn clear(&mut self) -> (Vec<Arc<Pin>>, Vec<Arc<MapElement>>) {
        (self.pins.clear(), self.elements.clear())
    }
}
