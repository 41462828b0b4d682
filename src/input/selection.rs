//! Keeps the selected item and the pins' `is_selected` flags consistent.
//!
//! Both directions go through [`apply_selection`]: a declarative selection
//! change and a native marker tap clear every flag first and then set at most
//! one.

use crate::layers::marker::PinRef;
use std::sync::Arc;

/// What the application considers selected
#[derive(Debug, Clone)]
pub enum SelectedItem {
    /// A pin, by reference
    Pin(PinRef),
    /// An external item matched against the pins' bound values
    Value(serde_json::Value),
}

impl SelectedItem {
    /// The item a tap on `pin` selects: its bound value, or the pin itself
    pub fn for_pin(pin: &PinRef) -> Self {
        match pin.binding() {
            Some(value) => SelectedItem::Value(value),
            None => SelectedItem::Pin(pin.clone()),
        }
    }

    fn matches(&self, pin: &PinRef) -> bool {
        match self {
            SelectedItem::Pin(selected) => Arc::ptr_eq(selected, pin),
            SelectedItem::Value(value) => pin.binding().as_ref() == Some(value),
        }
    }
}

impl PartialEq for SelectedItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SelectedItem::Pin(a), SelectedItem::Pin(b)) => Arc::ptr_eq(a, b),
            (SelectedItem::Value(a), SelectedItem::Value(b)) => a == b,
            _ => false,
        }
    }
}

/// First pin matching `item`, by reference or by bound value
pub fn resolve<'a>(pins: &'a [PinRef], item: &SelectedItem) -> Option<&'a PinRef> {
    let mut matches = pins.iter().filter(|pin| item.matches(pin));
    let first = matches.next()?;
    let others = matches.count();
    if others > 0 {
        log::debug!(
            "Selection matched {} pins; selecting the first ({:?})",
            others + 1,
            first.label()
        );
    }
    Some(first)
}

/// Clears every selected pin, then selects the match for `item`, if any
pub fn apply_selection(pins: &[PinRef], item: Option<&SelectedItem>) -> Option<PinRef> {
    pins.iter()
        .filter(|pin| pin.is_selected())
        .for_each(|pin| pin.set_selected(false));

    let selected = item.and_then(|item| resolve(pins, item))?;
    selected.set_selected(true);
    Some(selected.clone())
}

/// Number of pins currently flagged as selected
pub fn selected_count(pins: &[PinRef]) -> usize {
    pins.iter().filter(|pin| pin.is_selected()).count()
}

/// The currently selected pin, if any
pub fn selected_pin(pins: &[PinRef]) -> Option<PinRef> {
    pins.iter().find(|pin| pin.is_selected()).cloned()
}
