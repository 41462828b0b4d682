mod common;

use common::*;
use mapsync::input::selection;
use mapsync::prelude::*;
use serde_json::json;

/// Selection tests: declarative selection and native marker taps converge on one pin
#[cfg(test)]
mod selection_tests {
    use super::*;

    fn selected_labels(pins: &[PinRef]) -> Vec<String> {
        pins.iter()
            .filter(|pin| pin.is_selected())
            .map(|pin| pin.label())
            .collect()
    }

    async fn surface_with_pins(readonly: bool) -> (MapSurface, Vec<PinRef>) {
        let options = SyncOptions {
            readonly,
            ..SyncOptions::default()
        };
        let (surface, _, _) = attached_surface(options, 0).await;
        let pins = vec![
            pin("a", 1.0, 1.0),
            Pin::new("b")
                .at(LatLng::new(2.0, 2.0))
                .bound_to(json!({ "id": "b" }))
                .into_ref(),
            pin("c", 3.0, 3.0),
        ];
        surface.set_pins(pins.clone()).await;
        (surface, pins)
    }

    #[tokio::test(start_paused = true)]
    async fn test_declarative_selection_is_exclusive() {
        let (surface, pins) = surface_with_pins(false).await;
        pins.iter().for_each(|pin| pin.set_selected(true));

        let selected = surface.set_selected_item(Some(SelectedItem::Pin(pins[2].clone())));
        assert!(Arc::ptr_eq(&selected.unwrap(), &pins[2]));
        assert_eq!(selected_labels(&pins), vec!["c".to_string()]);

        surface.set_selected_item(Some(SelectedItem::Value(json!({ "id": "b" }))));
        assert_eq!(selected_labels(&pins), vec!["b".to_string()]);

        assert!(surface
            .set_selected_item(Some(SelectedItem::Value(json!("nothing"))))
            .is_none());
        assert!(selected_labels(&pins).is_empty());
    }

    /// Tapping markers selects their pins, one at a time
    #[tokio::test(start_paused = true)]
    async fn test_marker_taps_select_exclusively() {
        let (surface, pins) = surface_with_pins(false).await;

        assert!(surface.on_marker_tapped(pins[0].native_handle().unwrap()));
        assert_eq!(selected_labels(&pins), vec!["a".to_string()]);
        assert_eq!(surface.selected_item(), Some(SelectedItem::Pin(pins[0].clone())));

        // A bound pin selects its bound value
        assert!(surface.on_marker_tapped(pins[1].native_handle().unwrap()));
        assert_eq!(selected_labels(&pins), vec!["b".to_string()]);
        assert_eq!(
            surface.selected_item(),
            Some(SelectedItem::Value(json!({ "id": "b" })))
        );

        let names: Vec<&str> = drain_events(&surface).iter().map(MapEvent::name).collect();
        assert_eq!(
            names,
            vec!["marker_clicked", "selection_changed", "marker_clicked", "selection_changed"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_readonly_taps_do_not_select() {
        let (surface, pins) = surface_with_pins(true).await;

        assert!(surface.on_marker_tapped(pins[0].native_handle().unwrap()));
        assert!(selected_labels(&pins).is_empty());
        assert!(surface.selected_item().is_none());

        let events = drain_events(&surface);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], MapEvent::MarkerClicked { pin, .. } if Arc::ptr_eq(pin, &pins[0])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_marker_and_map_taps() {
        let (surface, pins) = surface_with_pins(false).await;

        assert!(!surface.on_marker_tapped(NativeHandle(9_999)));
        surface.on_map_tapped(LatLng::new(10.0, 20.0));

        assert!(selected_labels(&pins).is_empty());
        let events = drain_events(&surface);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            MapEvent::MapClicked { location } if location == LatLng::new(10.0, 20.0)
        ));
    }

    /// Re-selecting the same item does not emit a second change
    #[tokio::test(start_paused = true)]
    async fn test_selection_change_events() {
        let (surface, pins) = surface_with_pins(false).await;
        let item = Some(SelectedItem::Pin(pins[0].clone()));

        surface.set_selected_item(item.clone());
        surface.set_selected_item(item);
        surface.set_selected_item(None);

        let names: Vec<&str> = drain_events(&surface).iter().map(MapEvent::name).collect();
        assert_eq!(names, vec!["selection_changed", "selection_changed"]);
        assert!(selected_labels(&pins).is_empty());
    }

    /// Pins dropped from the declared set lose their selection flag
    #[tokio::test(start_paused = true)]
    async fn test_removed_pins_are_deselected() {
        let (surface, pins) = surface_with_pins(false).await;

        surface.set_selected_item(Some(SelectedItem::Pin(pins[0].clone())));
        surface.remove_pin(&pins[0]).await;
        assert!(!pins[0].is_selected());

        surface.set_selected_item(Some(SelectedItem::Pin(pins[2].clone())));
        surface.add_pin(pins[0].clone()).await;
        let declared = surface.pins();
        assert_eq!(selection::selected_count(&declared), 1);
        assert!(Arc::ptr_eq(&selection::selected_pin(&declared).unwrap(), &pins[2]));

        // Replacing the whole set behaves the same
        surface.set_selected_item(Some(SelectedItem::Value(json!({ "id": "b" }))));
        surface.set_pins(vec![pins[0].clone(), pins[2].clone()]).await;
        assert!(!pins[1].is_selected());
        assert!(selected_labels(&pins).is_empty());
    }
}
