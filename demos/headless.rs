use anyhow::anyhow;
use mapsync::{
    layers::{marker::MarkerOptions, vector::MapElement},
    prelude::*,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// Stand-in for a platform map widget: logs every call it receives
#[derive(Default)]
struct LoggingAdapter {
    next: AtomicU64,
}

impl LoggingAdapter {
    fn mint(&self) -> NativeHandle {
        NativeHandle(self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl NativeMapAdapter for LoggingAdapter {
    fn add_marker(&self, marker: &MarkerOptions, icon: Option<ImageRef>) -> Result<NativeHandle> {
        let handle = self.mint();
        log::info!(
            "add_marker {} '{}' at {:.4}, {:.4} (icon: {})",
            handle,
            marker.label,
            marker.location.lat,
            marker.location.lng,
            icon.is_some()
        );
        Ok(handle)
    }

    fn remove_marker(&self, handle: NativeHandle) -> Result<()> {
        log::info!("remove_marker {}", handle);
        Ok(())
    }

    fn update_marker(
        &self,
        handle: NativeHandle,
        marker: &MarkerOptions,
        _icon: Option<ImageRef>,
    ) -> Result<()> {
        log::info!("update_marker {} '{}'", handle, marker.label);
        Ok(())
    }

    fn add_shape(&self, element: &MapElement) -> Result<NativeHandle> {
        let handle = self.mint();
        log::info!("add_shape {} ({})", handle, element.geometry().kind());
        Ok(handle)
    }

    fn remove_shape(&self, handle: NativeHandle) -> Result<()> {
        log::info!("remove_shape {}", handle);
        Ok(())
    }

    fn update_shape(&self, handle: NativeHandle, element: &MapElement) -> Result<()> {
        log::info!("update_shape {} ({})", handle, element.geometry().kind());
        Ok(())
    }

    fn move_camera(&self, viewport: &Viewport, animated: bool) -> Result<()> {
        log::info!(
            "move_camera to {:.4}, {:.4} radius {} (animated: {})",
            viewport.center().lat,
            viewport.center().lng,
            viewport.radius(),
            animated
        );
        Ok(())
    }
}

/// Drives a map surface without any UI
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("🗺️ mapsync headless example");
    println!("============================");

    let surface = MapSurface::builder(Arc::new(LoggingAdapter::default()))
        .with_profile(SyncProfile::Responsive)
        .with_fit_options(FitOptions::default().with_padding(0.2))
        .build()?;
    surface.attach().await;

    let cities = [
        ("Bern", LatLng::new(46.9484742, 7.4521749)),
        ("Zürich", LatLng::new(47.3744489, 8.5410422)),
        ("Luzern", LatLng::new(47.050480, 8.306350)),
        ("Zug", LatLng::new(47.172420, 8.517450)),
    ];
    let pins: Vec<PinRef> = cities
        .iter()
        .map(|(name, location)| Pin::new(*name).at(*location).into_ref())
        .collect();

    let report = surface.set_pins(pins.clone()).await;
    println!("\n📍 Pins: {report:?}");

    if let Some(viewport) = surface.fit_to_pins() {
        println!(
            "🎯 Fitted {:.4}, {:.4} with radius {}",
            viewport.center().lat,
            viewport.center().lng,
            viewport.radius()
        );
    }

    // The native camera reports a few intermediate positions, then settles
    for step in 1..=3 {
        let center = LatLng::new(47.1 + step as f64 * 0.001, 8.0);
        surface.on_camera_idle(surface.viewport().with_center(center));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("🔭 Viewport after camera idle: {:?}", surface.viewport().center());

    let tapped = pins[1]
        .native_handle()
        .ok_or_else(|| anyhow!("pin was not added"))?;
    surface.on_marker_tapped(tapped);

    pins[0].set_label("Bern (Bundesplatz)");
    pins[0].refresh().await.map_err(|e| anyhow!(e))?;

    let report = surface.set_pins(pins[1..].to_vec()).await;
    println!("📍 After removing Bern: {report:?}");

    println!("\n📨 Events:");
    for event in surface.events().try_iter() {
        println!("   {}", event.name());
    }

    surface.detach();
    println!("\n✅ Detached");
    Ok(())
}
