//! Map surface builder for fluent configuration
//!
//! The builder collects the adapter, the optional image loader and the sync
//! options, then hands back a detached [`MapSurface`].

use crate::{
    core::{
        config::{SyncOptions, SyncProfile},
        map::MapSurface,
        viewport::Viewport,
    },
    images::cache::ImageDescriptor,
    spatial::fit::FitOptions,
    traits::{ImageLoader, ImageRef, NativeMapAdapter},
    MapError, Result,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Loader used when none is configured; every pin gets the default marker
struct NoImageLoader;

#[async_trait]
impl ImageLoader for NoImageLoader {
    async fn load_image(&self, descriptor: &ImageDescriptor) -> Result<ImageRef> {
        Err(MapError::ImageLoad(format!("no image loader configured for {descriptor:?}")).into())
    }
}

/// Builder for creating and configuring map surfaces
pub struct MapSurfaceBuilder {
    adapter: Arc<dyn NativeMapAdapter>,
    loader: Option<Arc<dyn ImageLoader>>,
    profile: SyncProfile,
    initial_viewport: Option<Viewport>,
    readonly: Option<bool>,
    fit: Option<FitOptions>,
}

impl MapSurfaceBuilder {
    pub fn new(adapter: Arc<dyn NativeMapAdapter>) -> Self {
        Self {
            adapter,
            loader: None,
            profile: SyncProfile::default(),
            initial_viewport: None,
            readonly: None,
            fit: None,
        }
    }

    pub fn with_image_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the timing profile
    pub fn with_profile(mut self, profile: SyncProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set custom options; later `with_*` calls override individual fields
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.profile = SyncProfile::Custom(options);
        self
    }

    /// Region applied without animation on first attach
    pub fn with_initial_viewport(mut self, viewport: Viewport) -> Self {
        self.initial_viewport = Some(viewport);
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = Some(readonly);
        self
    }

    pub fn with_fit_options(mut self, fit: FitOptions) -> Self {
        self.fit = Some(fit);
        self
    }

    /// Resolves the final options without building
    pub fn options(&self) -> SyncOptions {
        let mut options = self.profile.resolve();
        if let Some(viewport) = self.initial_viewport {
            options.initial_viewport = Some(viewport);
        }
        if let Some(readonly) = self.readonly {
            options.readonly = readonly;
        }
        if let Some(fit) = self.fit {
            options.fit = fit;
        }
        options
    }

    /// Build the surface. It starts detached; call `attach` once the native widget is ready.
    pub fn build(self) -> std::result::Result<MapSurface, MapError> {
        let options = self.options();
        options.validate()?;

        let loader = self.loader.unwrap_or_else(|| Arc::new(NoImageLoader));
        let surface = MapSurface::new(self.adapter, loader, options);
        log::debug!("Built map surface {}", surface.id().raw());
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{geo::LatLng, handles::NativeHandle};
    use crate::layers::{marker::MarkerOptions, vector::MapElement};

    struct NullAdapter;

    impl NativeMapAdapter for NullAdapter {
        fn add_marker(&self, _: &MarkerOptions, _: Option<ImageRef>) -> Result<NativeHandle> {
            Ok(NativeHandle(1))
        }
        fn remove_marker(&self, _: NativeHandle) -> Result<()> {
            Ok(())
        }
        fn update_marker(&self, _: NativeHandle, _: &MarkerOptions, _: Option<ImageRef>) -> Result<()> {
            Ok(())
        }
        fn add_shape(&self, _: &MapElement) -> Result<NativeHandle> {
            Ok(NativeHandle(1))
        }
        fn remove_shape(&self, _: NativeHandle) -> Result<()> {
            Ok(())
        }
        fn update_shape(&self, _: NativeHandle, _: &MapElement) -> Result<()> {
            Ok(())
        }
        fn move_camera(&self, _: &Viewport, _: bool) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_builder_overrides_profile() {
        let viewport = Viewport::new(LatLng::new(47.0, 8.0), 1.0, 1.0);
        let builder = MapSurfaceBuilder::new(Arc::new(NullAdapter))
            .with_profile(SyncProfile::Smooth)
            .with_initial_viewport(viewport)
            .readonly(true);

        let options = builder.options();
        assert_eq!(options.camera, SyncProfile::Smooth.resolve().camera);
        assert_eq!(options.initial_viewport, Some(viewport));
        assert!(options.readonly);

        let surface = builder.build().unwrap();
        assert!(!surface.is_attached());
        assert_eq!(surface.viewport(), viewport);
    }

    #[test]
    fn test_build_rejects_invalid_viewport() {
        let result = MapSurfaceBuilder::new(Arc::new(NullAdapter))
            .with_initial_viewport(Viewport::new(LatLng::new(0.0, 500.0), 1.0, 1.0))
            .build();
        assert!(matches!(result, Err(MapError::InvalidCoordinates(_))));
    }

    #[test]
    fn test_default_surface_region() {
        let surface = MapSurfaceBuilder::new(Arc::new(NullAdapter)).build().unwrap();
        assert_eq!(surface.viewport(), Viewport::default());
        assert!(crate::core::registry::lookup(surface.id()).is_some());
    }
}
