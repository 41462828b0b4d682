//! Shared trait abstractions at the native boundary
//!
//! The core never branches on platform: each platform provides one
//! [`NativeMapAdapter`] and one [`ImageLoader`], and everything else in the
//! crate talks to those two traits only.

use crate::{
    core::{handles::NativeHandle, viewport::Viewport},
    images::cache::ImageDescriptor,
    layers::{marker::MarkerOptions, vector::MapElement},
    Result,
};
use async_trait::async_trait;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// A decoded, platform-native image (bitmap descriptor, UIImage, texture...)
pub trait NativeImage: Any + Send + Sync + Debug {
    /// Releases the native resources behind the image
    fn dispose(&self) {}

    /// Allows adapters to recover their concrete image type
    fn as_any(&self) -> &dyn Any;
}

/// Shared, reference-counted handle to a native image
pub type ImageRef = Arc<dyn NativeImage>;

/// Platform image loader, consumed only through the image cache
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load_image(&self, descriptor: &ImageDescriptor) -> Result<ImageRef>;
}

/// The platform map widget, as seen by the synchronization core.
///
/// Every call is made from the owner side of the surface and is expected to
/// return promptly; camera moves are fire-and-forget.
pub trait NativeMapAdapter: Send + Sync {
    /// Adds a marker and returns its native handle
    fn add_marker(&self, marker: &MarkerOptions, icon: Option<ImageRef>) -> Result<NativeHandle>;

    fn remove_marker(&self, handle: NativeHandle) -> Result<()>;

    /// Restyles an existing marker in place
    fn update_marker(
        &self,
        handle: NativeHandle,
        marker: &MarkerOptions,
        icon: Option<ImageRef>,
    ) -> Result<()>;

    fn add_shape(&self, element: &MapElement) -> Result<NativeHandle>;

    fn remove_shape(&self, handle: NativeHandle) -> Result<()>;

    fn update_shape(&self, handle: NativeHandle, element: &MapElement) -> Result<()>;

    /// Moves the camera so that `viewport` is visible
    fn move_camera(&self, viewport: &Viewport, animated: bool) -> Result<()>;
}

/// Declarative items that can be bound to a native handle.
///
/// Only the reconciler writes the handle; everything else reads it.
///
/// ```compile_fail
/// use mapsync::prelude::*;
///
/// let pin = Pin::new("a").into_ref();
/// pin.set_native_handle(Some(NativeHandle(1)));
/// ```
pub trait NativeBacked: sealed::HandleSlot + Send + Sync {
    fn native_handle(&self) -> Option<NativeHandle>;
}

pub(crate) mod sealed {
    use crate::core::handles::NativeHandle;

    /// Write side of [`super::NativeBacked`]; not nameable outside the crate
    pub trait HandleSlot {
        fn set_native_handle(&self, handle: Option<NativeHandle>);
    }
}
