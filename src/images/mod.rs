//! Marker images, resolved once per descriptor

pub mod cache;

pub use cache::{ImageCache, ImageDescriptor};
