use crate::{
    prelude::HashMap,
    traits::{ImageLoader, ImageRef},
    MapError,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Abstract description of a marker image; used as the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageDescriptor {
    /// Image file on the local file system
    File(String),
    /// Remote image
    Uri(String),
    /// Image bundled with the application, by resource name
    Resource(String),
}

type LoadFuture = Shared<BoxFuture<'static, std::result::Result<ImageRef, String>>>;

enum Slot {
    Ready(ImageRef),
    Loading(LoadFuture),
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<ImageDescriptor, Slot>,
    /// Bumped by `clear`; loads started under an older generation are not stored
    generation: u64,
}

/// Async keyed image cache.
///
/// Each distinct descriptor is loaded at most once at a time: concurrent
/// `get`s for the same unresolved descriptor await the same load. Failed
/// loads leave no entry behind, so the next `get` retries.
pub struct ImageCache {
    loader: Arc<dyn ImageLoader>,
    state: Arc<Mutex<CacheState>>,
}

impl ImageCache {
    pub fn new(loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            loader,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Returns the decoded image for `descriptor`, loading it on first use
    pub async fn get(&self, descriptor: &ImageDescriptor) -> crate::Result<ImageRef> {
        let (load, generation) = {
            let mut state = self.lock()?;
            let generation = state.generation;
            match state.slots.get(descriptor) {
                Some(Slot::Ready(image)) => return Ok(image.clone()),
                Some(Slot::Loading(load)) => (load.clone(), generation),
                None => {
                    let load = self.start_load(descriptor.clone());
                    state
                        .slots
                        .insert(descriptor.clone(), Slot::Loading(load.clone()));
                    (load, generation)
                }
            }
        };

        let result = load.await;

        let mut state = self.lock()?;
        if state.generation == generation {
            let still_loading = matches!(state.slots.get(descriptor), Some(Slot::Loading(_)));
            if still_loading {
                match &result {
                    Ok(image) => {
                        state
                            .slots
                            .insert(descriptor.clone(), Slot::Ready(image.clone()));
                    }
                    Err(_) => {
                        state.slots.remove(descriptor);
                    }
                }
            }
        } else {
            log::debug!("Image cache cleared while loading {:?}; not storing", descriptor);
        }

        result.map_err(|message| MapError::ImageLoad(message).into())
    }

    fn start_load(&self, descriptor: ImageDescriptor) -> LoadFuture {
        let loader = self.loader.clone();
        async move {
            loader
                .load_image(&descriptor)
                .await
                .map_err(|e| format!("{descriptor:?}: {e}"))
        }
        .boxed()
        .shared()
    }

    /// Disposes every cached image and empties the cache.
    ///
    /// Loads still in flight complete for their callers but are not stored.
    pub fn clear(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.generation += 1;
        for (_, slot) in state.slots.drain() {
            if let Slot::Ready(image) = slot {
                image.dispose();
            }
        }
    }

    /// Number of resolved images currently held
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| {
                state
                    .slots
                    .values()
                    .filter(|slot| matches!(slot, Slot::Ready(_)))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, descriptor: &ImageDescriptor) -> bool {
        self.state
            .lock()
            .map(|state| matches!(state.slots.get(descriptor), Some(Slot::Ready(_))))
            .unwrap_or(false)
    }

    fn lock(&self) -> std::result::Result<std::sync::MutexGuard<'_, CacheState>, MapError> {
        self.state
            .lock()
            .map_err(|_| MapError::ImageLoad("image cache lock poisoned".to_string()))
    }
}

impl Clone for ImageCache {
    fn clone(&self) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
            state: Arc::clone(&self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NativeImage;
    use async_trait::async_trait;
    use std::any::Any;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    struct TestImage {
        id: usize,
        disposed: AtomicBool,
    }

    impl NativeImage for TestImage {
        fn dispose(&self) {
            self.disposed.store(true, Ordering::SeqCst);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
        fail_first: AtomicBool,
    }

    #[async_trait]
    impl ImageLoader for CountingLoader {
        async fn load_image(&self, _descriptor: &ImageDescriptor) -> crate::Result<ImageRef> {
            let id = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.fail_first.swap(false, Ordering::SeqCst) {
                return Err("decode failed".into());
            }
            Ok(Arc::new(TestImage {
                id,
                disposed: AtomicBool::new(false),
            }))
        }
    }

    fn image_id(image: &ImageRef) -> usize {
        image.as_any().downcast_ref::<TestImage>().unwrap().id
    }

    fn descriptor() -> ImageDescriptor {
        ImageDescriptor::Resource("pin.png".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_loads_once_then_hits_cache() {
        let loader = Arc::new(CountingLoader::default());
        let cache = ImageCache::new(loader.clone());

        let first = cache.get(&descriptor()).await.unwrap();
        let second = cache.get(&descriptor()).await.unwrap();

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(image_id(&first), 1);
        assert_eq!(image_id(&second), 1);
        assert!(cache.contains(&descriptor()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_gets_are_coalesced() {
        let loader = Arc::new(CountingLoader::default());
        let cache = ImageCache::new(loader.clone());
        let d = descriptor();

        let (a, b, c) = tokio::join!(cache.get(&d), cache.get(&d), cache.get(&d));

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(image_id(&a.unwrap()), 1);
        assert_eq!(image_id(&b.unwrap()), 1);
        assert_eq!(image_id(&c.unwrap()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_is_retried() {
        let loader = Arc::new(CountingLoader::default());
        loader.fail_first.store(true, Ordering::SeqCst);
        let cache = ImageCache::new(loader.clone());

        assert!(cache.get(&descriptor()).await.is_err());
        assert!(!cache.contains(&descriptor()));

        let image = cache.get(&descriptor()).await.unwrap();
        assert_eq!(image_id(&image), 2);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_disposes_images() {
        let loader = Arc::new(CountingLoader::default());
        let cache = ImageCache::new(loader.clone());

        let image = cache.get(&descriptor()).await.unwrap();
        assert_eq!(cache.len(), 1);

        cache.clear();

        assert!(cache.is_empty());
        let image = image.as_any().downcast_ref::<TestImage>().unwrap();
        assert!(image.disposed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_during_load_does_not_store() {
        let loader = Arc::new(CountingLoader::default());
        let cache = ImageCache::new(loader.clone());
        let d = descriptor();

        let background = cache.clone();
        let pending = tokio::spawn(async move { background.get(&descriptor()).await });
        tokio::task::yield_now().await;

        cache.clear();
        let image = pending.await.unwrap().unwrap();

        assert_eq!(image_id(&image), 1);
        assert!(!cache.contains(&d));
    }
}
