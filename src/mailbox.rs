use std::sync::Arc;

use image::DynamicImage;
use parking_lot::Mutex;

/// Single-slot, last-write-wins mailbox.
///
/// Writers replace the slot, readers clone what is there. The lock is held only for the swap
/// or the clone, so a reader sees either the value before or after a concurrent store, never
/// a partial one. Superseded values are dropped, not queued.
#[derive(Debug)]
pub struct LatestSlot<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> LatestSlot<T> {
    pub fn new() -> LatestSlot<T> {
        Self::default()
    }

    /// Returns the value that was replaced.
    pub fn store(&self, value: T) -> Option<T> {
        self.slot.lock().replace(value)
    }

    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl<T: Clone> LatestSlot<T> {
    pub fn latest(&self) -> Option<T> {
        self.slot.lock().clone()
    }
}

/// Latest compressed camera frame and the last payload that decoded successfully.
///
/// Decoding happens outside the lock. A payload that fails to decode is logged and the
/// previous image stays current.
#[derive(Debug, Default)]
pub struct FrameSlot {
    compressed: LatestSlot<Arc<Vec<u8>>>,
    decoded: LatestSlot<Arc<DynamicImage>>,
}

impl FrameSlot {
    pub fn new() -> FrameSlot {
        Self::default()
    }

    pub fn store(&self, payload: Vec<u8>) {
        self.compressed.store(Arc::new(payload));
    }

    pub fn has_frame(&self) -> bool {
        !self.compressed.is_empty()
    }

    /// Decodes the newest payload. `None` until a frame has decoded at least once.
    pub fn decode_latest(&self) -> Option<Arc<DynamicImage>> {
        let Some(payload) = self.compressed.latest() else {
            log::debug!("waiting for first image");
            return self.decoded.latest();
        };
        match image::load_from_memory(&payload) {
            Ok(img) => {
                let img = Arc::new(img);
                self.decoded.store(img.clone());
                Some(img)
            }
            Err(e) => {
                log::warn!("cannot decode image: {}", e);
                self.decoded.latest()
            }
        }
    }
}
