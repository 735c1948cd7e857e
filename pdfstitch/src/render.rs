//! Page rendering seam and the thumbnail cache.
//!
//! Rasterising PDF pages is left to the embedding surface through
//! [`PageRenderer`]. This module only sizes and caches the results.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::model::{PageId, Rotation};

/// Rasterises a single PDF page.
pub trait PageRenderer {
    /// Render page `page_index` of `path`, turned clockwise by `rotation`,
    /// at `dpi`.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be rendered.
    fn render_page(
        &self,
        path: &Path,
        page_index: usize,
        rotation: Rotation,
        dpi: u32,
    ) -> Result<RgbaImage>;
}

/// Cache key for a rendered thumbnail.
///
/// Holds everything that changes the rendered pixels. A page that is
/// repointed at a reconverted file keeps its id, so the backing path is
/// part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey {
    pub id: PageId,
    pub path: PathBuf,
    pub rotation: Rotation,
    pub width: u32,
}

/// Rendered thumbnails keyed by page identity, backing file, rotation and
/// width.
///
/// Entries are never invalidated one by one; with a capacity set the
/// oldest entry is evicted first.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: HashMap<ThumbnailKey, Arc<RgbaImage>>,
    order: VecDeque<ThumbnailKey>,
    capacity: Option<usize>,
}

impl ThumbnailCache {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.filter(|&c| c > 0),
        }
    }

    pub fn get(&self, key: &ThumbnailKey) -> Option<Arc<RgbaImage>> {
        self.entries.get(key).cloned()
    }

    /// Store a thumbnail, evicting the oldest entries past capacity.
    pub fn insert(&mut self, key: ThumbnailKey, image: RgbaImage) -> Arc<RgbaImage> {
        let image = Arc::new(image);
        if self.entries.insert(key.clone(), Arc::clone(&image)).is_none() {
            self.order.push_back(key);
        }

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&oldest);
                debug!(id = %oldest.id, "evicted thumbnail");
            }
        }
        image
    }

    /// Cached thumbnail for `key`, rendering it with `render` on a miss.
    ///
    /// A failed render is not cached.
    pub fn get_or_insert_with<F>(&mut self, key: ThumbnailKey, render: F) -> Option<Arc<RgbaImage>>
    where
        F: FnOnce() -> Option<RgbaImage>,
    {
        if let Some(image) = self.get(&key) {
            return Some(image);
        }
        let image = render()?;
        Some(self.insert(key, image))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Scale `image` to fit inside `width x height` less `inset` pixels,
/// keeping its aspect ratio.
pub fn fit_thumbnail(image: &RgbaImage, width: u32, height: u32, inset: u32) -> RgbaImage {
    let max_w = width.saturating_sub(inset).max(1);
    let max_h = height.saturating_sub(inset).max(1);
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return image.clone();
    }

    let scale = (max_w as f32 / src_w as f32).min(max_h as f32 / src_h as f32);
    let new_w = ((src_w as f32 * scale).round() as u32).clamp(1, max_w);
    let new_h = ((src_h as f32 * scale).round() as u32).clamp(1, max_h);
    imageops::resize(image, new_w, new_h, FilterType::Lanczos3)
}
