use std::collections::HashMap;

use log::warn;

use crate::key::{ImageHandle, PageGenerationId, PageKey, PageSlotId};
use crate::packer::ShelfPacker;
use crate::registry::UvRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasManagerError {
    ResourceExhaustion,
}

/// Generation-checked free-list allocator for page slots, after
/// `atlas::backend::FreeSlotPool`/`Backend`: reusing a freed page's slot index
/// bumps its generation so a stale `PageKey` referencing the old page is
/// rejected rather than silently aliasing the new one.
struct PageSlotPool {
    next_slot: u32,
    freelist: Vec<PageSlotId>,
    generations: Vec<u32>,
}

impl PageSlotPool {
    fn new() -> Self {
        Self { next_slot: 0, freelist: Vec::new(), generations: Vec::new() }
    }

    fn alloc(&mut self) -> PageKey {
        if let Some(slot) = self.freelist.pop() {
            let generation = self.generations[slot.raw() as usize];
            return PageKey::new(PageGenerationId::new(generation), slot);
        }
        let slot = PageSlotId::new(self.next_slot);
        self.next_slot = self.next_slot.checked_add(1).expect("page slot space exhausted");
        self.generations.push(0);
        PageKey::new(PageGenerationId::new(0), slot)
    }

    fn free(&mut self, key: PageKey) {
        let index = key.slot().raw() as usize;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.freelist.push(key.slot());
    }
}

struct Page {
    key: PageKey,
    packer: ShelfPacker,
    occupants: u32,
    needs_upload: bool,
}

/// One or more fixed-size atlas pages, a shelf-packed placement table, and
/// the notification contract ("after any upsert/remove that changes
/// placements, observers must be notified").
///
/// `pages` is indexed by `PageSlotId`, not by insertion order: a page
/// destroyed by `remove` leaves its slot `None` so every other page's index
/// (and every `placements` entry pointing at it) stays stable, and the slot
/// pool hands that same index back out on the next allocation.
pub struct AtlasManager {
    page_width: u32,
    page_height: u32,
    max_pages: usize,
    pool: PageSlotPool,
    pages: Vec<Option<Page>>,
    placements: HashMap<ImageHandle, (usize, UvRect)>,
}

impl AtlasManager {
    pub fn new(page_width: u32, page_height: u32, max_pages: usize) -> Self {
        Self {
            page_width,
            page_height,
            max_pages,
            pool: PageSlotPool::new(),
            pages: Vec::new(),
            placements: HashMap::new(),
        }
    }

    pub fn placement(&self, handle: ImageHandle) -> Option<(i32, UvRect)> {
        self.placements.get(&handle).map(|(page_index, uv)| (*page_index as i32, *uv))
    }

    pub fn page_needs_upload(&self, page_index: usize) -> bool {
        self.pages.get(page_index).and_then(Option::as_ref).is_some_and(|page| page.needs_upload)
    }

    pub fn clear_upload_flag(&mut self, page_index: usize) {
        if let Some(Some(page)) = self.pages.get_mut(page_index) {
            page.needs_upload = false;
        }
    }

    /// Places `handle`'s bitmap. Tries existing pages first, then allocates a
    /// new page. `ResourceExhaustion` is logged and returned when `max_pages`
    /// is already reached and no existing page has room — the image stays
    /// unplaced (`atlas_page_index = NONE`) and is retried on a later upsert,
    /// never panics the render loop.
    pub fn upsert(&mut self, handle: ImageHandle, width: u32, height: u32) -> Result<(i32, UvRect), AtlasManagerError> {
        self.remove(handle);

        for (page_index, slot) in self.pages.iter_mut().enumerate() {
            let Some(page) = slot else { continue };
            if let Some((x, y)) = page.packer.pack(width, height) {
                page.occupants += 1;
                page.needs_upload = true;
                let uv = pixel_rect_to_uv(x, y, width, height, self.page_width, self.page_height);
                self.placements.insert(handle, (page_index, uv));
                return Ok((page_index as i32, uv));
            }
        }

        if self.page_count() >= self.max_pages {
            warn!("sprite-atlas: resource exhaustion, cannot allocate page {} of {}", self.page_count(), self.max_pages);
            return Err(AtlasManagerError::ResourceExhaustion);
        }

        let key = self.pool.alloc();
        let mut packer = ShelfPacker::new(self.page_width, self.page_height);
        let Some((x, y)) = packer.pack(width, height) else {
            self.pool.free(key);
            warn!("sprite-atlas: image {}x{} does not fit an empty page {}x{}", width, height, self.page_width, self.page_height);
            return Err(AtlasManagerError::ResourceExhaustion);
        };
        let page_index = key.slot().raw() as usize;
        let page = Some(Page { key, packer, occupants: 1, needs_upload: true });
        if page_index == self.pages.len() {
            self.pages.push(page);
        } else {
            self.pages[page_index] = page;
        }
        let uv = pixel_rect_to_uv(x, y, width, height, self.page_width, self.page_height);
        self.placements.insert(handle, (page_index, uv));
        Ok((page_index as i32, uv))
    }

    /// Removes `handle`'s placement. Destroys the page it vacated when that
    /// page becomes empty, freeing its slot back to the pool so a later
    /// `upsert` can reuse the same index.
    pub fn remove(&mut self, handle: ImageHandle) {
        let Some((page_index, _)) = self.placements.remove(&handle) else { return };
        let Some(slot) = self.pages.get_mut(page_index) else { return };
        let Some(page) = slot else { return };
        page.occupants = page.occupants.saturating_sub(1);
        if page.occupants == 0 {
            let key = page.key;
            *slot = None;
            self.pool.free(key);
        }
    }

    pub fn clear(&mut self) {
        for page in self.pages.drain(..).flatten() {
            self.pool.free(page.key);
        }
        self.placements.clear();
    }

    /// Number of pages currently allocated (destroyed slots don't count).
    pub fn page_count(&self) -> usize {
        self.pages.iter().filter(|page| page.is_some()).count()
    }
}

fn pixel_rect_to_uv(x: u32, y: u32, width: u32, height: u32, page_width: u32, page_height: u32) -> UvRect {
    UvRect {
        u0: x as f32 / page_width as f32,
        v0: y as f32 / page_height as f32,
        u1: (x + width) as f32 / page_width as f32,
        v1: (y + height) as f32 / page_height as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_two_bitmaps_on_one_page_without_overlap() {
        let mut manager = AtlasManager::new(256, 256, 4);
        let a = ImageHandle::new(1);
        let b = ImageHandle::new(2);

        let (page_a, uv_a) = manager.upsert(a, 32, 32).unwrap();
        let (page_b, uv_b) = manager.upsert(b, 64, 16).unwrap();

        assert_eq!(page_a, 0);
        assert_eq!(page_b, 0);
        assert!(uv_a.u1 <= uv_b.u0 || uv_b.u1 <= uv_a.u0 || uv_a.v1 <= uv_b.v0 || uv_b.v1 <= uv_a.v0);
    }

    #[test]
    fn remove_frees_the_handle_and_destroys_the_emptied_page() {
        let mut manager = AtlasManager::new(256, 256, 4);
        let a = ImageHandle::new(1);
        manager.upsert(a, 32, 32).unwrap();
        manager.remove(a);
        assert!(manager.placement(a).is_none());
        assert_eq!(manager.page_count(), 0);
    }

    #[test]
    fn destroyed_page_slot_is_reused_by_the_next_upsert() {
        let mut manager = AtlasManager::new(8, 8, 1);
        let a = ImageHandle::new(1);
        let b = ImageHandle::new(2);
        let (page_a, _) = manager.upsert(a, 8, 8).unwrap();
        manager.remove(a);
        let (page_b, _) = manager.upsert(b, 8, 8).unwrap();
        assert_eq!(page_a, page_b);
        assert_eq!(manager.page_count(), 1);
    }

    #[test]
    fn remove_without_emptying_a_shared_page_keeps_it_allocated() {
        let mut manager = AtlasManager::new(256, 256, 4);
        let a = ImageHandle::new(1);
        let b = ImageHandle::new(2);
        manager.upsert(a, 32, 32).unwrap();
        manager.upsert(b, 32, 32).unwrap();
        manager.remove(a);
        assert!(manager.placement(a).is_none());
        assert!(manager.placement(b).is_some());
        assert_eq!(manager.page_count(), 1);
    }

    #[test]
    fn exhausting_max_pages_returns_resource_exhaustion() {
        let mut manager = AtlasManager::new(8, 8, 1);
        let a = ImageHandle::new(1);
        let b = ImageHandle::new(2);
        manager.upsert(a, 8, 8).unwrap();
        let err = manager.upsert(b, 8, 8).unwrap_err();
        assert_eq!(err, AtlasManagerError::ResourceExhaustion);
    }

    #[test]
    fn clear_frees_all_pages_and_placements() {
        let mut manager = AtlasManager::new(256, 256, 4);
        let a = ImageHandle::new(1);
        manager.upsert(a, 32, 32).unwrap();
        manager.clear();
        assert_eq!(manager.page_count(), 0);
        assert!(manager.placement(a).is_none());
    }
}
