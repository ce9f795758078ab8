use sprite_store::{RenderTargetEntry, SpriteHandle, SpriteStore};

use crate::entry::HitTestEntry;

/// Owns the frame's hit-test entries and answers point queries. Rebuilt
/// wholesale every frame from the render targets' hit-test corners.
#[derive(Default)]
pub struct HitTestController {
    entries: Vec<HitTestEntry>,
    enabled: bool,
}

impl HitTestController {
    pub fn new() -> Self {
        Self { entries: Vec::new(), enabled: true }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn register_hit_test_entry(&mut self, sprite: SpriteHandle, sub_layer: u32, order: u32, corners: [(f32, f32); 4], draw_order: u64) {
        self.remove_entry(sprite, sub_layer, order);
        self.entries.push(HitTestEntry { sprite, sub_layer, order, corners, draw_order });
    }

    pub fn remove_image_bounds(&mut self, sprite: SpriteHandle, sub_layer: u32, order: u32) {
        self.remove_entry(sprite, sub_layer, order);
    }

    fn remove_entry(&mut self, sprite: SpriteHandle, sub_layer: u32, order: u32) {
        self.entries.retain(|entry| !(entry.sprite == sprite && entry.sub_layer == sub_layer && entry.order == order));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuilds entries from the store's `hitTestCorners` buffers, using each
    /// entry's position in `render_targets` as `drawOrder`: later entries in
    /// the render-target vector draw (and hit-test) on top, equivalent to
    /// scanning the vector in reverse to resolve the topmost hit.
    pub fn rebuild(&mut self, store: &SpriteStore, render_targets: &[RenderTargetEntry]) {
        self.clear();
        for (index, entry) in render_targets.iter().enumerate() {
            let Some(sprite) = store.get(entry.sprite) else { continue };
            let Some(image) = sprite.image(entry.sub_layer, entry.order) else { continue };
            let Some(corners) = image.hit_test_corners else { continue };
            self.register_hit_test_entry(entry.sprite, entry.sub_layer, entry.order, corners, index as u64);
        }
    }

    /// `resolveHitTestResult`'s core: the top-most entry (largest `drawOrder`)
    /// whose quad contains `point`, or `None` when disabled or unhit.
    pub fn resolve(&self, point: (f32, f32)) -> Option<&HitTestEntry> {
        if !self.enabled {
            return None;
        }
        self.entries.iter().rev().find(|entry| entry.contains_point(point))
    }
}
