use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::key::{OriginKey, SpriteHandle};
use crate::store::SpriteStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargetEntry {
    pub sprite: SpriteHandle,
    pub sub_layer: u32,
    pub order: u32,
    pub image_id: String,
}

/// The single ordered `(sprite, image)` vector every frame draws from,
/// rebuilt lazily behind a dirty flag after `document::Document`'s
/// `render_tree_cache`/`render_tree_cache_dirty` pattern: cheap repeated
/// reads between mutation bursts, one rebuild per burst.
#[derive(Default)]
pub struct RenderTargetCache {
    cache: RefCell<Rc<Vec<RenderTargetEntry>>>,
    dirty: Cell<bool>,
}

impl RenderTargetCache {
    pub fn new() -> Self {
        Self { cache: RefCell::new(Rc::new(Vec::new())), dirty: Cell::new(true) }
    }

    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    /// Returns the current render-target vector, rebuilding it first if any
    /// mutation has happened since the last build (sorted by `(subLayer asc,
    /// order asc, imageId asc)`). Rebuilding also resolves each entry's
    /// `originRenderTargetIndex` back into its `ImageState`, hence the
    /// mutable borrow of `store`.
    pub fn snapshot(&self, store: &mut SpriteStore) -> Rc<Vec<RenderTargetEntry>> {
        if self.dirty.get() {
            let rebuilt = build_render_targets(store);
            *self.cache.borrow_mut() = Rc::new(rebuilt);
            self.dirty.set(false);
        }
        Rc::clone(&self.cache.borrow())
    }
}

fn build_render_targets(store: &mut SpriteStore) -> Vec<RenderTargetEntry> {
    let mut entries = Vec::new();
    for (handle, sprite) in store.iter() {
        if !sprite.enabled {
            continue;
        }
        for image in sprite.iter_images() {
            if image.image_id.is_empty() {
                continue;
            }
            let has_lod = sprite.visibility_distance_meters.is_some();
            let rendered_opacity = image.opacity.rendered(sprite.opacity_multiplier);
            if rendered_opacity <= 0.0 && !image.has_active_interpolation() && !has_lod {
                continue;
            }
            entries.push(RenderTargetEntry {
                sprite: handle,
                sub_layer: image.sub_layer,
                order: image.order,
                image_id: image.image_id.clone(),
            });
        }
    }

    entries.sort_by(|a, b| {
        (a.sub_layer, a.order, &a.image_id).cmp(&(b.sub_layer, b.order, &b.image_id))
    });

    resolve_origin_indices(store, &entries);
    entries
}

/// Resolves each entry's origin reference to the referent's index in the
/// same vector, or leaves it unresolved (`NONE`) if the referent was culled.
fn resolve_origin_indices(store: &mut SpriteStore, entries: &[RenderTargetEntry]) {
    let mut index_by_key: HashMap<(SpriteHandle, OriginKey), usize> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        index_by_key.insert((entry.sprite, OriginKey::new(entry.sub_layer, entry.order)), index);
    }

    for entry in entries {
        let Some(sprite) = store.get_mut(entry.sprite) else { continue };
        let Some(image) = sprite.image(entry.sub_layer, entry.order) else { continue };
        let origin_key = image.origin_key();
        let resolved = if origin_key.is_none() {
            None
        } else {
            index_by_key.get(&(entry.sprite, origin_key)).copied()
        };
        if let Some(image) = sprite.image_mut(entry.sub_layer, entry.order) {
            image.origin_render_target_index = resolved;
        }
    }
}
