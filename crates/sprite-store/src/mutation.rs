use sprite_interp::{Angle, Channel, ChannelOptions, Location, OpacityChannel};
use sprite_math::Anchor;

use crate::key::SpriteHandle;
use crate::origin::{validate_origins, OriginError};
use crate::state::{BorderSpec, ImageMode, ImageState, LeaderLineSpec, OffsetChannels, OriginLocation, SpriteState};
use crate::store::SpriteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationError {
    Duplicate,
    InvalidOrigin(OriginError),
}

impl From<OriginError> for MutationError {
    fn from(error: OriginError) -> Self {
        MutationError::InvalidOrigin(error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageInit {
    pub sub_layer: u32,
    pub order: u32,
    pub image_id: String,
    pub mode: ImageMode,
    pub anchor: Anchor,
    pub scale: f32,
    pub opacity: f32,
    pub rotate_deg: f32,
    pub auto_rotation: bool,
    pub auto_rotation_min_distance_meters: f32,
    pub offset_meters: f32,
    pub offset_deg: f32,
    pub border: Option<BorderSpec>,
    pub leader_line: Option<LeaderLineSpec>,
    pub origin_location: Option<OriginLocation>,
}

impl ImageInit {
    pub fn new(sub_layer: u32, order: u32, image_id: impl Into<String>) -> Self {
        Self {
            sub_layer,
            order,
            image_id: image_id.into(),
            mode: ImageMode::Billboard,
            anchor: Anchor::CENTER,
            scale: 1.0,
            opacity: 1.0,
            rotate_deg: 0.0,
            auto_rotation: false,
            auto_rotation_min_distance_meters: 0.0,
            offset_meters: 0.0,
            offset_deg: 0.0,
            border: None,
            leader_line: None,
            origin_location: None,
        }
    }

    fn build(self) -> ImageState {
        ImageState {
            sub_layer: self.sub_layer,
            order: self.order,
            image_id: self.image_id,
            image_handle: 0,
            mode: self.mode,
            anchor: self.anchor,
            scale: self.scale,
            opacity: OpacityChannel::new(self.opacity),
            border: self.border,
            leader_line: self.leader_line,
            rotate_deg: Channel::new(Angle(self.rotate_deg)),
            auto_rotation: self.auto_rotation,
            auto_rotation_min_distance_meters: self.auto_rotation_min_distance_meters,
            offset: OffsetChannels::new(self.offset_meters, self.offset_deg),
            origin_location: self.origin_location,
            interpolation_dirty: false,
            origin_render_target_index: None,
            hit_test_corners: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteInit {
    pub location: Location,
    pub enabled: bool,
    pub tag: Option<String>,
    pub visibility_distance_meters: Option<f32>,
    pub opacity_multiplier: f32,
    pub images: Vec<ImageInit>,
}

impl Default for SpriteInit {
    fn default() -> Self {
        Self {
            location: Location::new(0.0, 0.0),
            enabled: true,
            tag: None,
            visibility_distance_meters: None,
            opacity_multiplier: 1.0,
            images: Vec::new(),
        }
    }
}

/// Patch applied by `updateSprite`: every field is optional, `None` means
/// "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteUpdaterEntry {
    pub enabled: Option<bool>,
    pub tag: Option<Option<String>>,
    pub visibility_distance_meters: Option<Option<f32>>,
    pub opacity_multiplier: Option<f32>,
    pub location: Option<(Location, ChannelOptions)>,
}

impl SpriteStore {
    pub fn add_sprite(&mut self, id: impl Into<String>, init: SpriteInit) -> Result<SpriteHandle, MutationError> {
        let id = id.into();
        if self.contains_id(&id) {
            return Err(MutationError::Duplicate);
        }

        let mut scratch = SpriteState::new(SpriteHandle::default(), init.location);
        scratch.enabled = init.enabled;
        scratch.tag = init.tag.clone();
        scratch.visibility_distance_meters = init.visibility_distance_meters;
        scratch.opacity_multiplier = init.opacity_multiplier;
        for image_init in &init.images {
            scratch.insert_image(image_init.clone().build());
        }
        validate_origins(&scratch)?;

        let handle = self.insert(id, move |handle| {
            let mut sprite = scratch;
            sprite.handle = handle;
            sprite
        });
        Ok(handle)
    }

    /// Adds every item, stopping at the first failure; sprites already added
    /// in this call are rolled back so `addSprites` is all-or-nothing.
    pub fn add_sprites(&mut self, items: Vec<(String, SpriteInit)>) -> Result<usize, MutationError> {
        let mut added = Vec::with_capacity(items.len());
        for (id, init) in items {
            match self.add_sprite(id.clone(), init) {
                Ok(_) => added.push(id),
                Err(error) => {
                    for id in added {
                        self.remove(&id);
                    }
                    return Err(error);
                }
            }
        }
        Ok(added.len())
    }

    pub fn remove_sprite(&mut self, id: &str) -> bool {
        self.remove(id)
    }

    pub fn remove_sprites(&mut self, ids: &[String]) -> usize {
        ids.iter().filter(|id| self.remove(id)).count()
    }

    pub fn remove_all_sprites(&mut self) -> usize {
        self.remove_all()
    }

    pub fn add_sprite_image(&mut self, id: &str, init: ImageInit) -> Result<bool, MutationError> {
        let Some(sprite) = self.get_by_id_mut(id) else { return Ok(false) };
        if sprite.image(init.sub_layer, init.order).is_some() {
            return Ok(false);
        }
        let mut trial = sprite.clone();
        trial.insert_image(init.clone().build());
        validate_origins(&trial)?;

        let sprite = self.get_by_id_mut(id).expect("sprite present, checked above");
        sprite.insert_image(init.build());
        Ok(true)
    }

    pub fn remove_sprite_image(&mut self, id: &str, sub_layer: u32, order: u32) -> bool {
        let Some(sprite) = self.get_by_id_mut(id) else { return false };
        sprite.remove_image(sub_layer, order).is_some()
    }

    pub fn remove_all_sprite_images(&mut self, id: &str) -> usize {
        let Some(sprite) = self.get_by_id_mut(id) else { return 0 };
        let count = sprite.iter_images().count();
        sprite.images.clear();
        count
    }

    pub fn update_sprite_image(
        &mut self,
        id: &str,
        sub_layer: u32,
        order: u32,
        patch: impl FnOnce(&mut ImageState),
    ) -> bool {
        let Some(sprite) = self.get_by_id_mut(id) else { return false };
        let Some(image) = sprite.image_mut(sub_layer, order) else { return false };
        patch(image);
        true
    }

    /// Applying the same patch twice produces identical state both times,
    /// since every field write is an unconditional overwrite rather than a
    /// relative adjustment.
    pub fn update_sprite(&mut self, id: &str, patch: &SpriteUpdaterEntry) -> bool {
        let Some(sprite) = self.get_by_id_mut(id) else { return false };
        if let Some(enabled) = patch.enabled {
            sprite.enabled = enabled;
        }
        if let Some(tag) = &patch.tag {
            sprite.tag = tag.clone();
        }
        if let Some(distance) = patch.visibility_distance_meters {
            sprite.visibility_distance_meters = distance;
        }
        if let Some(multiplier) = patch.opacity_multiplier {
            sprite.opacity_multiplier = multiplier;
        }
        if let Some((location, options)) = patch.location {
            sprite.location.commit(location, options);
        }
        true
    }

    /// Reconciles `source_items` against the store: `decide` returns `Add`
    /// to create a sprite that doesn't yet exist, `Modify` to patch one that
    /// does (writing into the reused `SpriteUpdaterEntry`), or `Remove` to
    /// delete it. The same `SpriteUpdaterEntry` is reused across items to
    /// avoid a per-item allocation.
    pub fn mutate_sprites<I>(
        &mut self,
        source_items: impl IntoIterator<Item = (String, I)>,
        mut decide: impl FnMut(&str, &I, bool, &mut SpriteUpdaterEntry) -> MutateDecision,
    ) -> usize {
        let mut updater = SpriteUpdaterEntry::default();
        let mut applied = 0;
        for (id, item) in source_items {
            let exists = self.contains_id(&id);
            updater = SpriteUpdaterEntry::default();
            match decide(&id, &item, exists, &mut updater) {
                MutateDecision::Skip => {}
                MutateDecision::Add(init) => {
                    if self.add_sprite(id, init).is_ok() {
                        applied += 1;
                    }
                }
                MutateDecision::Modify => {
                    if self.update_sprite(&id, &updater) {
                        applied += 1;
                    }
                }
                MutateDecision::Remove => {
                    if self.remove(&id) {
                        applied += 1;
                    }
                }
            }
        }
        applied
    }

    pub fn update_for_each(&mut self, mut cb: impl FnMut(&mut SpriteState)) {
        for (_, sprite) in self.iter_mut() {
            cb(sprite);
        }
    }
}

pub enum MutateDecision {
    Skip,
    Add(SpriteInit),
    Modify,
    Remove,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sprite_rejects_duplicate_id() {
        let mut store = SpriteStore::new();
        store.add_sprite("a", SpriteInit::default()).unwrap();
        let err = store.add_sprite("a", SpriteInit::default()).unwrap_err();
        assert_eq!(err, MutationError::Duplicate);
    }

    #[test]
    fn add_sprite_rejects_origin_cycle_and_stores_nothing() {
        let mut store = SpriteStore::new();
        let init = SpriteInit {
            images: vec![
                ImageInit { origin_location: Some(OriginLocation { sub_layer: 0, order: 1, use_resolved_anchor: false }), ..ImageInit::new(0, 0, "a") },
                ImageInit { origin_location: Some(OriginLocation { sub_layer: 0, order: 0, use_resolved_anchor: false }), ..ImageInit::new(0, 1, "b") },
            ],
            ..SpriteInit::default()
        };
        let err = store.add_sprite("s1", init).unwrap_err();
        assert!(matches!(err, MutationError::InvalidOrigin(_)));
        assert!(!store.contains_id("s1"));
    }

    #[test]
    fn update_sprite_is_idempotent() {
        let mut store = SpriteStore::new();
        store.add_sprite("a", SpriteInit::default()).unwrap();
        let patch = SpriteUpdaterEntry { opacity_multiplier: Some(0.5), ..SpriteUpdaterEntry::default() };
        store.update_sprite("a", &patch);
        let after_first = store.get_by_id("a").unwrap().clone();
        store.update_sprite("a", &patch);
        let after_second = store.get_by_id("a").unwrap().clone();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn add_sprite_image_rejects_duplicate_slot() {
        let mut store = SpriteStore::new();
        store.add_sprite("a", SpriteInit { images: vec![ImageInit::new(0, 0, "x")], ..SpriteInit::default() }).unwrap();
        let added = store.add_sprite_image("a", ImageInit::new(0, 0, "y")).unwrap();
        assert!(!added);
    }

    #[test]
    fn remove_sprite_image_then_remove_all_counts_remaining() {
        let mut store = SpriteStore::new();
        store
            .add_sprite(
                "a",
                SpriteInit {
                    images: vec![ImageInit::new(0, 0, "x"), ImageInit::new(0, 1, "y")],
                    ..SpriteInit::default()
                },
            )
            .unwrap();
        assert!(store.remove_sprite_image("a", 0, 0));
        assert_eq!(store.remove_all_sprite_images("a"), 1);
    }
}
