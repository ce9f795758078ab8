use std::collections::BTreeMap;

use sprite_interp::{Angle, Channel, Location, OpacityChannel};
use sprite_math::Anchor;

use crate::key::{OriginKey, SpriteHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    Surface,
    Billboard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OriginLocation {
    pub sub_layer: u32,
    pub order: u32,
    pub use_resolved_anchor: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderSpec {
    pub width_meters: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderLineSpec {
    pub max_width_px: f32,
    pub opacity: f32,
}

/// Offset channels: a radial distance in meters plus a bearing in degrees,
/// interpolated independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetChannels {
    pub meters: Channel<f32>,
    pub deg: Channel<Angle>,
}

impl OffsetChannels {
    pub fn new(meters: f32, deg: f32) -> Self {
        Self { meters: Channel::new(meters), deg: Channel::new(Angle(deg)) }
    }
}

/// One drawable image attached to a sprite at `(subLayer, order)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageState {
    pub sub_layer: u32,
    pub order: u32,
    pub image_id: String,
    /// 0 when the image id does not currently resolve to a registered handle;
    /// otherwise mirrors whatever the image registry assigns.
    pub image_handle: u32,
    pub mode: ImageMode,
    pub anchor: Anchor,
    pub scale: f32,
    pub opacity: OpacityChannel,
    pub border: Option<BorderSpec>,
    pub leader_line: Option<LeaderLineSpec>,
    pub rotate_deg: Channel<Angle>,
    pub auto_rotation: bool,
    pub auto_rotation_min_distance_meters: f32,
    pub offset: OffsetChannels,
    pub origin_location: Option<OriginLocation>,
    pub interpolation_dirty: bool,
    pub origin_render_target_index: Option<usize>,
    pub hit_test_corners: Option<[(f32, f32); 4]>,
}

impl ImageState {
    pub fn origin_key(&self) -> OriginKey {
        self.origin_location
            .map(|origin| OriginKey::new(origin.sub_layer, origin.order))
            .unwrap_or(OriginKey::NONE)
    }

    pub fn own_key(&self) -> OriginKey {
        OriginKey::new(self.sub_layer, self.order)
    }

    /// Final rendered opacity is clamped but always recomputed from the
    /// channel's current base value; `false` here never mutates interpolation
    /// state.
    pub fn has_active_interpolation(&self) -> bool {
        self.opacity.is_active()
            || self.rotate_deg.is_active()
            || self.offset.meters.is_active()
            || self.offset.deg.is_active()
    }
}

/// Per-sprite state. Images are keyed by `subLayer -> order` so "exactly one
/// ImageState per (spriteId, subLayer, order)" is structural rather than an
/// invariant to check.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteState {
    pub handle: SpriteHandle,
    pub enabled: bool,
    pub tag: Option<String>,
    pub visibility_distance_meters: Option<f32>,
    pub opacity_multiplier: f32,
    pub location: Channel<Location>,
    pub current_auto_rotate_deg: f32,
    pub last_auto_rotation_location: Option<Location>,
    pub auto_rotation_invalidated: bool,
    pub interpolation_dirty: bool,
    pub images: BTreeMap<u32, BTreeMap<u32, ImageState>>,
    pub cached_mercator: Option<(f64, f64, f64)>,
}

impl SpriteState {
    pub fn new(handle: SpriteHandle, location: Location) -> Self {
        Self {
            handle,
            enabled: true,
            tag: None,
            visibility_distance_meters: None,
            opacity_multiplier: 1.0,
            location: Channel::new(location),
            current_auto_rotate_deg: 0.0,
            last_auto_rotation_location: None,
            auto_rotation_invalidated: true,
            interpolation_dirty: false,
            images: BTreeMap::new(),
            cached_mercator: None,
        }
    }

    pub fn image(&self, sub_layer: u32, order: u32) -> Option<&ImageState> {
        self.images.get(&sub_layer)?.get(&order)
    }

    pub fn image_mut(&mut self, sub_layer: u32, order: u32) -> Option<&mut ImageState> {
        self.images.get_mut(&sub_layer)?.get_mut(&order)
    }

    pub fn insert_image(&mut self, image: ImageState) -> bool {
        let sub_layer = self.images.entry(image.sub_layer).or_default();
        if sub_layer.contains_key(&image.order) {
            return false;
        }
        sub_layer.insert(image.order, image);
        true
    }

    pub fn remove_image(&mut self, sub_layer: u32, order: u32) -> Option<ImageState> {
        let removed = self.images.get_mut(&sub_layer)?.remove(&order);
        if self.images.get(&sub_layer).is_some_and(BTreeMap::is_empty) {
            self.images.remove(&sub_layer);
        }
        removed
    }

    pub fn iter_images(&self) -> impl Iterator<Item = &ImageState> {
        self.images.values().flat_map(BTreeMap::values)
    }

    pub fn iter_images_mut(&mut self) -> impl Iterator<Item = &mut ImageState> {
        self.images.values_mut().flat_map(BTreeMap::values_mut)
    }
}
