use sprite_atlas::UvRect;
use sprite_interp::{Angle, ChannelOptions, Location, VirtualInstant};
use sprite_math::{ClipContext, LngLat, ZoomScaleOptions};
use sprite_store::{ImageMode, RenderTargetEntry, SpriteState, SpriteStore};

use crate::depth_bias::apply_depth_bias;
use crate::placement::{billboard_corners, clamped_billboard_half_extents, surface_corner_locations};
use crate::vertex::FrameBatches;

/// One registered image's current atlas placement and natural pixel size,
/// resolved by the host through `sprite-atlas` before the frame is computed,
/// so frame computation takes placements as an input rather than reaching
/// into the atlas itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub page_index: i32,
    pub uv: UvRect,
    pub width_px: u32,
    pub height_px: u32,
}

pub trait AtlasPlacementLookup {
    fn placement(&self, image_id: &str) -> Option<ImagePlacement>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingOptions {
    pub sprite_min_pixel: f32,
    pub sprite_max_pixel: f32,
    pub zoom_scale: ZoomScaleOptions,
}

impl Default for ScalingOptions {
    fn default() -> Self {
        Self {
            sprite_min_pixel: 1.0,
            sprite_max_pixel: f32::MAX,
            zoom_scale: ZoomScaleOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    pub zoom: f32,
    pub now: VirtualInstant,
    pub scaling: ScalingOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub has_active_interpolation: bool,
    pub drawn_quads: usize,
    pub skipped_unplaced: usize,
    pub skipped_projection: usize,
}

/// Called once per host render tick: advances interpolation, resolves
/// auto-rotation, projects and places every entry in `render_targets`, and
/// emits the frame's vertex batches and hit-test corners.
pub fn compute_frame(
    store: &mut SpriteStore,
    render_targets: &[RenderTargetEntry],
    placements: &dyn AtlasPlacementLookup,
    clip_context: &ClipContext,
    inputs: &FrameInputs,
) -> (FrameBatches, FrameStats) {
    let mut stats = FrameStats::default();
    stats.has_active_interpolation = advance_all_channels(store, inputs.now);
    step_auto_rotation_for_every_sprite(store);

    let mut batches = FrameBatches::default();
    let mut computed_centers: Vec<Option<ComputedCenter>> = vec![None; render_targets.len()];

    for (index, entry) in render_targets.iter().enumerate() {
        let Some(sprite) = store.get(entry.sprite) else { continue };
        let Some(image) = sprite.image(entry.sub_layer, entry.order) else { continue };

        let Some(placement) = placements.placement(&entry.image_id) else {
            stats.skipped_unplaced += 1;
            continue;
        };
        if placement.page_index == sprite_atlas::NONE_PAGE_INDEX {
            stats.skipped_unplaced += 1;
            continue;
        }

        let Some(center_px) = resolve_center_px(sprite, image, clip_context, &computed_centers) else {
            stats.skipped_projection += 1;
            continue;
        };
        computed_centers[index] = Some(ComputedCenter { anchorless: center_px, anchor_resolved: None });

        let rotation_deg = image.rotate_deg.current().0;
        let offset_magnitude = image.offset.meters.current();
        let offset_bearing_deg = image.offset.deg.current().0;
        let opacity = image.opacity.rendered(sprite.opacity_multiplier);

        let (clip_corners, hit_test_px) = match image.mode {
            ImageMode::Billboard => {
                let (half_w, half_h, _) = clamped_billboard_half_extents(
                    placement.width_px as f32 * image.scale,
                    placement.height_px as f32 * image.scale,
                    inputs.scaling.sprite_min_pixel,
                    inputs.scaling.sprite_max_pixel,
                );
                let offset_px = bearing_to_screen_offset(offset_magnitude, offset_bearing_deg);
                let corners_px = billboard_corners(center_px, half_w, half_h, image.anchor, rotation_deg, offset_px);
                let clip_corners = corners_px.map(|(x, y)| screen_px_to_clip(clip_context, x, y));
                (clip_corners, corners_px)
            }
            ImageMode::Surface => {
                let latitude = sprite.location.current().lat;
                let Ok(meters_per_pixel) = sprite_math::meters_per_pixel_at(inputs.zoom, latitude) else {
                    stats.skipped_projection += 1;
                    continue;
                };
                let zoom_scale = sprite_math::zoom_scale_factor(inputs.zoom, inputs.scaling.zoom_scale);
                let dims = sprite_math::surface_world_dimensions(
                    placement.width_px as f32,
                    placement.height_px as f32,
                    meters_per_pixel,
                    image.scale,
                    zoom_scale,
                    1.0 / meters_per_pixel,
                    inputs.scaling.sprite_min_pixel,
                    inputs.scaling.sprite_max_pixel,
                );
                let base = LngLat::new(sprite.location.current().lng, sprite.location.current().lat);
                let offset_en = bearing_to_east_north(offset_magnitude, offset_bearing_deg);
                let corner_locations = surface_corner_locations(
                    base,
                    dims.width_meters,
                    dims.height_meters,
                    image.anchor,
                    rotation_deg,
                    offset_en,
                );

                let elevation = sprite.location.current().z.unwrap_or(0.0) as f32;
                let mut clip_corners = [[0.0f32; 4]; 4];
                let mut hit_test_px = [(0.0f32, 0.0f32); 4];
                let mut all_projected = true;
                for (slot, location) in corner_locations.iter().enumerate() {
                    match clip_context.project_lnglat_to_clip(*location, elevation) {
                        Some(vertex) => {
                            let biased_z = apply_depth_bias(entry.sub_layer, entry.order, vertex.z, vertex.w);
                            clip_corners[slot] = [vertex.x as f32, vertex.y as f32, biased_z as f32, vertex.w as f32];
                            let (ndc_x, ndc_y, _) = vertex.ndc();
                            hit_test_px[slot] = clip_context.ndc_to_screen(ndc_x, ndc_y);
                        }
                        None => {
                            all_projected = false;
                            break;
                        }
                    }
                }
                if !all_projected {
                    stats.skipped_projection += 1;
                    continue;
                }
                (clip_corners, hit_test_px)
            }
        };

        if let Some(slot) = computed_centers[index].as_mut() {
            slot.anchor_resolved = Some(average_corners(hit_test_px));
        }

        if let Some(sprite_mut) = store.get_mut(entry.sprite) {
            if let Some(image_mut) = sprite_mut.image_mut(entry.sub_layer, entry.order) {
                image_mut.hit_test_corners = Some(hit_test_px);
            }
        }

        if opacity > 0.0 {
            batches.push_quad(entry.sub_layer, clip_corners, placement.uv);
            stats.drawn_quads += 1;
        }
    }

    (batches, stats)
}

/// An entry's resolved screen position, kept in both forms so a dependent
/// image can adopt whichever one its `useResolvedAnchor` flag asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ComputedCenter {
    anchorless: (f32, f32),
    anchor_resolved: Option<(f32, f32)>,
}

/// Resolves the screen position an entry should render from: the referenced
/// origin's centre when one is set and already computed, otherwise the
/// sprite's own projected position. A forward or culled origin reference
/// falls back to the sprite's own projection rather than dropping the image.
fn resolve_center_px(
    sprite: &SpriteState,
    image: &sprite_store::ImageState,
    clip_context: &ClipContext,
    computed_centers: &[Option<ComputedCenter>],
) -> Option<(f32, f32)> {
    if let Some(origin_index) = image.origin_render_target_index {
        if let Some(origin) = computed_centers.get(origin_index).copied().flatten() {
            let use_resolved_anchor = image.origin_location.is_some_and(|o| o.use_resolved_anchor);
            let adopted = if use_resolved_anchor { origin.anchor_resolved } else { Some(origin.anchorless) };
            if let Some(center) = adopted {
                return Some(center);
            }
        }
    }

    project_own_center(sprite, clip_context)
}

/// Projects the sprite's own location to a screen-space centre, independent
/// of any origin reference.
fn project_own_center(sprite: &SpriteState, clip_context: &ClipContext) -> Option<(f32, f32)> {
    let location = sprite.location.current();
    let vertex = clip_context.project_lnglat_to_clip(LngLat::new(location.lng, location.lat), 0.0)?;
    let (ndc_x, ndc_y, _) = vertex.ndc();
    Some(clip_context.ndc_to_screen(ndc_x, ndc_y))
}

/// The centre of a quad's 4 screen-space corners, i.e. the anchor/offset/
/// rotation-resolved position the quad actually renders at.
fn average_corners(corners: [(f32, f32); 4]) -> (f32, f32) {
    let (sum_x, sum_y) = corners.iter().fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    (sum_x / 4.0, sum_y / 4.0)
}

/// Compass-bearing offset (0 = up, 90 = right) converted to screen pixels.
fn bearing_to_screen_offset(magnitude: f32, bearing_deg: f32) -> (f32, f32) {
    let theta = bearing_deg.to_radians();
    (magnitude * theta.sin(), -magnitude * theta.cos())
}

/// Compass-bearing offset (0 = north, 90 = east) converted to meters.
fn bearing_to_east_north(magnitude: f32, bearing_deg: f32) -> (f32, f32) {
    let theta = bearing_deg.to_radians();
    (magnitude * theta.sin(), magnitude * theta.cos())
}

/// Billboard quads are positioned directly in screen pixels; this maps that
/// position back into the clip space the vertex batch is expressed in.
fn screen_px_to_clip(clip_context: &ClipContext, screen_x: f32, screen_y: f32) -> [f32; 4] {
    let width = clip_context.drawing_buffer_width as f32 / clip_context.pixel_ratio;
    let height = clip_context.drawing_buffer_height as f32 / clip_context.pixel_ratio;
    let ndc_x = (screen_x / width) * 2.0 - 1.0;
    let ndc_y = 1.0 - (screen_y / height) * 2.0;
    [ndc_x, ndc_y, 0.0, 1.0]
}

/// Advances every channel in the store, returning whether any is still
/// mid-interpolation.
fn advance_all_channels(store: &mut SpriteStore, now: VirtualInstant) -> bool {
    let mut any_active = false;
    for (_, sprite) in store.iter_mut() {
        let (_, active) = sprite.location.step(now);
        any_active |= active;
        for image in sprite.iter_images_mut() {
            let (_, active) = image.rotate_deg.step(now);
            any_active |= active;
            let (_, active) = image.opacity.step(now);
            any_active |= active;
            let (_, active) = image.offset.meters.step(now);
            any_active |= active;
            let (_, active) = image.offset.deg.step(now);
            any_active |= active;
        }
    }
    any_active
}

fn step_auto_rotation_for_every_sprite(store: &mut SpriteStore) {
    for (_, sprite) in store.iter_mut() {
        step_auto_rotation(sprite);
    }
}

/// Recomputes `currentAutoRotateDeg` from motion once the sprite has moved at
/// least `autoRotationMinDistanceMeters` (the
/// largest threshold among participating images) since the last refresh, and
/// snaps every participating image's rotation channel to match.
fn step_auto_rotation(sprite: &mut SpriteState) {
    let threshold = sprite
        .iter_images()
        .filter(|image| image.auto_rotation)
        .map(|image| image.auto_rotation_min_distance_meters)
        .fold(None, |acc: Option<f32>, distance| Some(acc.map_or(distance, |current| current.max(distance))));
    let Some(threshold) = threshold else { return };

    let current = sprite.location.current();
    let Some(last) = sprite.last_auto_rotation_location else {
        sprite.last_auto_rotation_location = Some(current);
        sprite.auto_rotation_invalidated = false;
        return;
    };

    let (distance_m, bearing_deg) =
        sprite_math::distance_and_bearing_meters(LngLat::new(last.lng, last.lat), LngLat::new(current.lng, current.lat));

    let should_refresh = sprite.auto_rotation_invalidated || distance_m >= threshold.max(0.0) as f64;
    if !should_refresh || (distance_m <= 0.0 && !sprite.auto_rotation_invalidated) {
        return;
    }

    sprite.current_auto_rotate_deg = bearing_deg as f32;
    sprite.last_auto_rotation_location = Some(current);
    sprite.auto_rotation_invalidated = false;
    let rotate_to = sprite.current_auto_rotate_deg;
    for image in sprite.iter_images_mut().filter(|image| image.auto_rotation) {
        image.rotate_deg.commit(Angle(rotate_to), ChannelOptions::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprite_store::{ImageInit, SpriteInit};

    #[test]
    fn small_motion_below_threshold_does_not_rotate() {
        let mut store = SpriteStore::new();
        let mut init = ImageInit::new(0, 0, "a");
        init.auto_rotation = true;
        init.auto_rotation_min_distance_meters = 20.0;
        store
            .add_sprite("s1", SpriteInit { location: Location::new(0.0, 0.0), images: vec![init], ..SpriteInit::default() })
            .unwrap();
        let sprite = store.get_by_id_mut("s1").unwrap();
        sprite.last_auto_rotation_location = Some(Location::new(0.0, 0.0));
        sprite.auto_rotation_invalidated = false;
        // roughly 10m east at the equator.
        sprite.location.commit(Location::new(0.0000898, 0.0), ChannelOptions::default());

        step_auto_rotation(sprite);
        assert_eq!(sprite.current_auto_rotate_deg, 0.0);
    }

    #[test]
    fn motion_past_threshold_sets_bearing_to_roughly_east() {
        let mut store = SpriteStore::new();
        let mut init = ImageInit::new(0, 0, "a");
        init.auto_rotation = true;
        init.auto_rotation_min_distance_meters = 20.0;
        store
            .add_sprite("s1", SpriteInit { location: Location::new(0.0, 0.0), images: vec![init], ..SpriteInit::default() })
            .unwrap();
        let sprite = store.get_by_id_mut("s1").unwrap();
        sprite.last_auto_rotation_location = Some(Location::new(0.0, 0.0));
        sprite.auto_rotation_invalidated = false;
        // roughly 25m east at the equator.
        sprite.location.commit(Location::new(0.0002246, 0.0), ChannelOptions::default());

        step_auto_rotation(sprite);
        assert!((sprite.current_auto_rotate_deg - 90.0).abs() < 1.0);
    }

    struct FixedPlacement;
    impl AtlasPlacementLookup for FixedPlacement {
        fn placement(&self, _image_id: &str) -> Option<ImagePlacement> {
            Some(ImagePlacement { page_index: 0, uv: UvRect { u0: 0.0, v0: 0.0, u1: 1.0, v1: 1.0 }, width_px: 32, height_px: 32 })
        }
    }

    #[test]
    fn billboard_sprite_produces_one_drawn_quad() {
        let mut store = SpriteStore::new();
        store
            .add_sprite(
                "s1",
                SpriteInit { location: Location::new(0.0, 0.0), images: vec![ImageInit::new(0, 0, "a")], ..SpriteInit::default() },
            )
            .unwrap();
        let render_targets = vec![RenderTargetEntry { sprite: store.handle_for_id("s1").unwrap(), sub_layer: 0, order: 0, image_id: "a".to_string() }];
        let clip_context = ClipContext::identity(800, 600);
        let inputs = FrameInputs { zoom: 0.0, now: VirtualInstant::from_millis(0.0), scaling: ScalingOptions::default() };

        let (batches, stats) = compute_frame(&mut store, &render_targets, &FixedPlacement, &clip_context, &inputs);
        assert_eq!(stats.drawn_quads, 1);
        assert_eq!(batches.total_quad_vertices(), 6);
    }

    #[test]
    fn unplaced_image_is_skipped_and_counted() {
        struct Unplaced;
        impl AtlasPlacementLookup for Unplaced {
            fn placement(&self, _image_id: &str) -> Option<ImagePlacement> {
                None
            }
        }
        let mut store = SpriteStore::new();
        store
            .add_sprite(
                "s1",
                SpriteInit { location: Location::new(0.0, 0.0), images: vec![ImageInit::new(0, 0, "a")], ..SpriteInit::default() },
            )
            .unwrap();
        let render_targets = vec![RenderTargetEntry { sprite: store.handle_for_id("s1").unwrap(), sub_layer: 0, order: 0, image_id: "a".to_string() }];
        let clip_context = ClipContext::identity(800, 600);
        let inputs = FrameInputs { zoom: 0.0, now: VirtualInstant::from_millis(0.0), scaling: ScalingOptions::default() };

        let (batches, stats) = compute_frame(&mut store, &render_targets, &Unplaced, &clip_context, &inputs);
        assert_eq!(stats.drawn_quads, 0);
        assert_eq!(stats.skipped_unplaced, 1);
        assert_eq!(batches.total_quad_vertices(), 0);
    }

    #[test]
    fn forward_origin_reference_falls_back_to_its_own_projection_instead_of_being_skipped() {
        let mut store = SpriteStore::new();
        let mut dependent = ImageInit::new(0, 0, "a");
        dependent.origin_location =
            Some(sprite_store::OriginLocation { sub_layer: 0, order: 1, use_resolved_anchor: false });
        let referent = ImageInit::new(0, 1, "b");
        store
            .add_sprite(
                "s1",
                SpriteInit { location: Location::new(0.0, 0.0), images: vec![dependent, referent], ..SpriteInit::default() },
            )
            .unwrap();
        // "a" is listed first, so its origin at index 1 ("b") has not been computed yet
        // when "a" is reached: a forward reference.
        let sprite = store.get_by_id_mut("s1").unwrap();
        sprite.image_mut(0, 0).unwrap().origin_render_target_index = Some(1);

        let handle = store.handle_for_id("s1").unwrap();
        let render_targets = vec![
            RenderTargetEntry { sprite: handle, sub_layer: 0, order: 0, image_id: "a".to_string() },
            RenderTargetEntry { sprite: handle, sub_layer: 0, order: 1, image_id: "b".to_string() },
        ];
        let clip_context = ClipContext::identity(800, 600);
        let inputs = FrameInputs { zoom: 0.0, now: VirtualInstant::from_millis(0.0), scaling: ScalingOptions::default() };

        let (_, stats) = compute_frame(&mut store, &render_targets, &FixedPlacement, &clip_context, &inputs);
        assert_eq!(stats.skipped_projection, 0);
        assert_eq!(stats.drawn_quads, 2);
    }

    #[test]
    fn use_resolved_anchor_flag_selects_between_anchorless_and_anchor_resolved_center() {
        fn dependent_corner(use_resolved_anchor: bool) -> (f32, f32) {
            let mut store = SpriteStore::new();
            let mut dependent = ImageInit::new(0, 0, "a");
            dependent.origin_location =
                Some(sprite_store::OriginLocation { sub_layer: 0, order: 1, use_resolved_anchor });
            let mut referent = ImageInit::new(0, 1, "b");
            referent.offset_meters = 20.0;
            referent.offset_deg = 90.0; // pure rightward screen shift
            store
                .add_sprite(
                    "s1",
                    SpriteInit { location: Location::new(0.0, 0.0), images: vec![referent, dependent], ..SpriteInit::default() },
                )
                .unwrap();
            let sprite = store.get_by_id_mut("s1").unwrap();
            sprite.image_mut(0, 0).unwrap().origin_render_target_index = Some(0);

            let handle = store.handle_for_id("s1").unwrap();
            let render_targets = vec![
                RenderTargetEntry { sprite: handle, sub_layer: 0, order: 1, image_id: "b".to_string() },
                RenderTargetEntry { sprite: handle, sub_layer: 0, order: 0, image_id: "a".to_string() },
            ];
            let clip_context = ClipContext::identity(800, 600);
            let inputs = FrameInputs { zoom: 0.0, now: VirtualInstant::from_millis(0.0), scaling: ScalingOptions::default() };
            compute_frame(&mut store, &render_targets, &FixedPlacement, &clip_context, &inputs);

            store.get_by_id("s1").unwrap().image(0, 0).unwrap().hit_test_corners.unwrap()[0]
        }

        let anchorless = dependent_corner(false);
        let anchor_resolved = dependent_corner(true);
        // the referent's offset shifts its anchor-resolved centre 20px right of its
        // anchorless one; adopting it should shift the dependent's quad by the same amount.
        assert!((anchor_resolved.0 - anchorless.0 - 20.0).abs() < 0.5);
        assert!((anchor_resolved.1 - anchorless.1).abs() < 0.5);
    }
}
