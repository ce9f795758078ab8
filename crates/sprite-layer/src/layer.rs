use std::time::Instant;

use sprite_atlas::{AtlasManager, AtlasOperationQueue, Bitmap, ImageRegistry};
use sprite_hittest::{EventDispatcher, HitTestController, ListenerId, PointerSample, SpriteEventKind};
use sprite_glyph::{CancelToken, GlyphQueue, GlyphRasterizer};
use sprite_render::{compute_frame, AtlasPlacementLookup, FrameBatches, FrameInputs, FrameStats, ImagePlacement, ScalingOptions};
use sprite_scheduler::FrameRedrawScheduler;
use sprite_store::{
    ImageInit, MutateDecision, MutationError, RenderTargetCache, SpriteInit, SpriteState, SpriteStore,
    SpriteUpdaterEntry,
};

use crate::config::SpriteLayerConfig;
use crate::error::SpriteLayerError;
use crate::hosts::{HostMap, ProjectionHost};
use crate::tracking::SpriteTracking;

struct RegistryPlacementLookup<'a, B: Bitmap> {
    registry: &'a ImageRegistry<B>,
    atlas: &'a AtlasManager,
}

impl<'a, B: Bitmap> AtlasPlacementLookup for RegistryPlacementLookup<'a, B> {
    fn placement(&self, image_id: &str) -> Option<ImagePlacement> {
        let resource = self.registry.get(image_id)?;
        let (page_index, uv) = self.atlas.placement(resource.handle)?;
        Some(ImagePlacement { page_index, uv, width_px: resource.width, height_px: resource.height })
    }
}

/// The single public entry point, owning one instance of each subsystem and
/// exposing the full sprite-layer operation surface. A struct that owns
/// business-logic state and drives subsystems via explicit calls, never
/// exposing their internals.
pub struct SpriteLayer<B: Bitmap, Spec> {
    config: SpriteLayerConfig,
    registry: ImageRegistry<B>,
    atlas: AtlasManager,
    atlas_queue: AtlasOperationQueue,
    glyph_queue: GlyphQueue<Spec>,
    store: SpriteStore,
    render_targets: RenderTargetCache,
    hit_test: HitTestController,
    dispatcher: EventDispatcher,
    scheduler: FrameRedrawScheduler,
    tracking: SpriteTracking,
}

impl<B: Bitmap, Spec> SpriteLayer<B, Spec> {
    pub fn new(config: SpriteLayerConfig) -> Self {
        let atlas = AtlasManager::new(config.atlas_page_width, config.atlas_page_height, config.atlas_max_pages);
        Self {
            config,
            registry: ImageRegistry::new(),
            atlas,
            atlas_queue: AtlasOperationQueue::new(),
            glyph_queue: GlyphQueue::new(),
            store: SpriteStore::new(),
            render_targets: RenderTargetCache::new(),
            hit_test: HitTestController::new(),
            dispatcher: EventDispatcher::new(),
            scheduler: FrameRedrawScheduler::new(),
            tracking: SpriteTracking::new(),
        }
    }

    pub fn config(&self) -> &SpriteLayerConfig {
        &self.config
    }

    // ---- image registration ----

    /// Adopts `bitmap` under `id` and enqueues its atlas placement. Returns
    /// `false` (no state change) if `id` is already registered.
    pub fn register_image(&mut self, id: impl Into<String>, bitmap: B) -> bool {
        let id = id.into();
        let width = bitmap.width();
        let height = bitmap.height();
        match self.registry.register(id, bitmap) {
            Ok(handle) => {
                self.atlas_queue.upsert(handle, width, height);
                self.render_targets.mark_dirty();
                true
            }
            Err(_duplicate) => false,
        }
    }

    /// Enqueues a text-glyph rasterization job; dedup-by-id means a repeat
    /// call for a still-pending id is a no-op that returns the existing
    /// token.
    pub fn register_text_glyph(&mut self, id: impl Into<String>, spec: Spec) -> CancelToken {
        let id = id.into();
        match self.glyph_queue.request(id.clone(), spec) {
            Some(token) => token,
            None => self.glyph_queue.token_for(&id).expect("just deduped against a pending request"),
        }
    }

    pub fn unregister_image(&mut self, id: &str) -> bool {
        if let Some(resource) = self.registry.get(id) {
            self.atlas.remove(resource.handle);
            self.atlas_queue.cancel_for_image(resource.handle);
        }
        let removed = self.registry.unregister(id);
        if removed {
            self.render_targets.mark_dirty();
        }
        removed
    }

    pub fn unregister_all_images(&mut self) {
        self.registry.unregister_all();
        self.atlas.clear();
        self.atlas_queue.clear();
        self.render_targets.mark_dirty();
    }

    pub fn all_image_ids(&self) -> Vec<&str> {
        self.registry.all_ids()
    }

    pub fn all_sprite_ids(&self) -> Vec<&str> {
        self.store.all_ids()
    }

    // ---- sprite mutation ----

    pub fn add_sprite(&mut self, id: impl Into<String>, init: SpriteInit) -> Result<bool, SpriteLayerError> {
        match self.store.add_sprite(id, init) {
            Ok(_) => {
                self.render_targets.mark_dirty();
                Ok(true)
            }
            Err(MutationError::Duplicate) => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    pub fn add_sprites(&mut self, items: Vec<(String, SpriteInit)>) -> Result<usize, SpriteLayerError> {
        let count = self.store.add_sprites(items)?;
        if count > 0 {
            self.render_targets.mark_dirty();
        }
        Ok(count)
    }

    pub fn remove_sprite(&mut self, id: &str) -> bool {
        let removed = self.store.remove_sprite(id);
        if removed {
            self.render_targets.mark_dirty();
        }
        removed
    }

    pub fn remove_sprites(&mut self, ids: &[String]) -> usize {
        let count = self.store.remove_sprites(ids);
        if count > 0 {
            self.render_targets.mark_dirty();
        }
        count
    }

    pub fn remove_all_sprites(&mut self) -> usize {
        let count = self.store.remove_all_sprites();
        self.render_targets.mark_dirty();
        count
    }

    pub fn remove_all_sprite_images(&mut self, id: &str) -> usize {
        let count = self.store.remove_all_sprite_images(id);
        if count > 0 {
            self.render_targets.mark_dirty();
        }
        count
    }

    pub fn get_sprite_state(&self, id: &str) -> Option<&SpriteState> {
        self.store.get_by_id(id)
    }

    pub fn add_sprite_image(&mut self, id: &str, init: ImageInit) -> Result<bool, SpriteLayerError> {
        let added = self.store.add_sprite_image(id, init)?;
        if added {
            self.render_targets.mark_dirty();
        }
        Ok(added)
    }

    pub fn remove_sprite_image(&mut self, id: &str, sub_layer: u32, order: u32) -> bool {
        let removed = self.store.remove_sprite_image(id, sub_layer, order);
        if removed {
            self.render_targets.mark_dirty();
        }
        removed
    }

    pub fn update_sprite_image(&mut self, id: &str, sub_layer: u32, order: u32, patch: impl FnOnce(&mut sprite_store::ImageState)) -> bool {
        self.store.update_sprite_image(id, sub_layer, order, patch)
    }

    pub fn update_sprite(&mut self, id: &str, patch: &SpriteUpdaterEntry) -> bool {
        self.store.update_sprite(id, patch)
    }

    pub fn mutate_sprites<I>(
        &mut self,
        source_items: impl IntoIterator<Item = (String, I)>,
        decide: impl FnMut(&str, &I, bool, &mut SpriteUpdaterEntry) -> MutateDecision,
    ) -> usize {
        let count = self.store.mutate_sprites(source_items, decide);
        if count > 0 {
            self.render_targets.mark_dirty();
        }
        count
    }

    pub fn update_for_each(&mut self, cb: impl FnMut(&mut SpriteState)) {
        self.store.update_for_each(cb);
    }

    // ---- feature toggles ----

    pub fn set_interpolation_calculation(&mut self, enabled: bool) {
        self.scheduler.set_interpolation_enabled(enabled);
    }

    pub fn set_hit_test_detection(&mut self, enabled: bool) {
        self.hit_test.set_enabled(enabled);
    }

    // ---- sprite tracking ----

    pub fn track_sprite(&mut self, id: impl Into<String>, track_rotation: Option<(u32, u32)>) {
        self.tracking.track_sprite(id, track_rotation);
    }

    pub fn untrack_sprite(&mut self) {
        self.tracking.untrack_sprite();
    }

    // ---- events ----

    pub fn on(&mut self, kind: SpriteEventKind, listener: impl FnMut(sprite_hittest::SpriteEvent) + 'static) -> ListenerId {
        self.dispatcher.on(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.dispatcher.off(id)
    }

    pub fn dispatch_pointer_sample(&mut self, sample: PointerSample) {
        self.dispatcher.dispatch(&self.hit_test, sample);
    }

    /// Polls a pointer source and dispatches every sample it produced since
    /// the last call, against the hit-test entries from the most recently
    /// completed frame.
    pub fn poll_and_dispatch_pointer(&mut self, source: &mut dyn crate::hosts::PointerSource) {
        for sample in source.poll() {
            self.dispatcher.dispatch(&self.hit_test, sample);
        }
    }

    pub fn request_redraw(&mut self) {
        self.scheduler.request_redraw();
    }

    /// Runs one full tick: drains the atlas/glyph queues under their
    /// per-tick budgets, steps interpolation if the visibility-gated clock
    /// is running, recomputes the frame's vertex batches and hit-test
    /// entries, applies sprite tracking, and reports whether a host render
    /// call is actually warranted this tick.
    pub fn tick(
        &mut self,
        host_map: &mut dyn HostMap,
        projection: &dyn ProjectionHost,
        rasterizer: &mut dyn GlyphRasterizer<Spec, B>,
        wall_now: Instant,
    ) -> Option<(FrameBatches, FrameStats)> {
        let decision = self.scheduler.tick(host_map.is_visible(), wall_now);
        if decision.should_invalidate_all_interpolations {
            self.store.update_for_each(|sprite| {
                sprite.location.invalidate();
                for image in sprite.iter_images_mut() {
                    image.opacity.invalidate();
                    image.rotate_deg.invalidate();
                    image.offset.meters.invalidate();
                    image.offset.deg.invalidate();
                }
            });
        }

        self.glyph_queue.drain(
            self.config.glyph_jobs_per_tick,
            self.config.glyph_time_budget,
            rasterizer,
            &mut self.registry,
            &mut self.atlas_queue,
        );
        self.atlas_queue.drain(&mut self.atlas, self.config.atlas_operations_per_tick, self.config.atlas_time_budget);

        if !decision.should_render {
            return None;
        }

        let Some(clip_context) = projection.clip_context() else {
            return None;
        };

        self.tracking.apply(&self.store, host_map);

        let render_targets = self.render_targets.snapshot(&mut self.store);
        let lookup = RegistryPlacementLookup { registry: &self.registry, atlas: &self.atlas };
        let inputs = FrameInputs {
            zoom: host_map.zoom(),
            now: decision.now,
            scaling: ScalingOptions {
                sprite_min_pixel: self.config.scaling.sprite_min_pixel,
                sprite_max_pixel: self.config.scaling.sprite_max_pixel,
                zoom_scale: self.config.scaling.zoom_scale,
            },
        };
        let (batches, stats) = compute_frame(&mut self.store, &render_targets, &lookup, &clip_context, &inputs);

        if self.hit_test.is_enabled() {
            self.hit_test.rebuild(&self.store, &render_targets);
        } else {
            self.hit_test.clear();
        }

        Some((batches, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprite_math::{ClipContext, LngLat, ScreenPoint};

    #[derive(Default)]
    struct TestBitmap {
        width: u32,
        height: u32,
    }

    impl Bitmap for TestBitmap {
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
        fn close(&mut self) {}
    }

    struct NoGlyphs;
    impl GlyphRasterizer<String, TestBitmap> for NoGlyphs {
        fn rasterize(&mut self, _spec: &String) -> Result<TestBitmap, sprite_glyph::RasterizeError> {
            Err(sprite_glyph::RasterizeError::Failed)
        }
    }

    struct StaticProjection(ClipContext);
    impl ProjectionHost for StaticProjection {
        fn clip_context(&self) -> Option<ClipContext> {
            Some(self.0)
        }
    }

    struct StubHostMap {
        visible: bool,
    }
    impl HostMap for StubHostMap {
        fn project(&self, _location: LngLat) -> Option<ScreenPoint> {
            None
        }
        fn unproject(&self, _point: ScreenPoint) -> Option<LngLat> {
            None
        }
        fn zoom(&self) -> f32 {
            10.0
        }
        fn is_visible(&self) -> bool {
            self.visible
        }
        fn trigger_repaint(&self) {}
        fn set_center(&mut self, _location: LngLat) {}
        fn set_bearing(&mut self, _bearing_deg: f32) {}
    }

    #[test]
    fn register_image_rejects_duplicate_id() {
        let mut layer: SpriteLayer<TestBitmap, String> = SpriteLayer::new(SpriteLayerConfig::default());
        assert!(layer.register_image("a", TestBitmap { width: 8, height: 8 }));
        assert!(!layer.register_image("a", TestBitmap { width: 8, height: 8 }));
    }

    #[test]
    fn tick_renders_on_first_visible_frame_and_suppresses_the_next_idle_one() {
        let mut layer: SpriteLayer<TestBitmap, String> = SpriteLayer::new(SpriteLayerConfig::default());
        layer.add_sprite("s1", SpriteInit::default()).unwrap();

        let mut host_map = StubHostMap { visible: true };
        let projection = StaticProjection(ClipContext::identity(800, 600));
        let mut rasterizer = NoGlyphs;

        let t0 = Instant::now();
        let first = layer.tick(&mut host_map, &projection, &mut rasterizer, t0);
        assert!(first.is_some());

        let second = layer.tick(&mut host_map, &projection, &mut rasterizer, t0);
        assert!(second.is_none());
    }

    #[test]
    fn hiding_then_showing_schedules_another_render() {
        let mut layer: SpriteLayer<TestBitmap, String> = SpriteLayer::new(SpriteLayerConfig::default());
        let projection = StaticProjection(ClipContext::identity(800, 600));
        let mut rasterizer = NoGlyphs;
        let t0 = Instant::now();

        let mut host_map = StubHostMap { visible: true };
        layer.tick(&mut host_map, &projection, &mut rasterizer, t0);

        host_map.visible = false;
        let hidden = layer.tick(&mut host_map, &projection, &mut rasterizer, t0);
        assert!(hidden.is_none());

        host_map.visible = true;
        let reshown = layer.tick(&mut host_map, &projection, &mut rasterizer, t0);
        assert!(reshown.is_some());
    }
}
