use sprite_hittest::PointerSample;
use sprite_math::{ClipContext, LngLat, ScreenPoint};

/// The host map or camera the layer reads zoom/visibility from and drives for
/// sprite tracking.
pub trait HostMap {
    fn project(&self, location: LngLat) -> Option<ScreenPoint>;
    fn unproject(&self, point: ScreenPoint) -> Option<LngLat>;
    fn zoom(&self) -> f32;
    fn is_visible(&self) -> bool;
    fn trigger_repaint(&self);
    fn set_center(&mut self, location: LngLat);
    fn set_bearing(&mut self, bearing_deg: f32);
}

/// Produces this frame's clip-space projection state from whatever the host
/// map's current camera snapshot is. Two implementations are anticipated
/// (native math, or a drop-in compiled engine); the layer only depends on
/// this trait.
pub trait ProjectionHost {
    fn clip_context(&self) -> Option<ClipContext>;
}

/// Bulk per-frame channel-stepping delegate. The layer's own
/// `sprite-render::compute_frame` is the native implementation; a host may
/// substitute a compiled one with identical semantics.
pub trait CalculationHost {
    fn has_active_interpolation(&self) -> bool;
}

/// Abstracts GPU upload/draw so the core crates never touch a graphics API
/// directly. `B` is the atlas's adopted bitmap type.
pub trait GraphicsContext<B> {
    fn ensure_textures(&mut self, dirty_page_indices: &[usize]);
    fn begin_frame(&mut self);
    fn upload_vertex_batch(&mut self, sub_layer: u32, vertices: &[sprite_render::SpriteVertex]);
    fn draw(&mut self);
}

/// Emits raw pointer samples the layer turns into `spriteclick`/`spritehover`/
/// `spritemove`/`spriteleave` events.
pub trait PointerSource {
    fn poll(&mut self) -> Vec<PointerSample>;
}
