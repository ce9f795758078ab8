use std::time::Duration;

use sprite_math::ZoomScaleOptions;

/// Sprite-size clamping and zoom-driven scaling, after
/// `frame_scheduler::FrameSchedulerConfig`'s plain-struct-with-`Default` style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteScalingOptions {
    pub meters_per_pixel_override: Option<f32>,
    pub sprite_min_pixel: f32,
    pub sprite_max_pixel: f32,
    pub zoom_scale: ZoomScaleOptions,
}

impl Default for SpriteScalingOptions {
    fn default() -> Self {
        Self {
            meters_per_pixel_override: None,
            sprite_min_pixel: 1.0,
            sprite_max_pixel: f32::MAX,
            zoom_scale: ZoomScaleOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl MinFilter {
    fn requires_mipmaps(self) -> bool {
        !matches!(self, MinFilter::Nearest | MinFilter::Linear)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagFilter {
    Nearest,
    Linear,
}

/// Texture sampling configuration. Requesting a mipmap minification filter
/// forces `generate_mipmaps = true` even if the caller said otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureFilteringOptions {
    pub min_filter: MinFilter,
    pub mag_filter: MagFilter,
    pub generate_mipmaps: bool,
    pub max_anisotropy: u32,
}

impl TextureFilteringOptions {
    pub fn new(min_filter: MinFilter, mag_filter: MagFilter, generate_mipmaps: bool, max_anisotropy: u32) -> Self {
        let generate_mipmaps = generate_mipmaps || min_filter.requires_mipmaps();
        Self { min_filter, mag_filter, generate_mipmaps, max_anisotropy }
    }
}

impl Default for TextureFilteringOptions {
    fn default() -> Self {
        Self::new(MinFilter::Linear, MagFilter::Linear, false, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugFlags {
    pub log_atlas_exhaustion: bool,
    pub log_dropped_glyph_jobs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteLayerConfig {
    pub atlas_page_width: u32,
    pub atlas_page_height: u32,
    pub atlas_max_pages: usize,
    pub atlas_operations_per_tick: usize,
    pub atlas_time_budget: Duration,
    pub glyph_jobs_per_tick: usize,
    pub glyph_time_budget: Duration,
    pub scaling: SpriteScalingOptions,
    pub texture_filtering: TextureFilteringOptions,
    pub debug: DebugFlags,
}

impl Default for SpriteLayerConfig {
    fn default() -> Self {
        Self {
            atlas_page_width: 2048,
            atlas_page_height: 2048,
            atlas_max_pages: 8,
            atlas_operations_per_tick: 16,
            atlas_time_budget: Duration::from_millis(2),
            glyph_jobs_per_tick: 4,
            glyph_time_budget: Duration::from_millis(2),
            scaling: SpriteScalingOptions::default(),
            texture_filtering: TextureFilteringOptions::default(),
            debug: DebugFlags::default(),
        }
    }
}
