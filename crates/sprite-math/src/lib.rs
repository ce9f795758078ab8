//! Geodesic distance/bearing, projection, surface sizing, and easing primitives.
//!
//! Every function here returns `Option`/`Result` rather than `NaN` for undefined
//! results; callers treat `None` as "skip this image for this frame".

mod easing;
mod geodesy;
mod projection;
mod scaling;

pub use easing::{EasingCurve, NamedCurve};
pub use geodesy::{LngLat, distance_and_bearing_meters, apply_surface_displacement};
pub use projection::{ClipContext, ClipVertex};
pub use scaling::{
    CornerOrder, ScalingError, SurfaceDimensions, ZoomScaleOptions, meters_per_pixel_at,
    surface_corner_displacements, surface_world_dimensions, zoom_scale_factor,
};

/// Normalized anchor point inside an image, `(0,0)` top-left, `(1,1)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub const CENTER: Self = Self { x: 0.5, y: 0.5 };
    pub const BOTTOM_CENTER: Self = Self { x: 0.5, y: 1.0 };
}

/// A screen-space point in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}
