use crate::geodesy::EARTH_RADIUS_M;

/// Web-Mercator reference tile size in pixels, matching the convention used by
/// maplibre-style hosts (256px tiles rendered at `@2x` => 512px).
const REFERENCE_TILE_SIZE_PX: f64 = 512.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingError {
    InvalidZoom,
    InvalidLatitude,
}

/// Meters represented by one screen pixel at `zoom`/`latitude` under spherical
/// Mercator. Always positive; `latitude` must stay away from the poles where the
/// projection's scale factor diverges.
pub fn meters_per_pixel_at(zoom: f32, latitude: f64) -> Result<f32, ScalingError> {
    if !zoom.is_finite() || zoom < 0.0 {
        return Err(ScalingError::InvalidZoom);
    }
    if !latitude.is_finite() || latitude.abs() >= 90.0 {
        return Err(ScalingError::InvalidLatitude);
    }

    let circumference = 2.0 * std::f64::consts::PI * EARTH_RADIUS_M;
    let lat_rad = latitude.to_radians();
    let tiles_at_zoom = REFERENCE_TILE_SIZE_PX * (2f64).powf(zoom as f64);
    let meters_per_pixel = circumference * lat_rad.cos().abs() / tiles_at_zoom;

    if meters_per_pixel <= 0.0 || !meters_per_pixel.is_finite() {
        return Err(ScalingError::InvalidLatitude);
    }
    Ok(meters_per_pixel as f32)
}

/// Configuration for converting a camera zoom level into a dimensionless sprite scale
/// factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomScaleOptions {
    pub reference_zoom: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for ZoomScaleOptions {
    fn default() -> Self {
        Self {
            reference_zoom: 0.0,
            min_scale: 0.0,
            max_scale: f32::MAX,
        }
    }
}

/// `2^(zoom - reference_zoom)`, clamped to `[min_scale, max_scale]`. Always positive.
pub fn zoom_scale_factor(zoom: f32, options: ZoomScaleOptions) -> f32 {
    let raw = 2f32.powf(zoom - options.reference_zoom);
    let raw = if raw.is_finite() { raw } else { options.max_scale };
    raw.clamp(options.min_scale.max(0.0), options.max_scale.max(options.min_scale.max(0.0)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDimensions {
    pub width_meters: f32,
    pub height_meters: f32,
    pub scale_adjustment: f32,
}

/// Computes the world-space (meters) footprint of a surface-mode quad such that its
/// longest screen-pixel axis never falls outside `[min_pixel, max_pixel]`.
pub fn surface_world_dimensions(
    image_width_px: f32,
    image_height_px: f32,
    base_meters_per_pixel: f32,
    image_scale: f32,
    zoom_scale_factor: f32,
    effective_pixels_per_meter: f32,
    min_pixel: f32,
    max_pixel: f32,
) -> SurfaceDimensions {
    let raw_width_px = image_width_px * image_scale * zoom_scale_factor;
    let raw_height_px = image_height_px * image_scale * zoom_scale_factor;
    let longest_px = raw_width_px.max(raw_height_px);

    let scale_adjustment = if longest_px <= 0.0 {
        1.0
    } else {
        longest_px.clamp(min_pixel, max_pixel.max(min_pixel)) / longest_px
    };

    let width_px = raw_width_px * scale_adjustment;
    let height_px = raw_height_px * scale_adjustment;

    let pixels_per_meter = if effective_pixels_per_meter > 0.0 {
        effective_pixels_per_meter
    } else if base_meters_per_pixel > 0.0 {
        1.0 / base_meters_per_pixel
    } else {
        1.0
    };

    SurfaceDimensions {
        width_meters: width_px / pixels_per_meter,
        height_meters: height_px / pixels_per_meter,
        scale_adjustment,
    }
}

/// Fixed winding order shared by the projector and the hit-tester: top-left,
/// top-right, bottom-right, bottom-left, matching a clockwise fan from the
/// image's top-left corner in image space.
pub type CornerOrder = [(f64, f64); 4];

/// Computes the four `(east_m, north_m)` corner displacements of a surface-mode quad
/// relative to its geographic base point, given the quad's world dimensions, the
/// image anchor, the total rotation (degrees, compass bearing convention: 0 = north,
/// 90 = east), and an additional offset in meters.
pub fn surface_corner_displacements(
    world_width_m: f32,
    world_height_m: f32,
    anchor: crate::Anchor,
    total_rotation_deg: f32,
    offset_east_north_m: (f32, f32),
) -> CornerOrder {
    let half_w = world_width_m as f64 / 2.0;
    let half_h = world_height_m as f64 / 2.0;

    // Anchor shift: how far the quad's center sits from the anchor point, in
    // (east, north) meters, given the image's top-left == (0,0), bottom-right == (1,1)
    // anchor convention (north is "up" in image space).
    let anchor_shift_east = (0.5 - anchor.x as f64) * world_width_m as f64;
    let anchor_shift_north = (anchor.y as f64 - 0.5) * world_height_m as f64;

    let local_corners: CornerOrder = [
        (-half_w, half_h),  // top-left
        (half_w, half_h),   // top-right
        (half_w, -half_h),  // bottom-right
        (-half_w, -half_h), // bottom-left
    ];

    let theta = (total_rotation_deg as f64).to_radians();
    let (sin_t, cos_t) = theta.sin_cos();

    local_corners.map(|(east, north)| {
        let rotated_east = east * cos_t + north * sin_t;
        let rotated_north = -east * sin_t + north * cos_t;
        (
            rotated_east + anchor_shift_east + offset_east_north_m.0 as f64,
            rotated_north + anchor_shift_north + offset_east_north_m.1 as f64,
        )
    })
}
