use crate::geodesy::LngLat;

/// Minimum acceptable clip-space `w` before a point is treated as behind/at the near
/// plane and projection is abandoned for the frame.
pub const EPSILON_W: f64 = 1e-6;

/// A projected clip-space vertex, `(x, y, z, w)`. Divide `x`/`y`/`z` by `w` to reach NDC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl ClipVertex {
    pub fn ndc(self) -> (f64, f64, f64) {
        (self.x / self.w, self.y / self.w, self.z / self.w)
    }
}

/// The host-supplied view/projection state for one frame: a row-major 4x4
/// world-to-clip matrix operating on web-Mercator world coordinates, plus the drawing
/// buffer's pixel dimensions for NDC-to-screen mapping.
///
/// Mirrors `view::ViewTransform` generalized from a flat 2D canvas transform to a
/// lng/lat-aware projection with a perspective divide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipContext {
    pub matrix: [f64; 16],
    pub drawing_buffer_width: u32,
    pub drawing_buffer_height: u32,
    pub pixel_ratio: f32,
}

impl ClipContext {
    /// Converts geographic coordinates to the `[0, 1)` spherical-Mercator world space
    /// that `matrix` expects as its input basis.
    pub fn mercator_from_lnglat(lnglat: LngLat) -> (f64, f64) {
        let x = (lnglat.lng + 180.0) / 360.0;
        let lat_rad = lnglat.lat.to_radians();
        let y = 0.5 - (((std::f64::consts::FRAC_PI_4 + lat_rad / 2.0).tan()).ln())
            / (2.0 * std::f64::consts::PI);
        (x, y)
    }

    /// Projects a geographic point with an elevation offset (meters) to clip space.
    /// Returns `None` when the projected `w` falls at or behind the near plane.
    pub fn project_lnglat_to_clip(&self, lnglat: LngLat, elevation_m: f32) -> Option<ClipVertex> {
        let (mx, my) = Self::mercator_from_lnglat(lnglat);
        self.project_mercator_to_clip(mx, my, elevation_m as f64)
    }

    pub fn project_mercator_to_clip(&self, mx: f64, my: f64, elevation_m: f64) -> Option<ClipVertex> {
        let m = &self.matrix;
        let x = m[0] * mx + m[1] * my + m[2] * elevation_m + m[3];
        let y = m[4] * mx + m[5] * my + m[6] * elevation_m + m[7];
        let z = m[8] * mx + m[9] * my + m[10] * elevation_m + m[11];
        let w = m[12] * mx + m[13] * my + m[14] * elevation_m + m[15];

        if w <= EPSILON_W {
            return None;
        }
        Some(ClipVertex { x, y, z, w })
    }

    /// Maps an NDC point (`x, y` in `[-1, 1]`) to drawing-buffer pixel coordinates.
    pub fn ndc_to_screen(&self, ndc_x: f64, ndc_y: f64) -> (f32, f32) {
        let width = self.drawing_buffer_width as f64 / self.pixel_ratio as f64;
        let height = self.drawing_buffer_height as f64 / self.pixel_ratio as f64;
        let screen_x = (ndc_x * 0.5 + 0.5) * width;
        let screen_y = (1.0 - (ndc_y * 0.5 + 0.5)) * height;
        (screen_x as f32, screen_y as f32)
    }

    /// Identity-like matrix that maps Mercator world space `[0,1)^2` directly to clip
    /// space `[-1,1]^2`, `w = 1`. Useful for tests and as a sane default.
    pub fn identity(drawing_buffer_width: u32, drawing_buffer_height: u32) -> Self {
        #[rustfmt::skip]
        let matrix = [
            2.0, 0.0, 0.0, -1.0,
            0.0, -2.0, 0.0, 1.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self {
            matrix,
            drawing_buffer_width,
            drawing_buffer_height,
            pixel_ratio: 1.0,
        }
    }
}
