use sprite_math::{Anchor, LngLat};

/// Fixed corner order shared by the renderer and the hit-tester: top-left,
/// top-right, bottom-right, bottom-left. Vertex emission and hit-test
/// point-in-quad both walk the two
/// triangles `(0,1,2)` and `(0,2,3)` against this order.
pub type Corners<T> = [T; 4];

/// Clamps `raw_width_px`/`raw_height_px`'s longest axis into
/// `[min_pixel, max_pixel]`, returning the clamped half-extents and the
/// scale adjustment applied. Never collapses below `min_pixel` nor exceeds
/// `max_pixel`.
pub fn clamped_billboard_half_extents(
    raw_width_px: f32,
    raw_height_px: f32,
    min_pixel: f32,
    max_pixel: f32,
) -> (f32, f32, f32) {
    let longest = raw_width_px.max(raw_height_px);
    let scale_adjustment = if longest <= 0.0 {
        1.0
    } else {
        longest.clamp(min_pixel, max_pixel.max(min_pixel)) / longest
    };
    ((raw_width_px * scale_adjustment) / 2.0, (raw_height_px * scale_adjustment) / 2.0, scale_adjustment)
}

/// Billboard-mode screen corners: axis-aligned half-extents, shifted by the
/// anchor, rotated by `total_rotation_deg`, translated to `center_px` and
/// `offset_px`.
pub fn billboard_corners(
    center_px: (f32, f32),
    half_width_px: f32,
    half_height_px: f32,
    anchor: Anchor,
    total_rotation_deg: f32,
    offset_px: (f32, f32),
) -> Corners<(f32, f32)> {
    let local_corners: Corners<(f32, f32)> = [
        (-half_width_px, -half_height_px),
        (half_width_px, -half_height_px),
        (half_width_px, half_height_px),
        (-half_width_px, half_height_px),
    ];
    let anchor_shift_x = (0.5 - anchor.x) * half_width_px * 2.0;
    let anchor_shift_y = (0.5 - anchor.y) * half_height_px * 2.0;
    let theta = total_rotation_deg.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    local_corners.map(|(x, y)| {
        let shifted_x = x + anchor_shift_x;
        let shifted_y = y + anchor_shift_y;
        let rotated_x = shifted_x * cos_t - shifted_y * sin_t;
        let rotated_y = shifted_x * sin_t + shifted_y * cos_t;
        (center_px.0 + rotated_x + offset_px.0, center_px.1 + rotated_y + offset_px.1)
    })
}

/// Surface-mode corners: `sprite_math::surface_corner_displacements` gives
/// `(east, north)` offsets from the geographic base; each is independently
/// displaced onto the ellipsoid.
pub fn surface_corner_locations(
    base: LngLat,
    world_width_m: f32,
    world_height_m: f32,
    anchor: Anchor,
    total_rotation_deg: f32,
    offset_east_north_m: (f32, f32),
) -> Corners<LngLat> {
    let displacements = sprite_math::surface_corner_displacements(
        world_width_m,
        world_height_m,
        anchor,
        total_rotation_deg,
        offset_east_north_m,
    );
    displacements.map(|(east, north)| {
        sprite_math::apply_surface_displacement(base, (east, north))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billboard_corners_are_symmetric_around_center_without_rotation() {
        let corners = billboard_corners((100.0, 100.0), 10.0, 5.0, Anchor::CENTER, 0.0, (0.0, 0.0));
        assert_eq!(corners[0], (90.0, 95.0));
        assert_eq!(corners[2], (110.0, 105.0));
    }

    #[test]
    fn bottom_center_anchor_shifts_quad_upward() {
        let corners = billboard_corners((100.0, 100.0), 10.0, 5.0, Anchor::BOTTOM_CENTER, 0.0, (0.0, 0.0));
        assert_eq!(corners[0].1, 90.0);
        assert_eq!(corners[2].1, 100.0);
    }

    #[test]
    fn clamped_half_extents_scale_down_oversized_images() {
        let (half_w, half_h, adjustment) = clamped_billboard_half_extents(200.0, 100.0, 8.0, 64.0);
        assert!(adjustment < 1.0);
        assert!((half_w * 2.0 - 64.0).abs() < 1e-3);
        assert!((half_h - 16.0).abs() < 1e-3);
    }
}
