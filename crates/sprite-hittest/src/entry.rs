use sprite_store::SpriteHandle;

/// Persisted screen-space quad corners from the last frame, plus the
/// precomputed AABB used to prune the point test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestEntry {
    pub sprite: SpriteHandle,
    pub sub_layer: u32,
    pub order: u32,
    pub corners: [(f32, f32); 4],
    pub draw_order: u64,
}

impl HitTestEntry {
    pub fn aabb(&self) -> (f32, f32, f32, f32) {
        let xs = self.corners.map(|(x, _)| x);
        let ys = self.corners.map(|(_, y)| y);
        (
            xs.into_iter().fold(f32::INFINITY, f32::min),
            ys.into_iter().fold(f32::INFINITY, f32::min),
            xs.into_iter().fold(f32::NEG_INFINITY, f32::max),
            ys.into_iter().fold(f32::NEG_INFINITY, f32::max),
        )
    }

    pub fn contains_point(&self, point: (f32, f32)) -> bool {
        let (min_x, min_y, max_x, max_y) = self.aabb();
        if point.0 < min_x || point.0 > max_x || point.1 < min_y || point.1 > max_y {
            return false;
        }
        point_in_triangle(point, self.corners[0], self.corners[1], self.corners[2])
            || point_in_triangle(point, self.corners[0], self.corners[2], self.corners[3])
    }
}

/// Point-in-triangle via the sign of the cross product against each edge.
/// Point-in-quad is resolved as the union of triangles (0,1,2) and (0,2,3).
fn point_in_triangle(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let sign = |p1: (f32, f32), p2: (f32, f32), p3: (f32, f32)| {
        (p1.0 - p3.0) * (p2.1 - p3.1) - (p2.0 - p3.0) * (p1.1 - p3.1)
    };
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
