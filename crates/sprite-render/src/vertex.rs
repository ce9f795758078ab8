use sprite_atlas::UvRect;

/// One emitted vertex: clip-space position plus atlas UV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteVertex {
    pub clip: [f32; 4],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderLineVertex {
    pub from_px: (f32, f32),
    pub to_px: (f32, f32),
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderVertex {
    pub corners: [(f32, f32); 4],
    pub width_px: f32,
    pub color: [f32; 4],
}

/// Per-frame output: one quad batch split by `subLayer` for deterministic
/// blending order, plus the optional leader-line and border passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBatches {
    pub quads_by_sub_layer: Vec<(u32, Vec<SpriteVertex>)>,
    pub leader_lines: Vec<LeaderLineVertex>,
    pub borders: Vec<BorderVertex>,
}

impl FrameBatches {
    pub fn push_quad(&mut self, sub_layer: u32, clip_corners: [[f32; 4]; 4], uv: UvRect) {
        let verts = quad_vertices(clip_corners, uv);
        match self.quads_by_sub_layer.iter_mut().find(|(layer, _)| *layer == sub_layer) {
            Some((_, batch)) => batch.extend_from_slice(&verts),
            None => self.quads_by_sub_layer.push((sub_layer, verts.to_vec())),
        }
    }

    pub fn total_quad_vertices(&self) -> usize {
        self.quads_by_sub_layer.iter().map(|(_, batch)| batch.len()).sum()
    }
}

/// Two triangles, `(0,1,2)` and `(0,2,3)`, matching the hit-tester's
/// point-in-quad convention.
fn quad_vertices(corners: [[f32; 4]; 4], uv: UvRect) -> [SpriteVertex; 6] {
    let uvs = [(uv.u0, uv.v0), (uv.u1, uv.v0), (uv.u1, uv.v1), (uv.u0, uv.v1)];
    let vertex = |index: usize| SpriteVertex { clip: corners[index], uv: [uvs[index].0, uvs[index].1] };
    [vertex(0), vertex(1), vertex(2), vertex(0), vertex(2), vertex(3)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_quad_groups_by_sub_layer() {
        let mut batches = FrameBatches::default();
        let corners = [[0.0; 4]; 4];
        batches.push_quad(0, corners, UvRect::UNPLACED);
        batches.push_quad(1, corners, UvRect::UNPLACED);
        batches.push_quad(0, corners, UvRect::UNPLACED);
        assert_eq!(batches.quads_by_sub_layer.len(), 2);
        assert_eq!(batches.total_quad_vertices(), 18);
    }

    #[test]
    fn quad_vertices_emit_two_triangles_sharing_the_diagonal() {
        let corners = [
            [0.0, 0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 1.0],
            [1.0, 1.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 1.0],
        ];
        let verts = quad_vertices(corners, UvRect { u0: 0.0, v0: 0.0, u1: 1.0, v1: 1.0 });
        assert_eq!(verts[0].clip, verts[3].clip);
        assert_eq!(verts[2].clip, verts[4].clip);
    }
}
