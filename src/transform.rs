// transform.rs
//! CPU rendition of `vs_main`, used to check what the GPU produces and by
//! hosts without a programmable pipeline.

use glam::{Mat4, Vec2, Vec3, Vec4};
use rayon::prelude::*;
use crate::vertex::Vertex;

/// What the vertex stage hands to the rasterizer for one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VsOutput {
    pub clip_position: Vec4,
    pub color: Vec3,
}

impl VsOutput {
    /// Normalized device coordinates, `None` when w is zero.
    pub fn ndc(&self) -> Option<Vec3> {
        let w = self.clip_position.w;
        if w == 0.0 {
            return None;
        }
        Some(self.clip_position.truncate() / w)
    }

    /// Framebuffer coordinates in pixels, origin top-left, y down.
    pub fn to_screen(&self, width: u32, height: u32) -> Option<Vec2> {
        let ndc = self.ndc()?;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * width as f32,
            (1.0 - ndc.y) * 0.5 * height as f32,
        ))
    }
}

#[inline]
pub fn transform_vertex(view_projection: &Mat4, vertex: &Vertex) -> VsOutput {
    VsOutput {
        clip_position: *view_projection * Vec3::from(vertex.position).extend(1.0),
        color: Vec3::from(vertex.color),
    }
}

/// Runs the stage over a whole vertex list. Invocations are independent, so
/// they are spread over the rayon pool; outputs keep the input order.
pub fn transform_vertices(view_projection: &Mat4, vertices: &[Vertex]) -> Vec<VsOutput> {
    vertices
        .par_iter()
        .map(|v| transform_vertex(view_projection, v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_appends_w() {
        let v = Vertex::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let out = transform_vertex(&Mat4::IDENTITY, &v);
        assert_eq!(out.clip_position, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(out.color, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn origin_picks_translation_column() {
        let m = Mat4::from_cols_array(&[
            1.0, 2.0, 3.0, 4.0,
            5.0, 6.0, 7.0, 8.0,
            9.0, 10.0, 11.0, 12.0,
            13.0, 14.0, 15.0, 16.0,
        ]);
        let v = Vertex::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let out = transform_vertex(&m, &v);
        assert_eq!(out.clip_position, Vec4::new(13.0, 14.0, 15.0, 16.0));
        assert_eq!(out.color, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn degenerate_matrix_does_not_panic() {
        let v = Vertex::new([3.0, -2.0, 5.0], [0.5, 0.5, 0.5]);
        let out = transform_vertex(&Mat4::ZERO, &v);
        assert_eq!(out.clip_position, Vec4::ZERO);
        assert_eq!(out.ndc(), None);
        assert_eq!(out.to_screen(64, 64), None);

        let nan = transform_vertex(&Mat4::from_diagonal(Vec4::splat(f32::NAN)), &v);
        assert!(nan.clip_position.is_nan());
        assert_eq!(nan.color, Vec3::splat(0.5));
    }

    #[test]
    fn screen_mapping_is_y_down() {
        let out = VsOutput { clip_position: Vec4::new(-2.0, 2.0, 0.0, 2.0), color: Vec3::ZERO };
        assert_eq!(out.ndc(), Some(Vec3::new(-1.0, 1.0, 0.0)));
        assert_eq!(out.to_screen(800, 600), Some(Vec2::new(0.0, 0.0)));

        let centre = VsOutput { clip_position: Vec4::W, color: Vec3::ZERO };
        assert_eq!(centre.to_screen(800, 600), Some(Vec2::new(400.0, 300.0)));
    }

    #[test]
    fn batch_keeps_order() {
        let verts: Vec<Vertex> = (0..1000)
            .map(|i| Vertex::new([i as f32, 0.0, 0.0], [0.0; 3]))
            .collect();
        let m = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let out = transform_vertices(&m, &verts);
        assert_eq!(out.len(), verts.len());
        for (i, o) in out.iter().enumerate() {
            assert_eq!(o.clip_position, Vec4::new(i as f32, 1.0, 0.0, 1.0));
        }
    }

    #[test]
    fn empty_batch() {
        assert!(transform_vertices(&Mat4::IDENTITY, &[]).is_empty());
    }
}
