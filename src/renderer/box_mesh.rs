use crate::{vec3, Vec3};

pub const FACES_PER_BOX: usize = 6;
pub const VERTS_PER_FACE: usize = 4;
pub const VERTS_PER_BOX: usize = FACES_PER_BOX * VERTS_PER_FACE;

/// Unindexed vertex list for an axis-aligned box centered at the origin.
///
/// 6 faces * 4 corners, with corners duplicated per face rather than shared
/// through an index buffer. The vertex count is always [`VERTS_PER_BOX`]
/// whatever the dimensions. Face order is front, back, top, bottom, right,
/// left, each wound counter-clockwise seen from outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMesh {
    pub vertices: [Vec3; VERTS_PER_BOX],
}

impl BoxMesh {
    /// Outward normal of each face, in face order.
    pub const FACE_NORMALS: [Vec3; FACES_PER_BOX] =
        [Vec3::Z, Vec3::NEG_Z, Vec3::Y, Vec3::NEG_Y, Vec3::X, Vec3::NEG_X];

    #[rustfmt::skip]
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        let w = width / 2.0;
        let h = height / 2.0;
        let d = depth / 2.0;

        let vertices = [
            // front
            vec3(-w, -h,  d), vec3( w, -h,  d), vec3( w,  h,  d), vec3(-w,  h,  d),
            // back
            vec3(-w, -h, -d), vec3(-w,  h, -d), vec3( w,  h, -d), vec3( w, -h, -d),
            // top
            vec3(-w,  h, -d), vec3(-w,  h,  d), vec3( w,  h,  d), vec3( w,  h, -d),
            // bottom
            vec3(-w, -h, -d), vec3( w, -h, -d), vec3( w, -h,  d), vec3(-w, -h,  d),
            // right
            vec3( w, -h, -d), vec3( w,  h, -d), vec3( w,  h,  d), vec3( w, -h,  d),
            // left
            vec3(-w, -h, -d), vec3(-w, -h,  d), vec3(-w,  h,  d), vec3(-w,  h, -d),
        ];

        Self { vertices }
    }

    /// The corner quads, one per face, in face order.
    pub fn faces(&self) -> impl Iterator<Item = &[Vec3]> { self.vertices.chunks_exact(VERTS_PER_FACE) }

    pub fn len_vertices(&self) -> u32 { self.vertices.len() as u32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_corners_sit_on_the_unit_box() {
        let mesh = BoxMesh::new(2.0, 2.0, 2.0);
        assert_eq!(mesh.len_vertices(), 24);
        for v in mesh.vertices {
            for c in [v.x, v.y, v.z] {
                assert!(c == 1.0 || c == -1.0, "coordinate {} not on the unit box", c);
            }
        }
    }

    #[test]
    fn vertex_count_is_fixed_for_any_dimensions() {
        for dims in [(1.0, 2.0, 3.0), (0.5, 0.5, 10.0), (0.0, 0.0, 0.0)] {
            let mesh = BoxMesh::new(dims.0, dims.1, dims.2);
            assert_eq!(mesh.len_vertices(), VERTS_PER_BOX as u32);
        }
    }

    #[test]
    fn faces_wind_counter_clockwise_around_their_outward_normal() {
        let mesh = BoxMesh::new(2.0, 3.0, 4.0);
        for (quad, expected) in mesh.faces().zip(BoxMesh::FACE_NORMALS) {
            let normal = (quad[1] - quad[0]).cross(quad[2] - quad[0]).normalize();
            assert!((normal - expected).length() < 1e-6, "face normal {:?} != {:?}", normal, expected);
        }
    }

    #[test]
    fn half_extents_come_from_the_dimensions() {
        let mesh = BoxMesh::new(4.0, 6.0, 8.0);
        for v in mesh.vertices {
            assert_eq!(v.x.abs(), 2.0);
            assert_eq!(v.y.abs(), 3.0);
            assert_eq!(v.z.abs(), 4.0);
        }
    }
}
