use std::ops::Mul;

use glam::Mat4;

use crate::{vec3, Vec3};

/// 4x4 matrix stored as a flat row-major array.
///
/// This mirrors the wire layout the engine has always used, which is the
/// transpose of glam's column-major `Mat4`; the `From` conversions do the
/// swap at the seam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    pub rows: [f32; 16],
}

impl Matrix4 {
    #[rustfmt::skip]
    pub const IDENTITY: Self = Self {
        rows: [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub const fn from_rows(rows: [f32; 16]) -> Self { Self { rows } }

    pub const fn as_rows(&self) -> &[f32; 16] { &self.rows }

    /// Standard matrix product, the naive 64-multiply-add triple loop.
    pub fn multiply(&self, rhs: &Matrix4) -> Matrix4 {
        let mut rows = [0.0; 16];
        for i in 0..4 {
            for j in 0..4 {
                let mut acc = 0.0;
                for k in 0..4 {
                    acc += self.rows[i * 4 + k] * rhs.rows[k * 4 + j];
                }
                rows[i * 4 + j] = acc;
            }
        }
        Matrix4 { rows }
    }

    /// Transforms a point, treating the matrix as affine (w row ignored).
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let r = &self.rows;
        vec3(
            r[0] * p.x + r[1] * p.y + r[2] * p.z + r[3],
            r[4] * p.x + r[5] * p.y + r[6] * p.z + r[7],
            r[8] * p.x + r[9] * p.y + r[10] * p.z + r[11],
        )
    }

    /// Transforms a direction, ignoring the translation column.
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        vec3(
            r[0] * v.x + r[1] * v.y + r[2] * v.z,
            r[4] * v.x + r[5] * v.y + r[6] * v.z,
            r[8] * v.x + r[9] * v.y + r[10] * v.z,
        )
    }
}

impl Default for Matrix4 {
    fn default() -> Self { Self::IDENTITY }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 { self.multiply(&rhs) }
}

impl From<Mat4> for Matrix4 {
    fn from(m: Mat4) -> Self {
        Self {
            rows: m.transpose().to_cols_array(),
        }
    }
}

impl From<Matrix4> for Mat4 {
    fn from(m: Matrix4) -> Self { Mat4::from_cols_array(&m.rows).transpose() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    fn sample() -> Matrix4 {
        Matrix4::from_rows([
             1.0,  2.0,  3.0,  4.0,
             5.0,  6.0,  7.0,  8.0,
             9.0, 10.0, 11.0, 12.0,
            13.0, 14.0, 15.0, 16.0,
        ])
    }

    #[test]
    fn identity_is_a_left_and_right_unit() {
        let a = sample();
        assert_eq!(Matrix4::IDENTITY * a, a);
        assert_eq!(a * Matrix4::IDENTITY, a);
    }

    #[test]
    fn multiply_matches_glam() {
        let a = Matrix4::from(Mat4::from_rotation_x(0.7));
        let b = Matrix4::from(Mat4::from_rotation_y(-1.2));
        let ours = a * b;
        let glams = Matrix4::from(Mat4::from(a) * Mat4::from(b));
        for (x, y) in ours.rows.iter().zip(glams.rows) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[rustfmt::skip]
    #[test]
    fn known_product() {
        let a = sample();
        let b = Matrix4::from_rows([
            1.0, 0.0, 0.0, 1.0,
            0.0, 1.0, 0.0, 2.0,
            0.0, 0.0, 1.0, 3.0,
            0.0, 0.0, 0.0, 1.0,
        ]);
        // a * translation applies the translation to a's w column
        let expected = Matrix4::from_rows([
             1.0,  2.0,  3.0,  18.0,
             5.0,  6.0,  7.0,  46.0,
             9.0, 10.0, 11.0,  74.0,
            13.0, 14.0, 15.0, 102.0,
        ]);
        assert_eq!(a * b, expected);
    }

    #[test]
    fn glam_round_trip_preserves_rows() {
        let a = sample();
        assert_eq!(Matrix4::from(Mat4::from(a)), a);
    }

    #[rustfmt::skip]
    #[test]
    fn transform_point_applies_translation_but_transform_vector_does_not() {
        let m = Matrix4::from_rows([
            1.0, 0.0, 0.0, 10.0,
            0.0, 1.0, 0.0, 20.0,
            0.0, 0.0, 1.0, 30.0,
            0.0, 0.0, 0.0,  1.0,
        ]);
        assert_eq!(m.transform_point(vec3(1.0, 2.0, 3.0)), vec3(11.0, 22.0, 33.0));
        assert_eq!(m.transform_vector(vec3(1.0, 2.0, 3.0)), vec3(1.0, 2.0, 3.0));
    }
}
