use crate::{vec4, Vec3, Vec4};

/// Fixed scale of the ambient channel relative to the diffuse term.
pub const AMBIENT_SCALE: f32 = 0.8;
/// Fixed scale of the specular channel relative to the diffuse term.
pub const SPECULAR_SCALE: f32 = 0.5;

/// The three light channels produced by [`shade`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightLevels {
    pub diffuse:  f32,
    pub ambient:  f32,
    pub specular: f32,
}

/// Lambert intensity of a surface under a directional light.
///
/// The diffuse term is the dot product of `normal` and `light_dir`, clamped so
/// faces pointing away from the light get no contribution. Ambient and
/// specular are fixed scales of the diffuse term, a deliberately simplified
/// approximation rather than a physical shading model.
pub fn shade(normal: Vec3, light_dir: Vec3) -> LightLevels {
    let intensity = normal.dot(light_dir).max(0.0);
    LightLevels {
        diffuse:  intensity,
        ambient:  intensity * AMBIENT_SCALE,
        specular: intensity * SPECULAR_SCALE,
    }
}

/// Background gradient colour at interpolation parameter `t`.
///
/// Blends linearly from a violet at `t = 0` to a teal at `t = 1`, alpha
/// always 1.0. `t` outside `[0, 1]` extrapolates; callers pass in-range
/// values.
pub fn gradient(t: f32) -> Vec4 {
    let start = vec4(0.8, 0.3, 1.0, 1.0);
    let end = vec4(0.2, 0.8, 0.8, 1.0);
    start.lerp(end, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    #[test]
    fn head_on_light_gives_full_levels() {
        let levels = shade(vec3(0.0, 0.0, 1.0), vec3(0.0, 0.0, 1.0));
        assert_eq!(levels, LightLevels {
            diffuse:  1.0,
            ambient:  0.8,
            specular: 0.5,
        });
    }

    #[test]
    fn perpendicular_light_gives_nothing() {
        let levels = shade(vec3(0.0, 0.0, 1.0), vec3(1.0, 0.0, 0.0));
        assert_eq!(levels.diffuse, 0.0);
        assert_eq!(levels.ambient, 0.0);
        assert_eq!(levels.specular, 0.0);
    }

    #[test]
    fn back_face_light_is_clamped_to_zero() {
        let levels = shade(vec3(0.0, 0.0, 1.0), vec3(0.0, 0.0, -1.0));
        assert_eq!(levels.diffuse, 0.0);
    }

    #[test]
    fn gradient_endpoints() {
        assert!((gradient(0.0) - vec4(0.8, 0.3, 1.0, 1.0)).length() < 1e-6);
        assert!((gradient(1.0) - vec4(0.2, 0.8, 0.8, 1.0)).length() < 1e-6);
    }

    #[test]
    fn gradient_midpoint_blends_linearly() {
        assert!((gradient(0.5) - vec4(0.5, 0.55, 0.9, 1.0)).length() < 1e-6);
    }

    #[test]
    fn gradient_alpha_is_always_opaque() {
        for t in [0.0, 0.25, 0.5, 0.75, 1.0] {
            assert_eq!(gradient(t).w, 1.0);
        }
    }
}
