use glam::Mat4;
use image::{Rgba, RgbaImage};
use log::debug;
use rayon::prelude::*;

use super::{gradient, shade, BoxMesh, Matrix4, VERTS_PER_FACE};
use crate::{vec3, Vec3, Vec4};

/// Distance from the eye to the centre of the product box.
const CAMERA_DISTANCE: f32 = 3.0;
/// Direction from a surface towards the key light.
const LIGHT_DIR: Vec3 = Vec3::new(-0.37139067, 0.5570860, -0.7427813); // (-0.4, 0.6, -0.8) normalized
/// Base colour of the product box.
const BASE_COLOUR: Vec3 = Vec3::new(0.1, 0.5, 1.0);
/// Floor on the light level, so faces turned away from the key light stay visible.
const MIN_SHADE: f32 = 0.15;

/// A CPU frame of packed B8G8R8A8 pixels, the swapchain's byte order.
pub struct Framebuffer {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }
}

/// Packs a colour into a B8G8R8A8 pixel.
pub fn pack_bgra(colour: Vec4) -> u32 {
    let c = colour.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
    u32::from_le_bytes([c.z as u8, c.y as u8, c.x as u8, c.w as u8])
}

/// Rasterizes the static product preview: a gradient backdrop with the
/// product box floating in front of it, lit by a fixed key light.
pub struct PreviewRenderer {
    dimensions: Vec3,
}

impl PreviewRenderer {
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            dimensions: vec3(width, height, depth),
        }
    }

    pub fn draw(&self, framebuffer: &mut Framebuffer) {
        let width = framebuffer.width;
        let height = framebuffer.height;

        // backdrop: vertical gradient, one colour per scanline
        framebuffer
            .pixels
            .par_chunks_exact_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let t = y as f32 / (height - 1) as f32;
                row.fill(pack_bgra(gradient(t)));
            });

        let mesh = BoxMesh::new(self.dimensions.x, self.dimensions.y, self.dimensions.z);

        // fixed three-quarter view: yaw first, then pitch down a little
        let view = Matrix4::from(Mat4::from_rotation_x(-0.45)) * Matrix4::from(Mat4::from_rotation_y(0.65));

        // project every corner and keep each face's view-space normal
        let mut faces: Vec<([Vec3; VERTS_PER_FACE], Vec3)> = Vec::with_capacity(mesh.faces().count());
        for (quad, normal) in mesh.faces().zip(BoxMesh::FACE_NORMALS) {
            let mut projected = [Vec3::ZERO; VERTS_PER_FACE];
            for (out, v) in projected.iter_mut().zip(quad) {
                *out = Self::project(view.transform_point(*v), width, height);
            }
            faces.push((projected, view.transform_vector(normal)));
        }

        // painter's order: far faces first, then the near ones over them
        faces.sort_by(|(a, _), (b, _)| {
            let za = a.iter().map(|v| v.z).sum::<f32>();
            let zb = b.iter().map(|v| v.z).sum::<f32>();
            zb.total_cmp(&za)
        });

        let mut drawn = 0;
        for (quad, normal) in &faces {
            // the camera looks down +z, so faces whose normal points away are hidden
            if normal.z >= 0.0 {
                continue;
            }

            let levels = shade(*normal, LIGHT_DIR);
            let lit = BASE_COLOUR * levels.diffuse.max(MIN_SHADE);
            let pixel = pack_bgra(lit.extend(1.0));

            Self::fill_triangle(framebuffer, quad[0], quad[1], quad[2], pixel);
            Self::fill_triangle(framebuffer, quad[0], quad[2], quad[3], pixel);
            drawn += 1;
        }
        debug!("rasterized preview: {} of {} faces visible", drawn, faces.len());
    }

    /// Renders into a fresh RGBA image, for headless preview export.
    pub fn render_image(&self, width: u32, height: u32) -> RgbaImage {
        let mut framebuffer = Framebuffer::new(width as usize, height as usize);
        self.draw(&mut framebuffer);

        RgbaImage::from_fn(width, height, |x, y| {
            let [b, g, r, a] = framebuffer.pixels[(y * width + x) as usize].to_le_bytes();
            Rgba([r, g, b, a])
        })
    }

    /// Pinhole projection into pixel coordinates; z is kept for depth sorting.
    fn project(p: Vec3, width: usize, height: usize) -> Vec3 {
        let z = p.z + CAMERA_DISTANCE;
        let scale = height as f32 / z;
        vec3(
            width as f32 / 2.0 + p.x * scale,
            height as f32 / 2.0 - p.y * scale,
            z,
        )
    }

    fn edge(a: Vec3, b: Vec3, c: Vec3) -> f32 { (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x) }

    fn fill_triangle(framebuffer: &mut Framebuffer, v0: Vec3, v1: Vec3, v2: Vec3, pixel: u32) {
        let area = Self::edge(v0, v1, v2);
        if area.abs() < f32::EPSILON {
            return;
        }

        let max_x = (framebuffer.width - 1) as f32;
        let max_y = (framebuffer.height - 1) as f32;
        let x0 = v0.x.min(v1.x).min(v2.x).floor().clamp(0.0, max_x) as usize;
        let x1 = v0.x.max(v1.x).max(v2.x).ceil().clamp(0.0, max_x) as usize;
        let y0 = v0.y.min(v1.y).min(v2.y).floor().clamp(0.0, max_y) as usize;
        let y1 = v0.y.max(v1.y).max(v2.y).ceil().clamp(0.0, max_y) as usize;

        for y in y0..=y1 {
            let row = &mut framebuffer.pixels[y * framebuffer.width..(y + 1) * framebuffer.width];
            for (x, out) in row.iter_mut().enumerate().take(x1 + 1).skip(x0) {
                let p = vec3(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                let w0 = Self::edge(v1, v2, p);
                let w1 = Self::edge(v2, v0, p);
                let w2 = Self::edge(v0, v1, p);

                // accept either winding, the sign just has to agree with the area
                let inside = if area > 0.0 {
                    w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                } else {
                    w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                };
                if inside {
                    *out = pixel;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: usize = 64;
    const H: usize = 64;

    fn rendered() -> Framebuffer {
        let mut framebuffer = Framebuffer::new(W, H);
        PreviewRenderer::new(1.2, 1.2, 1.2).draw(&mut framebuffer);
        framebuffer
    }

    #[test]
    fn top_scanline_is_pure_gradient() {
        let frame = rendered();
        let expected = pack_bgra(gradient(0.0));
        assert!(frame.pixels[..W].iter().all(|&p| p == expected));
    }

    #[test]
    fn the_box_covers_the_centre() {
        let frame = rendered();
        let centre = frame.pixels[(H / 2) * W + W / 2];
        let background = pack_bgra(gradient((H / 2) as f32 / (H - 1) as f32));
        assert_ne!(centre, background);
    }

    #[test]
    fn render_image_matches_requested_dimensions() {
        let img = PreviewRenderer::new(1.0, 2.0, 1.0).render_image(32, 48);
        assert_eq!(img.dimensions(), (32, 48));
        // image rows carry the same gradient as the framebuffer, unswizzled to RGBA
        let expected = pack_bgra(gradient(0.0)).to_le_bytes();
        let Rgba([r, g, b, a]) = *img.get_pixel(0, 0);
        assert_eq!([b, g, r, a], expected);
    }

    #[test]
    fn pack_bgra_clamps_and_orders_channels() {
        assert_eq!(pack_bgra(crate::vec4(1.0, 0.0, 0.0, 1.0)), 0xFFFF_0000);
        assert_eq!(pack_bgra(crate::vec4(0.0, 0.0, 2.0, 1.0)), 0xFF00_00FF);
        assert_eq!(pack_bgra(crate::vec4(-1.0, 0.0, 0.0, 0.0)), 0x0000_0000);
    }
}
