// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use glam::*;

/// Default size of a [`Framebuffer`] in pixels.
pub const FRAMEBUFFER_SIZE: u32 = 128;

/// A vertex after the vertex stage.
#[derive(Copy, Clone, Debug)]
pub struct RasterVertex {
    /// Clip space position.
    pub position: Vec4,
    /// Interpolated across the triangle.
    pub color: Vec4,
}

/// A software color buffer. Pixel (0, 0) is the bottom left, like WebGL.
#[derive(Clone, Debug, PartialEq)]
pub struct Framebuffer {
    size: UVec2,
    pixels: Vec<Vec4>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new(UVec2::splat(FRAMEBUFFER_SIZE))
    }
}

impl Framebuffer {
    /// Creates a transparent black framebuffer.
    pub fn new(size: UVec2) -> Self {
        Self {
            size,
            pixels: vec![Vec4::ZERO; (size.x * size.y) as usize],
        }
    }

    /// Size in pixels.
    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Sets every pixel to `color`.
    pub fn clear(&mut self, color: Vec4) {
        self.pixels.fill(color);
    }

    /// Color of the pixel at `x`, `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[(y * self.size.x + x) as usize]
    }

    /// Color of the pixel containing normalized device coordinates `ndc`.
    pub fn sample(&self, ndc: Vec2) -> Vec4 {
        let window = (ndc * 0.5 + 0.5) * self.size.as_vec2();
        let max = self.size.as_vec2() - 1.0;
        let pixel = window.floor().max(Vec2::ZERO).min(max);
        self.pixel(pixel.x as u32, pixel.y as u32)
    }

    /// Fills the pixels whose centers are covered by a triangle, interpolating color linearly.
    /// Both windings are filled.
    pub fn fill_triangle(&mut self, vertices: [RasterVertex; 3]) {
        let size = self.size.as_vec2();
        let window = vertices.map(|v| {
            let ndc = v.position.truncate().truncate() / v.position.w;
            (ndc * 0.5 + 0.5) * size
        });

        let area = edge(window[0], window[1], window[2]);
        if area == 0.0 || !area.is_finite() {
            return;
        }

        let min = window[0].min(window[1]).min(window[2]).floor().max(Vec2::ZERO);
        let max = window[0].max(window[1]).max(window[2]).ceil().min(size);

        for y in min.y as u32..max.y as u32 {
            for x in min.x as u32..max.x as u32 {
                let center = vec2(x as f32 + 0.5, y as f32 + 0.5);
                let weights = vec3(
                    edge(window[1], window[2], center),
                    edge(window[2], window[0], center),
                    edge(window[0], window[1], center),
                ) / area;

                if weights.min_element() < 0.0 {
                    continue;
                }

                let color = vertices[0].color * weights.x
                    + vertices[1].color * weights.y
                    + vertices[2].color * weights.z;
                let i = (y * self.size.x + x) as usize;
                self.pixels[i] = color;
            }
        }
    }
}

/// Twice the signed area of the triangle `a`, `b`, `c`.
fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, color: Vec4) -> RasterVertex {
        RasterVertex {
            position: vec4(x, y, 0.0, 1.0),
            color,
        }
    }

    #[test]
    fn test_fill_both_windings() {
        let red = vec4(1.0, 0.0, 0.0, 1.0);
        let ccw = [
            vertex(-1.0, -1.0, red),
            vertex(1.0, -1.0, red),
            vertex(-1.0, 1.0, red),
        ];
        let mut cw = ccw;
        cw.swap(1, 2);

        let mut a = Framebuffer::new(uvec2(4, 4));
        a.fill_triangle(ccw);
        let mut b = Framebuffer::new(uvec2(4, 4));
        b.fill_triangle(cw);
        assert_eq!(a, b);

        assert_eq!(a.pixel(0, 0), red);
        assert_eq!(a.pixel(3, 3), Vec4::ZERO);
        assert_eq!(a.sample(vec2(-0.9, -0.9)), red);
    }

    #[test]
    fn test_degenerate() {
        let white = Vec4::ONE;
        let mut frame = Framebuffer::new(uvec2(4, 4));
        frame.fill_triangle([vertex(0.0, 0.0, white); 3]);
        assert_eq!(frame, Framebuffer::new(uvec2(4, 4)));
    }
}
