//! Offscreen color+alpha image.

use crate::{Color, MarchError, Resolution};

/// Image written by the offscreen pass, row-major, row 0 at the top.
///
/// Pixels are straight-alpha linear RGBA; [`OffscreenBuffer::to_premultiplied_rgba8`]
/// converts them for compositing.
#[derive(Debug, Clone, PartialEq)]
pub struct OffscreenBuffer {
    resolution: Resolution,
    pixels: Vec<Color>,
}

impl OffscreenBuffer {
    /// Allocate a transparent buffer.
    ///
    /// Fails with [`MarchError::Resource`] instead of aborting when the
    /// allocation cannot be satisfied.
    pub fn allocate(resolution: Resolution) -> Result<Self, MarchError> {
        let resource_error = || MarchError::Resource {
            width: resolution.width,
            height: resolution.height,
        };

        let count = (resolution.width as usize)
            .checked_mul(resolution.height as usize)
            .ok_or_else(resource_error)?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(count).map_err(|_| resource_error())?;
        pixels.resize(count, Color::ZERO);

        Ok(Self { resolution, pixels })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// All pixels in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Convert to straight-alpha sRGB RGBA bytes, as image files store them.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.encode(color_to_rgba8)
    }

    /// Convert to premultiplied sRGB RGBA bytes for texture upload.
    ///
    /// Filtering premultiplied texels blends edge colors towards transparent
    /// instead of towards black.
    pub fn to_premultiplied_rgba8(&self) -> Vec<u8> {
        self.encode(color_to_premultiplied_rgba8)
    }

    fn encode(&self, convert: fn(Color) -> [u8; 4]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&convert(*color));
        }
        bytes
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.resolution.width && y < self.resolution.height);
        y as usize * self.resolution.width as usize + x as usize
    }
}

/// Encode a linear channel with the sRGB transfer curve.
#[inline]
pub fn linear_to_srgb(linear: f32) -> f32 {
    let c = linear.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Convert a linear color to 8-bit sRGB with linear alpha.
pub fn color_to_rgba8(color: Color) -> [u8; 4] {
    let encode = |c: f32| (255.0 * linear_to_srgb(c) + 0.5) as u8;
    [
        encode(color.x),
        encode(color.y),
        encode(color.z),
        (255.0 * color.w.clamp(0.0, 1.0) + 0.5) as u8,
    ]
}

/// Convert a linear color to 8-bit sRGB with its color scaled by alpha.
///
/// Premultiplied in linear space, so an sRGB texture decodes it back to
/// `rgb * a`.
pub fn color_to_premultiplied_rgba8(color: Color) -> [u8; 4] {
    let alpha = color.w.clamp(0.0, 1.0);
    color_to_rgba8((color.truncate() * alpha).extend(alpha))
}
