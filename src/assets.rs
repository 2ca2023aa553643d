//! RGB565 bitmaps handed over by the host: the face background, decorative
//! sprites, the disconnected badge and complication icons.
//!
//! Decoding from a package is the host's business; this module only scales,
//! desaturates and draws pixels that are already in memory.

use alloc::vec::Vec;

use embedded_graphics::{
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::{DrawTarget, IntoStorage, Point, RgbColor, Size},
    primitives::Rectangle,
    Pixel,
};

use crate::error::FaceError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
    transparent: Option<u16>,
}

impl Bitmap {
    /// Wrap raw RGB565 pixels, row-major.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u16>) -> Result<Self, FaceError> {
        let expected = (width as usize) * (height as usize);
        if pixels.len() != expected || expected == 0 {
            return Err(FaceError::BitmapSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            transparent: None,
        })
    }

    /// Solid block of one color.
    pub fn filled(width: u32, height: u32, color: Rgb565) -> Result<Self, FaceError> {
        let n = (width as usize) * (height as usize);
        Self::from_raw(width, height, alloc::vec![color.into_storage(); n])
    }

    /// Treat `key` as see-through when drawing (sprites without alpha).
    pub fn with_transparent(mut self, key: Rgb565) -> Self {
        self.transparent = Some(key.into_storage());
        self
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub fn raw(&self) -> &[u16] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let raw = self.pixels[(y * self.width + x) as usize];
        Some(Rgb565::from(RawU16::new(raw)))
    }

    /// Uniformly scale so the width becomes `target_width` (nearest neighbour).
    pub fn scaled_to_width(&self, target_width: u32) -> Bitmap {
        if target_width == self.width || target_width == 0 {
            return self.clone();
        }
        let target_height =
            ((self.height as u64 * target_width as u64) / self.width as u64).max(1) as u32;

        let mut pixels = Vec::with_capacity((target_width * target_height) as usize);
        for ty in 0..target_height {
            let sy = (ty as u64 * self.height as u64 / target_height as u64) as u32;
            let row = (sy * self.width) as usize;
            for tx in 0..target_width {
                let sx = (tx as u64 * self.width as u64 / target_width as u64) as usize;
                pixels.push(self.pixels[row + sx]);
            }
        }
        Bitmap {
            width: target_width,
            height: target_height,
            pixels,
            transparent: self.transparent,
        }
    }

    /// Fully desaturated copy.
    pub fn grayscale(&self) -> Bitmap {
        let pixels = self
            .pixels
            .iter()
            .map(|&p| gray_of(Rgb565::from(RawU16::new(p))).into_storage())
            .collect();
        Bitmap {
            width: self.width,
            height: self.height,
            pixels,
            transparent: self.transparent,
        }
    }

    /// Draw with the top-left corner at `at`. Draw errors are dropped.
    pub fn draw_at<D>(&self, target: &mut D, at: Point)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let area = Rectangle::new(at, self.size());
        match self.transparent {
            None => {
                let colors = self.pixels.iter().map(|&p| Rgb565::from(RawU16::new(p)));
                target.fill_contiguous(&area, colors).ok();
            }
            Some(key) => {
                let w = self.width as i32;
                let pixels = self
                    .pixels
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| **p != key)
                    .map(|(i, &p)| {
                        let i = i as i32;
                        Pixel(at + Point::new(i % w, i / w), Rgb565::from(RawU16::new(p)))
                    });
                target.draw_iter(pixels).ok();
            }
        }
    }
}

/// Luma with the saturation-zero weights (0.213, 0.715, 0.072), in 8 bits.
pub fn luma(c: Rgb565) -> u8 {
    // widen 5/6-bit channels to 8 bits
    let r = (c.r() as u32 * 255) / 31;
    let g = (c.g() as u32 * 255) / 63;
    let b = (c.b() as u32 * 255) / 31;
    ((r * 54 + g * 183 + b * 18) / 255) as u8
}

pub fn gray_of(c: Rgb565) -> Rgb565 {
    let y = luma(c);
    Rgb565::new(y >> 3, y >> 2, y >> 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn rejects_wrong_pixel_count() {
        assert_eq!(
            Bitmap::from_raw(4, 4, vec![0; 15]),
            Err(FaceError::BitmapSize {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn scales_uniformly() {
        let src = Bitmap::from_raw(2, 1, vec![Rgb565::RED.into_storage(), Rgb565::BLUE.into_storage()])
            .unwrap();
        let big = src.scaled_to_width(4);
        assert_eq!(big.size(), Size::new(4, 2));
        assert_eq!(big.pixel(0, 0), Some(Rgb565::RED));
        assert_eq!(big.pixel(1, 1), Some(Rgb565::RED));
        assert_eq!(big.pixel(2, 0), Some(Rgb565::BLUE));
        assert_eq!(big.pixel(3, 1), Some(Rgb565::BLUE));
    }

    #[test]
    fn grayscale_keeps_extremes_and_drops_hue() {
        assert_eq!(gray_of(Rgb565::WHITE), Rgb565::WHITE);
        assert_eq!(gray_of(Rgb565::BLACK), Rgb565::BLACK);

        let g = gray_of(Rgb565::GREEN);
        // gray means the 8-bit channel values line up
        assert_eq!(g.r() << 1, g.g() & !1);
        assert!(luma(Rgb565::GREEN) > luma(Rgb565::RED));
        assert!(luma(Rgb565::RED) > luma(Rgb565::BLUE));
    }
}
