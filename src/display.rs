// In-memory RGB565 framebuffer the face renders into.
//
// The host owns the pixel storage (PSRAM on the watch, a Vec in tests) and
// pushes it to the panel after each frame. Writes are tracked as one dirty
// rectangle so the host can flush only what changed.

use embedded_graphics::{
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::*,
    primitives::Rectangle,
    Pixel,
};

use crate::error::FaceError;

pub struct FrameSurface<'fb> {
    w: u16,
    h: u16,
    fb: &'fb mut [u16],
    dirty: Option<(u16, u16, u16, u16)>, // min x, min y, max x, max y
}

impl<'fb> FrameSurface<'fb> {
    /// Wrap `fb`, which must hold exactly `width * height` pixels.
    pub fn new(width: u16, height: u16, fb: &'fb mut [u16]) -> Result<Self, FaceError> {
        let expected = (width as usize) * (height as usize);
        if fb.len() != expected || expected == 0 {
            return Err(FaceError::BitmapSize {
                expected,
                actual: fb.len(),
            });
        }
        Ok(Self {
            w: width,
            h: height,
            fb,
            dirty: None,
        })
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.w
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.h
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb565> {
        if x >= self.w || y >= self.h {
            return None;
        }
        let raw = self.fb[(y as usize) * (self.w as usize) + (x as usize)];
        Some(Rgb565::from(RawU16::new(raw)))
    }

    /// Native-endian pixel bytes, ready for a DMA upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.fb)
    }

    /// Region touched since the last call, if any.
    pub fn take_dirty(&mut self) -> Option<Rectangle> {
        self.dirty.take().map(|(x0, y0, x1, y1)| {
            Rectangle::with_corners(
                Point::new(x0 as i32, y0 as i32),
                Point::new(x1 as i32, y1 as i32),
            )
        })
    }

    fn mark(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) {
        self.dirty = Some(match self.dirty {
            None => (x0, y0, x1, y1),
            Some((a, b, c, d)) => (a.min(x0), b.min(y0), c.max(x1), d.max(y1)),
        });
    }
}

impl OriginDimensions for FrameSurface<'_> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for FrameSurface<'_> {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        // Track dirty rectangle
        let mut any = false;
        let (mut minx, mut miny, mut maxx, mut maxy) = (self.w, self.h, 0u16, 0u16);

        for Pixel(p, c) in pixels {
            if p.x < 0 || p.y < 0 {
                continue;
            }
            let (x, y) = (p.x as u16, p.y as u16);
            if p.x >= self.w as i32 || p.y >= self.h as i32 {
                continue;
            }
            self.fb[(y as usize) * (self.w as usize) + (x as usize)] = c.into_storage();

            any = true;
            minx = minx.min(x);
            miny = miny.min(y);
            maxx = maxx.max(x);
            maxy = maxy.max(y);
        }

        if any {
            self.mark(minx, miny, maxx, maxy);
        }
        Ok(())
    }

    // Row streaming for images and large fills
    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Rgb565>,
    {
        let inter = area.intersection(&self.bounding_box());
        if inter.size.width == 0 || inter.size.height == 0 {
            return Ok(());
        }

        let area_w = area.size.width as usize;
        let left_skip = (inter.top_left.x - area.top_left.x) as usize;
        let top_skip = (inter.top_left.y - area.top_left.y) as usize;
        let take = inter.size.width as usize;
        let right_skip = area_w - left_skip - take;

        let x0 = inter.top_left.x as usize;
        let y0 = inter.top_left.y as usize;
        let fbw = self.w as usize;

        let mut it = colors.into_iter();

        // Skip rows above intersection
        for _ in 0..top_skip * area_w {
            it.next();
        }

        for ry in 0..inter.size.height as usize {
            for _ in 0..left_skip {
                it.next();
            }
            let row = (y0 + ry) * fbw + x0;
            for dst in &mut self.fb[row..row + take] {
                match it.next() {
                    Some(c) => *dst = c.into_storage(),
                    None => break,
                }
            }
            for _ in 0..right_skip {
                it.next();
            }
        }

        let x1 = (x0 + take - 1) as u16;
        let y1 = (y0 + inter.size.height as usize - 1) as u16;
        self.mark(x0 as u16, y0 as u16, x1, y1);
        Ok(())
    }

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        self.fb.fill(color.into_storage());
        if self.w > 0 && self.h > 0 {
            self.mark(0, 0, self.w - 1, self.h - 1);
        }
        Ok(())
    }
}
