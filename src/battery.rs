// Battery indicator: sampling policy and the glyph drawn at the top of the face.

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::{DrawTarget, Point, Primitive, RgbColor, Size},
    primitives::{PrimitiveStyle, Rectangle},
    Drawable,
};
use log::debug;

/// Resample at least this often.
pub const MAX_SAMPLE_AGE_MS: i64 = 30 * 60 * 1000;
/// Also resample whenever the minute is a multiple of this.
pub const SAMPLE_MINUTE_GRAIN: u8 = 15;

/// Height of the empty part of the gauge in pixels.
pub const GAUGE_HEIGHT: i32 = 36;

/// Last reading and when it was taken.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BatteryCache {
    level: Option<u8>,
    checked_ms: Option<i64>,
}

impl BatteryCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn level(&self) -> Option<u8> {
        self.level
    }

    /// True when a fresh sample should be taken.
    pub fn is_stale(&self, now_ms: i64, minute: u8) -> bool {
        match (self.level, self.checked_ms) {
            (Some(_), Some(at)) => {
                minute % SAMPLE_MINUTE_GRAIN == 0 || now_ms - at > MAX_SAMPLE_AGE_MS
            }
            _ => true,
        }
    }

    /// Cached level, calling `sample` first if the cache is stale.
    pub fn read(&mut self, now_ms: i64, minute: u8, sample: impl FnOnce() -> Option<u8>) -> Option<u8> {
        if self.is_stale(now_ms, minute) {
            self.checked_ms = Some(now_ms);
            let fresh = sample().map(|l| l.min(100));
            debug!("battery sampled: {:?}", fresh);
            // an absent reading leaves the cache empty so the next frame retries
            self.level = fresh;
        }
        self.level
    }
}

/// Four tiers: >75 green, >50 yellow, >25 orange, else red.
pub fn tier_color(level: u8) -> Rgb565 {
    match level {
        76.. => Rgb565::new(0x00, 0xFF >> 2, 0x00),
        51..=75 => Rgb565::new(0xFF >> 3, 0xFF >> 2, 0x00),
        26..=50 => Rgb565::new(0xFF >> 3, 0xA5 >> 2, 0x00),
        _ => Rgb565::new(0xFF >> 3, 0x00, 0x00),
    }
}

/// Height of the drained (black) part of the gauge.
#[inline]
pub fn drained_height(level: u8) -> i32 {
    GAUGE_HEIGHT * (100 - level.min(100) as i32) / 100
}

/// Draw the glyph with `origin` as the layout anchor.
pub fn draw_gauge<D>(target: &mut D, origin: Point, level: u8)
where
    D: DrawTarget<Color = Rgb565>,
{
    let fill = PrimitiveStyle::with_fill(tier_color(level));

    // terminal nub, then body
    Rectangle::new(origin + Point::new(20, 63), Size::new(16, 10))
        .into_styled(fill)
        .draw(target)
        .ok();
    Rectangle::new(origin + Point::new(17, 68), Size::new(24, 40))
        .into_styled(fill)
        .draw(target)
        .ok();

    let drained = drained_height(level);
    if drained > 0 {
        Rectangle::new(origin + Point::new(19, 72), Size::new(20, drained as u32))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::BLACK))
            .draw(target)
            .ok();
    }
}
