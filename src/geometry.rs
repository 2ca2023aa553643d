//! Clock geometry: hand angles, cached lengths and radii, and the rotating
//! pivot the hands are drawn through.
//!
//! Angles are kept in integer millidegrees so the hand rotations are exact:
//! 0 points at 12 o'clock and values grow clockwise.

use embedded_graphics::prelude::{Point, Size};
use heapless::Vec;
use libm::{cosf, roundf, sinf};

use crate::time_source::TimeSource;

pub const SECOND_HAND_FRACTION: f32 = 0.875;
pub const MINUTE_HAND_FRACTION: f32 = 0.70;
pub const HOUR_HAND_FRACTION: f32 = 0.5;

/// Inset of ordinary hour ticks from the rim.
pub const HOUR_TICK_DEPTH: i32 = 32;
/// Inset of the 12/3/6/9 ticks; numerals sit just inside them.
pub const QUARTER_TICK_DEPTH: i32 = 12;
pub const MINUTE_TICK_DEPTH: i32 = 10;

/// Clockwise angle from 12 o'clock, in thousandths of a degree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Angle(i32);

impl Angle {
    pub const ZERO: Angle = Angle(0);
    const FULL_TURN: i32 = 360_000;

    #[inline]
    pub const fn from_millidegrees(md: i32) -> Self {
        Angle(md)
    }

    #[inline]
    pub const fn millidegrees(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn degrees(self) -> f32 {
        self.0 as f32 / 1000.0
    }

    /// Equivalent angle in `[0, 360)` degrees.
    #[inline]
    pub fn normalized(self) -> Angle {
        Angle(self.0.rem_euclid(Self::FULL_TURN))
    }

    /// Tick `index` of `count` evenly spaced marks.
    pub fn of_tick(index: u32, count: u32) -> Angle {
        Angle((index as i64 * Self::FULL_TURN as i64 / count as i64) as i32)
    }
}

impl core::ops::Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0 + rhs.0)
    }
}

impl core::ops::Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0 - rhs.0)
    }
}

/// Rotation of each hand for one instant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HandAngles {
    pub hour: Angle,
    pub minute: Angle,
    pub second: Angle,
}

impl HandAngles {
    /// hour*30 + minute/2, minute*6, (second + ms/1000)*6 degrees.
    pub fn at(hour: u8, minute: u8, second: u8, millisecond: u16) -> Self {
        let h = (hour % 12) as i32;
        let m = minute as i32;
        Self {
            hour: Angle(h * 30_000 + m * 500),
            minute: Angle(m * 6_000),
            second: Angle(second as i32 * 6_000 + millisecond as i32 * 6),
        }
    }

    pub fn from_time(time: &TimeSource) -> Self {
        Self::at(
            time.hour24(),
            time.minute(),
            time.second(),
            time.millisecond(),
        )
    }
}

/// Sizes derived from the surface. Rebuilt only when the surface changes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Geometry {
    pub size: Size,
    pub center: Point,
    pub radius: f32,
    pub second_len: f32,
    pub minute_len: f32,
    pub hour_len: f32,
    pub tick_outer: f32,
    pub hour_tick_inner: f32,
    pub quarter_tick_inner: f32,
    pub minute_tick_inner: f32,
}

impl Geometry {
    pub fn for_size(size: Size) -> Self {
        let radius = size.width.min(size.height) as f32 / 2.0;
        Self {
            size,
            center: Point::new(size.width as i32 / 2, size.height as i32 / 2),
            radius,
            second_len: radius * SECOND_HAND_FRACTION,
            minute_len: radius * MINUTE_HAND_FRACTION,
            hour_len: radius * HOUR_HAND_FRACTION,
            tick_outer: radius,
            hour_tick_inner: radius - HOUR_TICK_DEPTH as f32,
            quarter_tick_inner: radius - QUARTER_TICK_DEPTH as f32,
            minute_tick_inner: radius - MINUTE_TICK_DEPTH as f32,
        }
    }

    /// Point `r` pixels from the center along `angle`.
    pub fn polar(&self, angle: Angle, r: f32) -> Point {
        let rad = angle.degrees().to_radians();
        Point::new(
            self.center.x + roundf(sinf(rad) * r) as i32,
            self.center.y - roundf(cosf(rad) * r) as i32,
        )
    }
}

const PIVOT_STACK: usize = 4;

/// Accumulating rotation about the face center with save/restore.
///
/// Hands are drawn by rotating by the hour angle, then by the difference to
/// the minute angle, then to the second angle.
#[derive(Clone, Debug)]
pub struct Pivot<'g> {
    geometry: &'g Geometry,
    rotation: Angle,
    saved: Vec<Angle, PIVOT_STACK>,
}

impl<'g> Pivot<'g> {
    pub fn new(geometry: &'g Geometry) -> Self {
        Self {
            geometry,
            rotation: Angle::ZERO,
            saved: Vec::new(),
        }
    }

    #[inline]
    pub fn rotation(&self) -> Angle {
        self.rotation
    }

    pub fn save(&mut self) {
        // deeper nesting than the face ever uses just keeps the outer state
        let _ = self.saved.push(self.rotation);
    }

    pub fn restore(&mut self) {
        if let Some(r) = self.saved.pop() {
            self.rotation = r;
        }
    }

    pub fn rotate(&mut self, delta: Angle) {
        self.rotation = self.rotation + delta;
    }

    /// Segment along the current rotation from radius `from` to radius `to`.
    /// A negative `from` starts behind the center.
    pub fn radial(&self, from: f32, to: f32) -> (Point, Point) {
        (
            self.geometry.polar(self.rotation, from),
            self.geometry.polar(self.rotation, to),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_angles_for_known_times() {
        let a = HandAngles::at(3, 0, 0, 0);
        assert_eq!(a.hour.degrees(), 90.0);
        assert_eq!(a.minute, Angle::ZERO);

        let a = HandAngles::at(15, 30, 15, 500);
        assert_eq!(a.hour.millidegrees(), 105_000);
        assert_eq!(a.minute.millidegrees(), 180_000);
        assert_eq!(a.second.millidegrees(), 93_000);

        let a = HandAngles::at(0, 59, 59, 999);
        assert_eq!(a.hour.millidegrees(), 29_500);
        assert_eq!(a.second.millidegrees(), 359_994);
    }

    #[test]
    fn geometry_follows_short_side() {
        let g = Geometry::for_size(Size::new(400, 360));
        assert_eq!(g.center, Point::new(200, 180));
        assert_eq!(g.radius, 180.0);
        assert_eq!(g.second_len, 157.5);
        assert_eq!(g.minute_len, 180.0 * 0.70);
        assert_eq!(g.hour_len, 90.0);
        assert_eq!(g.hour_tick_inner, 148.0);
        assert_eq!(g.quarter_tick_inner, 168.0);
        assert_eq!(g.minute_tick_inner, 170.0);
    }

    #[test]
    fn polar_uses_clock_convention() {
        let g = Geometry::for_size(Size::new(200, 200));
        assert_eq!(g.polar(Angle::ZERO, 50.0), Point::new(100, 50));
        assert_eq!(g.polar(Angle::from_millidegrees(90_000), 50.0), Point::new(150, 100));
        assert_eq!(g.polar(Angle::from_millidegrees(180_000), 50.0), Point::new(100, 150));
        assert_eq!(g.polar(Angle::from_millidegrees(270_000), 50.0), Point::new(50, 100));
    }

    #[test]
    fn incremental_rotation_lands_exactly() {
        let g = Geometry::for_size(Size::new(200, 200));
        let angles = HandAngles::at(10, 10, 42, 123);
        let mut pivot = Pivot::new(&g);
        pivot.save();
        pivot.rotate(angles.hour);
        assert_eq!(pivot.rotation(), angles.hour);
        pivot.rotate(angles.minute - angles.hour);
        assert_eq!(pivot.rotation(), angles.minute);
        pivot.rotate(angles.second - angles.minute);
        assert_eq!(pivot.rotation(), angles.second);
        pivot.restore();
        assert_eq!(pivot.rotation(), Angle::ZERO);
    }

    #[test]
    fn tick_angles() {
        assert_eq!(Angle::of_tick(3, 12).degrees(), 90.0);
        assert_eq!(Angle::of_tick(59, 60).millidegrees(), 354_000);
        assert_eq!(Angle::from_millidegrees(-6_000).normalized().millidegrees(), 354_000);
    }
}
