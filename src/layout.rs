// Fixed pixel positions for the face, tuned on a 400x400 round panel.
//
// Nothing here scales with the surface; only the hand and tick geometry
// follow the surface size (see geometry.rs).

use embedded_graphics::{
    prelude::{Point, Size},
    primitives::Rectangle,
};

use crate::complication::{default_slot_bounds, Slot};

/// Where a decorative sprite goes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OverlayAnchor {
    pub at: Point,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceLayout {
    pub slots: [Rectangle; 3],
    /// Origin the battery glyph offsets are measured from.
    pub battery_origin: Point,
    /// Black plate behind the disconnected icon. It sits at (96,100) in the
    /// upper-left quadrant, not at the reference face's (176,60), where the
    /// battery glyph drawn after it would cover it.
    pub badge: Rectangle,
    /// Icon inset inside the badge plate.
    pub badge_icon_inset: Point,
    /// Distance of the "h:mm" baseline above the hub.
    pub readout_lift: i32,
    /// Extra lift of the readout in ambient mode.
    pub readout_ambient_lift: i32,
    /// Day/date line offset below the hub.
    pub day_date_drop: i32,
    /// Numerals distance in from the rim.
    pub numeral_inset: i32,
}

impl FaceLayout {
    #[inline]
    pub fn slot_bounds(&self) -> [Rectangle; 3] {
        self.slots
    }
}

impl Default for FaceLayout {
    fn default() -> Self {
        Self {
            slots: Slot::ALL.map(default_slot_bounds),
            battery_origin: Point::new(171, 2),
            badge: Rectangle::new(Point::new(96, 100), Size::new(48, 48)),
            badge_icon_inset: Point::new(6, 8),
            readout_lift: 46,
            readout_ambient_lift: 20,
            day_date_drop: 30,
            numeral_inset: 44,
        }
    }
}
