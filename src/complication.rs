//! Complication slots and their payloads.
//!
//! This module provides:
//! - `Slot`, the three fixed complication positions and their external ids
//! - `Payload`, an immutable data delivery for a slot
//! - `ComplicationStore`, the bounded slot table with rectangles and styles
//! - `ComplicationSlot::draw`, each slot's own draw primitive
//!
//! Payloads are never edited in place; a new delivery replaces the old one.

use embedded_graphics::{
    geometry::AngleUnit,
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::Rgb565,
    prelude::{DrawTarget, Point, Primitive, RgbColor, Size},
    primitives::{Arc, Circle, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
    Drawable,
};
use heapless::String;
use log::{debug, warn};

use crate::assets::Bitmap;
use crate::error::FaceError;
use crate::mode::DisplayMode;

/// Capacity of short-text fields.
pub const SHORT_TEXT_CAP: usize = 16;
pub type ShortText = String<SHORT_TEXT_CAP>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Left,
    Center,
    Right,
}

impl Slot {
    /// Fixed iteration order; also the hit-test tie-break.
    pub const ALL: [Slot; 3] = [Slot::Left, Slot::Center, Slot::Right];

    pub const fn id(self) -> u32 {
        match self {
            Slot::Left => 100,
            Slot::Center => 101,
            Slot::Right => 102,
        }
    }

    /// Resolve an external id. Anything else is a wiring bug on the host side.
    pub fn from_id(id: u32) -> Result<Self, FaceError> {
        match id {
            100 => Ok(Slot::Left),
            101 => Ok(Slot::Center),
            102 => Ok(Slot::Right),
            _ => {
                warn!("lookup for unknown complication id {}", id);
                Err(FaceError::UnknownSlot(id))
            }
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Slot::Left => 0,
            Slot::Center => 1,
            Slot::Right => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    ShortText,
    RangedValue,
    Icon,
    SmallImage,
    NoData,
    NoPermission,
    Empty,
    NotConfigured,
}

/// Kinds every slot on this face accepts from a provider.
pub const SUPPORTED_KINDS: [PayloadKind; 4] = [
    PayloadKind::RangedValue,
    PayloadKind::Icon,
    PayloadKind::ShortText,
    PayloadKind::SmallImage,
];

/// Host-side data sources a slot can be bound to before the user picks one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SystemProvider {
    UnreadNotificationCount,
    StepCount,
    WatchBattery,
    DayOfWeek,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DefaultBinding {
    pub provider: SystemProvider,
    pub kind: PayloadKind,
}

/// Opaque handle to something the host can run when a slot is tapped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActionRef(pub u32);

/// Interval during which a payload may be shown and tapped. Both ends inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl Validity {
    pub const ALWAYS: Validity = Validity {
        start_ms: i64::MIN,
        end_ms: i64::MAX,
    };

    #[inline]
    pub fn contains(&self, now_ms: i64) -> bool {
        now_ms >= self.start_ms && now_ms <= self.end_ms
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Range {
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

impl Range {
    /// Filled share of the range, 0.0..=1.0.
    pub fn fraction(&self) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.value - self.min) / span).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Payload {
    kind: PayloadKind,
    validity: Validity,
    action: Option<ActionRef>,
    text: Option<ShortText>,
    title: Option<ShortText>,
    range: Option<Range>,
    image: Option<Bitmap>,
}

fn short_text(s: &str) -> Result<ShortText, FaceError> {
    ShortText::try_from(s).map_err(|_| FaceError::TextTooLong {
        len: s.len(),
        max: SHORT_TEXT_CAP,
    })
}

impl Payload {
    pub fn new(kind: PayloadKind) -> Self {
        Self {
            kind,
            validity: Validity::ALWAYS,
            action: None,
            text: None,
            title: None,
            range: None,
            image: None,
        }
    }

    /// Short-text payload, the most common delivery.
    pub fn short_text(text: &str) -> Result<Self, FaceError> {
        Self::new(PayloadKind::ShortText).with_text(text)
    }

    pub fn with_text(mut self, text: &str) -> Result<Self, FaceError> {
        self.text = Some(short_text(text)?);
        Ok(self)
    }

    pub fn with_title(mut self, title: &str) -> Result<Self, FaceError> {
        self.title = Some(short_text(title)?);
        Ok(self)
    }

    pub fn with_range(mut self, value: f32, min: f32, max: f32) -> Self {
        self.range = Some(Range { value, min, max });
        self
    }

    pub fn with_image(mut self, image: Bitmap) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_action(mut self, action: ActionRef) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_validity(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.validity = Validity { start_ms, end_ms };
        self
    }

    #[inline]
    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    #[inline]
    pub fn action(&self) -> Option<ActionRef> {
        self.action
    }

    #[inline]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[inline]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[inline]
    pub fn range(&self) -> Option<Range> {
        self.range
    }

    #[inline]
    pub fn image(&self) -> Option<&Bitmap> {
        self.image.as_ref()
    }

    #[inline]
    pub fn is_active(&self, now_ms: i64) -> bool {
        self.validity.contains(now_ms)
    }

    /// Kinds that carry nothing to show or tap.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, PayloadKind::Empty | PayloadKind::NotConfigured)
    }
}

/// Colors a slot is drawn with in interactive mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlotStyle {
    pub background: Rgb565,
    pub text: Rgb565,
    pub border: Rgb565,
}

impl SlotStyle {
    pub const fn with_border(border: Rgb565) -> Self {
        Self {
            background: Rgb565::BLACK,
            text: Rgb565::WHITE,
            border,
        }
    }

    fn for_mode(&self, mode: &DisplayMode) -> SlotStyle {
        if mode.ambient {
            SlotStyle {
                background: Rgb565::BLACK,
                text: Rgb565::WHITE,
                border: Rgb565::WHITE,
            }
        } else {
            *self
        }
    }
}

const BORDER_WIDTH: u32 = 2;
const RANGE_RING_WIDTH: u32 = 4;

/// One slot: fixed rectangle, style, optional default binding and payload.
#[derive(Clone, Debug)]
pub struct ComplicationSlot {
    slot: Slot,
    bounds: Rectangle,
    style: SlotStyle,
    supported: &'static [PayloadKind],
    binding: Option<DefaultBinding>,
    payload: Option<Payload>,
}

impl ComplicationSlot {
    #[inline]
    pub fn slot(&self) -> Slot {
        self.slot
    }

    #[inline]
    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    #[inline]
    pub fn style(&self) -> SlotStyle {
        self.style
    }

    #[inline]
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    #[inline]
    pub fn binding(&self) -> Option<DefaultBinding> {
        self.binding
    }

    #[inline]
    pub fn supports(&self, kind: PayloadKind) -> bool {
        self.supported.contains(&kind)
    }

    /// Draw this slot into `target`. Returns false when there was nothing to show.
    pub fn draw<D>(&self, target: &mut D, mode: &DisplayMode, now_ms: i64) -> bool
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let payload = match &self.payload {
            Some(p) if p.is_active(now_ms) && !p.is_placeholder() => p,
            _ => return false,
        };

        let style = self.style.for_mode(mode);
        let diameter = self.bounds.size.width.min(self.bounds.size.height);
        let center = self.bounds.center();

        // Burn-in safe ambient leaves the disc unfilled
        let mut disc = PrimitiveStyleBuilder::new()
            .stroke_color(style.border)
            .stroke_width(BORDER_WIDTH);
        if !(mode.ambient && mode.burn_in_risk) {
            disc = disc.fill_color(style.background);
        }
        Circle::with_center(center, diameter)
            .into_styled(disc.build())
            .draw(target)
            .ok();

        if let Some(range) = payload.range {
            let sweep = 360.0 * range.fraction();
            if sweep > 0.0 {
                Arc::with_center(
                    center,
                    diameter.saturating_sub(BORDER_WIDTH * 2 + RANGE_RING_WIDTH),
                    (-90.0f32).deg(),
                    sweep.deg(),
                )
                .into_styled(PrimitiveStyle::with_stroke(style.border, RANGE_RING_WIDTH))
                .draw(target)
                .ok();
            }
        }

        let images_allowed = !(mode.ambient && (mode.burn_in_risk || mode.low_fidelity));
        if let (Some(image), true) = (&payload.image, images_allowed) {
            let size = image.size();
            let at = center - Point::new(size.width as i32 / 2, size.height as i32 / 2);
            let at = if payload.text.is_some() {
                at - Point::new(0, 12)
            } else {
                at
            };
            image.draw_at(target, at);
        }

        let centered = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();

        if let Some(text) = payload.text.as_deref() {
            let y_off = if payload.image.is_some() { 18 } else { 0 };
            Text::with_text_style(
                text,
                center + Point::new(0, y_off),
                MonoTextStyle::new(&FONT_10X20, style.text),
                centered,
            )
            .draw(target)
            .ok();
        }
        if let Some(title) = payload.title.as_deref() {
            Text::with_text_style(
                title,
                center + Point::new(0, 20),
                MonoTextStyle::new(&FONT_6X10, style.text),
                centered,
            )
            .draw(target)
            .ok();
        }
        true
    }
}

/// Default rectangles for the 400x400 reference face.
pub const DEFAULT_SLOT_DIAMETER: u32 = 96;

pub fn default_slot_bounds(slot: Slot) -> Rectangle {
    let top_left = match slot {
        Slot::Left => Point::new(64, 144),
        Slot::Center => Point::new(153, 232),
        Slot::Right => Point::new(241, 144),
    };
    Rectangle::new(
        top_left,
        Size::new(DEFAULT_SLOT_DIAMETER, DEFAULT_SLOT_DIAMETER),
    )
}

pub fn default_slot_style(slot: Slot) -> SlotStyle {
    match slot {
        Slot::Left => SlotStyle::with_border(Rgb565::new(0xFF >> 3, 0xE2 >> 2, 0)),
        Slot::Center => SlotStyle::with_border(Rgb565::WHITE),
        Slot::Right => SlotStyle::with_border(Rgb565::new(0x67 >> 3, 0x3A >> 2, 0xB7 >> 3)),
    }
}

/// Fixed-size table of the three slots.
#[derive(Clone, Debug)]
pub struct ComplicationStore {
    slots: [ComplicationSlot; 3],
}

impl ComplicationStore {
    /// Build the table. Rectangles are fixed from here on.
    pub fn new(bounds: [Rectangle; 3], styles: [SlotStyle; 3]) -> Result<Self, FaceError> {
        for slot in Slot::ALL {
            let r = bounds[slot.index()];
            if r.size.width == 0 || r.size.height == 0 {
                return Err(FaceError::MalformedRect { slot });
            }
        }
        Ok(Self::build(bounds, styles))
    }

    fn build(bounds: [Rectangle; 3], styles: [SlotStyle; 3]) -> Self {
        Self {
            slots: Slot::ALL.map(|slot| ComplicationSlot {
                slot,
                bounds: bounds[slot.index()],
                style: styles[slot.index()],
                supported: &SUPPORTED_KINDS,
                binding: None,
                payload: None,
            }),
        }
    }

    /// Register the provider a slot starts out with, before any user choice.
    pub fn bind_default(
        &mut self,
        slot: Slot,
        provider: SystemProvider,
        kind: PayloadKind,
    ) -> Result<(), FaceError> {
        let entry = &mut self.slots[slot.index()];
        if !entry.supports(kind) {
            return Err(FaceError::UnsupportedKind { slot, kind });
        }
        debug!("slot {:?} defaults to {:?} as {:?}", slot, provider, kind);
        entry.binding = Some(DefaultBinding { provider, kind });
        Ok(())
    }

    /// Replace the slot's payload wholesale.
    pub fn update(&mut self, slot: Slot, payload: Payload) {
        debug!("slot {:?} <- {:?}", slot, payload.kind());
        self.slots[slot.index()].payload = Some(payload);
    }

    #[inline]
    pub fn get(&self, slot: Slot) -> Option<&Payload> {
        self.slots[slot.index()].payload.as_ref()
    }

    #[inline]
    pub fn slot(&self, slot: Slot) -> &ComplicationSlot {
        &self.slots[slot.index()]
    }

    /// Slots in their fixed order.
    pub fn iter(&self) -> impl Iterator<Item = &ComplicationSlot> {
        self.slots.iter()
    }

    pub fn is_tappable(&self, slot: Slot, now_ms: i64) -> bool {
        match self.get(slot) {
            Some(p) => p.is_active(now_ms) && !p.is_placeholder(),
            None => false,
        }
    }
}

impl Default for ComplicationStore {
    fn default() -> Self {
        Self::build(
            Slot::ALL.map(default_slot_bounds),
            Slot::ALL.map(default_slot_style),
        )
    }
}
