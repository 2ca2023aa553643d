//! Face rendering.
//!
//! This module provides:
//! - `Renderer`, which owns the per-surface caches (geometry, scaled and
//!   grayscale background) and the decorative sprites
//! - `Renderer::render_frame`, the fixed stage pipeline: background,
//!   overlays, status badge, battery, complications, clock face
//! - `RenderedStages`, a report of what a frame actually drew
//!
//! A frame reads its inputs and writes pixels; nothing else changes.
//! Caches are rebuilt synchronously from `resize` and `refresh_caches`.

use alloc::vec::Vec;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::Rgb565,
    prelude::{DrawTarget, Point, Primitive, RgbColor, Size},
    primitives::{Circle, Line, PrimitiveStyle, PrimitiveStyleBuilder},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
    Drawable,
};
use log::debug;

use crate::assets::Bitmap;
use crate::battery;
use crate::complication::ComplicationStore;
use crate::config::RenderStages;
use crate::geometry::{Angle, Geometry, HandAngles, Pivot};
use crate::layout::{FaceLayout, OverlayAnchor};
use crate::mode::{DisplayMode, Ink, Palette, SHADOW_COLOR};
use crate::time_source::TimeSource;

pub const HOUR_STROKE: u32 = 12;
pub const MINUTE_STROKE: u32 = 10;
pub const SECOND_STROKE: u32 = 2;
pub const HOUR_TICK_STROKE: u32 = 10;
pub const MINUTE_TICK_STROKE: u32 = 2;
/// Extra width of the black underlay on each side of a hand.
pub const SHADOW_RADIUS: u32 = 6;
/// Hands start this far out from the hub.
pub const HAND_GAP: f32 = 20.0;
pub const SECOND_TAIL: f32 = 20.0;
pub const HUB_RING_RADIUS: u32 = 12;
pub const HUB_RING_STROKE: u32 = 4;
pub const HUB_CAP_RADIUS: u32 = 8;

const NUMERALS: [&str; 4] = ["12", "3", "6", "9"];

/// Which background a frame used.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BackgroundKind {
    /// Black, ambient on panels that cannot show the gray copy.
    #[default]
    Flat,
    Grayscale,
    FullColor,
}

/// What one frame drew.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedStages {
    pub background: BackgroundKind,
    pub overlays: usize,
    pub badge: bool,
    pub battery: bool,
    pub complications: usize,
    /// Hour and minute tick marks, 72 on a full dial.
    pub ticks: usize,
    pub day_date: bool,
    pub second_hand: bool,
}

/// State that a frame reads but never changes.
#[derive(Copy, Clone, Debug)]
pub struct FrameInputs<'a> {
    pub time: &'a TimeSource,
    pub store: &'a ComplicationStore,
    pub mode: &'a DisplayMode,
    pub palette: &'a Palette,
    pub peer_connected: bool,
    pub battery: Option<u8>,
    pub now_ms: i64,
}

/// A decorative sprite, hidden in ambient mode.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub sprite: Bitmap,
    pub anchor: OverlayAnchor,
}

#[derive(Debug)]
pub struct Renderer {
    stages: RenderStages,
    layout: FaceLayout,
    geometry: Option<Geometry>,
    background_src: Option<Bitmap>,
    background: Option<Bitmap>,
    background_gray: Option<Bitmap>,
    overlays: Vec<Overlay>,
    badge_icon: Option<Bitmap>,
}

impl Renderer {
    pub fn new(stages: RenderStages, layout: FaceLayout) -> Self {
        Self {
            stages,
            layout,
            geometry: None,
            background_src: None,
            background: None,
            background_gray: None,
            overlays: Vec::new(),
            badge_icon: None,
        }
    }

    #[inline]
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    #[inline]
    pub fn stages(&self) -> RenderStages {
        self.stages
    }

    #[inline]
    pub fn has_grayscale_background(&self) -> bool {
        self.background_gray.is_some()
    }

    /// New surface size. Rebuilds the caches only if the size changed.
    pub fn resize(&mut self, size: Size, mode: &DisplayMode) {
        if self.geometry.map(|g| g.size) == Some(size) {
            return;
        }
        self.geometry = Some(Geometry::for_size(size));
        self.refresh_caches(mode);
    }

    pub fn set_background(&mut self, image: Bitmap, mode: &DisplayMode) {
        self.background_src = Some(image);
        self.refresh_caches(mode);
    }

    pub fn push_overlay(&mut self, sprite: Bitmap, anchor: OverlayAnchor) {
        self.overlays.push(Overlay { sprite, anchor });
    }

    pub fn set_badge_icon(&mut self, icon: Bitmap) {
        self.badge_icon = Some(icon);
    }

    /// Rescale the background to the surface width and redo the gray copy.
    /// The gray copy is skipped on panels that never show it.
    pub fn refresh_caches(&mut self, mode: &DisplayMode) {
        let (Some(src), Some(geometry)) = (&self.background_src, &self.geometry) else {
            return;
        };
        let scaled = src.scaled_to_width(geometry.size.width);
        self.background_gray = if mode.burn_in_risk || mode.low_fidelity {
            None
        } else {
            Some(scaled.grayscale())
        };
        debug!(
            "background cache {}x{} (gray: {})",
            scaled.size().width,
            scaled.size().height,
            self.background_gray.is_some()
        );
        self.background = Some(scaled);
    }

    /// Draw one frame.
    pub fn render_frame<D>(&self, target: &mut D, inputs: &FrameInputs<'_>) -> RenderedStages
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let geometry = match self.geometry {
            Some(g) => g,
            // no resize seen yet: use the target as it is, uncached
            None => Geometry::for_size(target.bounding_box().size),
        };
        let mode = inputs.mode;
        let mut report = RenderedStages {
            background: self.draw_background(target, mode),
            ..Default::default()
        };

        if self.stages.overlays && !mode.ambient {
            for o in &self.overlays {
                o.sprite.draw_at(target, o.anchor.at);
            }
            report.overlays = self.overlays.len();
        }

        if self.stages.status_badge && !inputs.peer_connected && !mode.ambient {
            self.draw_badge(target);
            report.badge = true;
        }

        if self.stages.battery && !mode.ambient {
            if let Some(level) = inputs.battery {
                battery::draw_gauge(target, self.layout.battery_origin, level);
                report.battery = true;
            }
        }

        for slot in inputs.store.iter() {
            if slot.draw(target, mode, inputs.now_ms) {
                report.complications += 1;
            }
            if mode.ambient {
                let b = slot.bounds();
                Circle::with_center(b.center(), b.size.width.min(b.size.height))
                    .into_styled(PrimitiveStyle::with_stroke(Rgb565::WHITE, 2))
                    .draw(target)
                    .ok();
            }
        }

        report.ticks = self.draw_ticks(target, &geometry, inputs.palette);
        self.draw_text(target, &geometry, inputs, &mut report);
        report.second_hand = draw_hands(target, &geometry, inputs);
        report
    }

    fn draw_background<D>(&self, target: &mut D, mode: &DisplayMode) -> BackgroundKind
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.clear(Rgb565::BLACK).ok();
        let (kind, image) = match (mode.ambient, mode.low_fidelity || mode.burn_in_risk) {
            (false, _) => (BackgroundKind::FullColor, self.background.as_ref()),
            (true, false) => (BackgroundKind::Grayscale, self.background_gray.as_ref()),
            (true, true) => (BackgroundKind::Flat, None),
        };
        match image {
            Some(bmp) => {
                bmp.draw_at(target, Point::zero());
                kind
            }
            None => BackgroundKind::Flat,
        }
    }

    fn draw_badge<D>(&self, target: &mut D)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let plate = self.layout.badge;
        plate
            .into_styled(PrimitiveStyle::with_fill(Rgb565::BLACK))
            .draw(target)
            .ok();
        match &self.badge_icon {
            Some(icon) => icon.draw_at(target, plate.top_left + self.layout.badge_icon_inset),
            None => {
                // crossed-out ring stands in for the missing icon
                let d = plate.size.width.min(plate.size.height) / 2;
                let c = plate.center();
                let stroke = PrimitiveStyle::with_stroke(Rgb565::RED, 3);
                Circle::with_center(c, d).into_styled(stroke).draw(target).ok();
                let r = d as i32 / 2;
                Line::new(c + Point::new(-r, r), c + Point::new(r, -r))
                    .into_styled(stroke)
                    .draw(target)
                    .ok();
            }
        }
    }

    fn draw_ticks<D>(&self, target: &mut D, g: &Geometry, palette: &Palette) -> usize
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let color = palette.ticks.resolved(Rgb565::BLACK);
        let hour = PrimitiveStyle::with_stroke(color, HOUR_TICK_STROKE);
        let minute = PrimitiveStyle::with_stroke(color, MINUTE_TICK_STROKE);

        let mut drawn = 0;
        for i in 0..12 {
            let a = Angle::of_tick(i, 12);
            let inner = if i % 3 == 0 {
                g.quarter_tick_inner
            } else {
                g.hour_tick_inner
            };
            Line::new(g.polar(a, inner), g.polar(a, g.tick_outer))
                .into_styled(hour)
                .draw(target)
                .ok();
            drawn += 1;
        }
        // every minute, the five-minute marks land under the hour ticks
        for i in 0..60 {
            let a = Angle::of_tick(i, 60);
            Line::new(g.polar(a, g.minute_tick_inner), g.polar(a, g.tick_outer))
                .into_styled(minute)
                .draw(target)
                .ok();
            drawn += 1;
        }
        drawn
    }

    fn draw_text<D>(
        &self,
        target: &mut D,
        g: &Geometry,
        inputs: &FrameInputs<'_>,
        report: &mut RenderedStages,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let centered = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        let tick_color = inputs.palette.ticks.resolved(Rgb565::BLACK);
        let numeral_style = MonoTextStyle::new(&FONT_10X20, tick_color);
        let numeral_r = g.radius - self.layout.numeral_inset as f32;

        for (q, label) in NUMERALS.iter().enumerate() {
            let at = g.polar(Angle::of_tick(q as u32 * 3, 12), numeral_r);
            Text::with_text_style(label, at, numeral_style, centered)
                .draw(target)
                .ok();
        }

        let mut lift = self.layout.readout_lift;
        if inputs.mode.ambient {
            lift += self.layout.readout_ambient_lift;
        }
        let readout = inputs.time.readout();
        Text::with_text_style(
            &readout,
            g.center - Point::new(0, lift),
            MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE),
            centered,
        )
        .draw(target)
        .ok();

        if self.stages.day_date {
            let line = inputs.time.day_date();
            Text::with_text_style(
                &line,
                g.center + Point::new(0, self.layout.day_date_drop),
                MonoTextStyle::new(&FONT_6X10, tick_color),
                centered,
            )
            .draw(target)
            .ok();
            report.day_date = true;
        }
    }
}

fn draw_hand<D>(target: &mut D, (from, to): (Point, Point), ink: &Ink, width: u32)
where
    D: DrawTarget<Color = Rgb565>,
{
    let line = Line::new(from, to);
    if ink.shadow {
        line.into_styled(PrimitiveStyle::with_stroke(
            SHADOW_COLOR,
            width + 2 * SHADOW_RADIUS,
        ))
        .draw(target)
        .ok();
    }
    line.into_styled(PrimitiveStyle::with_stroke(ink.resolved(Rgb565::BLACK), width))
        .draw(target)
        .ok();
}

/// Hour, minute, hub ring, second hand, cap. Returns whether the second
/// hand was drawn.
fn draw_hands<D>(target: &mut D, g: &Geometry, inputs: &FrameInputs<'_>) -> bool
where
    D: DrawTarget<Color = Rgb565>,
{
    let palette = inputs.palette;
    let angles = HandAngles::from_time(inputs.time);
    let with_second = !inputs.mode.ambient;

    let mut pivot = Pivot::new(g);
    pivot.save();

    pivot.rotate(angles.hour);
    draw_hand(target, pivot.radial(HAND_GAP, g.hour_len), &palette.hour, HOUR_STROKE);

    pivot.rotate(angles.minute - angles.hour);
    draw_hand(target, pivot.radial(HAND_GAP, g.minute_len), &palette.minute, MINUTE_STROKE);

    Circle::with_center(g.center, HUB_RING_RADIUS * 2)
        .into_styled(PrimitiveStyle::with_stroke(
            palette.minute.resolved(Rgb565::BLACK),
            HUB_RING_STROKE,
        ))
        .draw(target)
        .ok();

    if with_second {
        pivot.rotate(angles.second - angles.minute);
        draw_hand(
            target,
            pivot.radial(-SECOND_TAIL, g.second_len),
            &palette.second,
            SECOND_STROKE,
        );
    }
    pivot.restore();

    Circle::with_center(g.center, HUB_CAP_RADIUS * 2)
        .into_styled(
            PrimitiveStyleBuilder::new()
                .fill_color(palette.second.resolved(Rgb565::BLACK))
                .build(),
        )
        .draw(target)
        .ok();

    with_second
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::gray_of;
    use crate::config::PalettePreset;
    use crate::display::FrameSurface;
    use crate::mode::{derive_palette, HIGHLIGHT_COLOR};
    use embedded_graphics::prelude::IntoStorage;

    // 2026-10-16 13:47:05.250 UTC
    const NOW: i64 = 1_792_158_425_250;
    const SIDE: u16 = 400;

    fn time() -> TimeSource {
        let mut t = TimeSource::default();
        t.refresh(NOW);
        t
    }

    fn render(
        renderer: &Renderer,
        mode: DisplayMode,
        peer_connected: bool,
        battery: Option<u8>,
    ) -> (Vec<u16>, RenderedStages) {
        let mut fb = vec![0u16; SIDE as usize * SIDE as usize];
        let time = time();
        let store = ComplicationStore::default();
        let palette = derive_palette(&mode, PalettePreset::Classic);
        let inputs = FrameInputs {
            time: &time,
            store: &store,
            mode: &mode,
            palette: &palette,
            peer_connected,
            battery,
            now_ms: NOW,
        };
        let report = {
            let mut surface = FrameSurface::new(SIDE, SIDE, &mut fb).unwrap();
            renderer.render_frame(&mut surface, &inputs)
        };
        (fb, report)
    }

    fn at(fb: &[u16], x: i32, y: i32) -> u16 {
        fb[y as usize * SIDE as usize + x as usize]
    }

    fn renderer_with_background(mode: &DisplayMode) -> Renderer {
        let mut r = Renderer::new(RenderStages::default(), FaceLayout::default());
        r.resize(Size::new(SIDE as u32, SIDE as u32), mode);
        r.set_background(Bitmap::filled(200, 200, Rgb565::GREEN).unwrap(), mode);
        r
    }

    fn interactive() -> DisplayMode {
        DisplayMode {
            visible: true,
            ..Default::default()
        }
    }

    #[test]
    fn interactive_frame_draws_every_stage() {
        let mode = interactive();
        let r = renderer_with_background(&mode);
        let (fb, report) = render(&r, mode, false, Some(64));

        assert_eq!(report.background, BackgroundKind::FullColor);
        assert!(report.badge);
        assert!(report.battery);
        assert!(report.second_hand);
        assert!(!report.day_date);
        // corner is outside every other stage
        assert_eq!(at(&fb, 0, 0), Rgb565::GREEN.into_storage());
        // badge plate corner is black over the green background
        let b = FaceLayout::default().badge.top_left;
        assert_eq!(at(&fb, b.x + 1, b.y + 1), 0);
    }

    #[test]
    fn second_hand_is_drawn_along_its_angle() {
        let mode = interactive();
        let r = renderer_with_background(&mode);
        let (fb, _) = render(&r, mode, true, None);

        // 5.25 s => 31.5 degrees; sample 100 px out from the hub
        let g = r.geometry().unwrap();
        let p = g.polar(Angle::from_millidegrees(31_500), 100.0);
        let red = HIGHLIGHT_COLOR.into_storage();
        let hit = (-1..=1).any(|dx| (-1..=1).any(|dy| at(&fb, p.x + dx, p.y + dy) == red));
        assert!(hit, "no second-hand pixel near {:?}", p);
    }

    #[test]
    fn ambient_uses_gray_background_and_drops_extras() {
        let mode = DisplayMode {
            ambient: true,
            ..interactive()
        };
        let r = renderer_with_background(&mode);
        assert!(r.has_grayscale_background());
        let (fb, report) = render(&r, mode, false, Some(90));

        assert_eq!(report.background, BackgroundKind::Grayscale);
        assert!(!report.badge);
        assert!(!report.battery);
        assert!(!report.second_hand);
        assert_eq!(report.overlays, 0);
        assert_eq!(at(&fb, 0, 0), gray_of(Rgb565::GREEN).into_storage());
    }

    #[test]
    fn burn_in_ambient_is_flat_and_skips_gray_cache() {
        let mode = DisplayMode {
            ambient: true,
            burn_in_risk: true,
            ..interactive()
        };
        let r = renderer_with_background(&mode);
        assert!(!r.has_grayscale_background());
        let (fb, report) = render(&r, mode, true, None);
        assert_eq!(report.background, BackgroundKind::Flat);
        assert_eq!(at(&fb, 0, 0), 0);
    }

    #[test]
    fn ambient_rings_outline_each_slot() {
        let mode = DisplayMode {
            ambient: true,
            burn_in_risk: true,
            ..interactive()
        };
        let r = renderer_with_background(&mode);
        let (fb, _) = render(&r, mode, true, None);

        // top of the LEFT slot's ring; nothing else is drawn there
        let top = FaceLayout::default().slots[0].top_left + Point::new(48, 1);
        let white = Rgb565::WHITE.into_storage();
        let hit = (-1..=1).any(|dx| (-1..=1).any(|dy| at(&fb, top.x + dx, top.y + dy) == white));
        assert!(hit, "no ring pixel near {:?}", top);

        let (fb, _) = render(&r, interactive(), true, None);
        assert_ne!(at(&fb, top.x, top.y), white);
    }

    #[test]
    fn low_fidelity_ambient_is_flat_and_skips_gray_cache() {
        let mode = DisplayMode {
            ambient: true,
            low_fidelity: true,
            ..interactive()
        };
        let r = renderer_with_background(&mode);
        assert!(!r.has_grayscale_background());
        let (fb, report) = render(&r, mode, true, None);
        assert_eq!(report.background, BackgroundKind::Flat);
        assert_eq!(at(&fb, 0, 0), 0);
    }

    #[test]
    fn full_dial_has_sixty_minute_ticks() {
        let mode = interactive();
        let r = renderer_with_background(&mode);
        let (_, report) = render(&r, mode, true, None);
        assert_eq!(report.ticks, 72);
    }

    #[test]
    fn readout_stays_white_while_hands_are_dimmed() {
        let mode = DisplayMode {
            dimmed: true,
            ..interactive()
        };
        let mut r = Renderer::new(RenderStages::default(), FaceLayout::default());
        r.resize(Size::new(SIDE as u32, SIDE as u32), &mode);
        let (fb, _) = render(&r, mode, true, None);

        // "1:47" sits 46 px above the hub
        let white = Rgb565::WHITE.into_storage();
        let hit = (182..=218).any(|x| (146..=162).any(|y| at(&fb, x, y) == white));
        assert!(hit);
    }

    #[test]
    fn hub_ring_is_four_pixels_thick() {
        let mode = interactive();
        let mut r = Renderer::new(RenderStages::default(), FaceLayout::default());
        r.resize(Size::new(SIDE as u32, SIDE as u32), &mode);
        let (fb, _) = render(&r, mode, true, None);

        // column above the hub, between the hub cap and the readout
        let lit = (180..=191).filter(|&y| at(&fb, 200, y) != 0).count();
        assert!(lit >= 3, "ring only {} px thick", lit);
    }

    #[test]
    fn stages_can_be_switched_off() {
        let mode = interactive();
        let stages = RenderStages {
            overlays: false,
            status_badge: false,
            battery: false,
            day_date: true,
        };
        let mut r = Renderer::new(stages, FaceLayout::default());
        r.resize(Size::new(SIDE as u32, SIDE as u32), &mode);
        r.push_overlay(
            Bitmap::filled(4, 4, Rgb565::BLUE).unwrap(),
            OverlayAnchor { at: Point::new(0, 0) },
        );
        let (fb, report) = render(&r, mode, false, Some(50));
        assert!(!report.badge && !report.battery);
        assert_eq!(report.overlays, 0);
        assert!(report.day_date);
        assert_eq!(at(&fb, 0, 0), 0);
    }

    #[test]
    fn resize_to_same_size_keeps_caches() {
        let mode = interactive();
        let mut r = renderer_with_background(&mode);
        let before = r.geometry().copied();
        r.resize(Size::new(SIDE as u32, SIDE as u32), &mode);
        assert_eq!(r.geometry().copied(), before);
        r.resize(Size::new(320, 320), &mode);
        assert_eq!(r.geometry().unwrap().radius, 160.0);
    }
}
