//! The face as the host sees it.
//!
//! The host serializes everything onto one context: it feeds [`HostEvent`]s
//! into [`WatchFace::handle`], polls the redraw timer, and calls
//! [`WatchFace::render`] on its next paint when
//! [`WatchFace::take_redraw_request`] says so. Nothing here blocks or
//! spawns.
//!
//! ```
//! use analog_face::config::FaceConfig;
//! use analog_face::engine::{HostEvent, WatchFace};
//! use analog_face::peer::PeerLink;
//! # use analog_face::complication::{ActionRef, Slot};
//! # use analog_face::error::DispatchError;
//! # use analog_face::input::ComponentRef;
//! # struct Firmware;
//! # impl analog_face::engine::Host for Firmware {
//! #     fn run_action(&mut self, _: ActionRef) -> Result<(), DispatchError> { Ok(()) }
//! #     fn request_permission(&mut self, _: Slot, _: ComponentRef) {}
//! #     fn battery_level(&mut self) -> Option<u8> { Some(80) }
//! # }
//!
//! static PEER: PeerLink = PeerLink::new();
//!
//! let mut host = Firmware;
//! let mut face = WatchFace::new(FaceConfig::default(), &PEER).unwrap();
//! face.handle(HostEvent::SurfaceReady { width: 400, height: 400 }, 0, &mut host);
//! face.handle(HostEvent::VisibilityChanged(true), 0, &mut host);
//! assert!(face.take_redraw_request());
//! assert_eq!(face.pending_timer().map(|t| t.due_ms()), Some(1000));
//! ```

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::{DrawTarget, Size},
};
use log::{debug, info};

use crate::assets::Bitmap;
use crate::battery::BatteryCache;
use crate::complication::{
    default_slot_style, ActionRef, ComplicationStore, Payload, PayloadKind, Slot, SystemProvider,
};
use crate::config::FaceConfig;
use crate::error::{DispatchError, FaceError};
use crate::input::{handle_tap, ComponentRef, TapKind, TapOutcome};
use crate::layout::OverlayAnchor;
use crate::mode::{DisplayMode, ModeChange, ModeController};
use crate::peer::PeerLink;
use crate::scheduler::{Scheduler, TimerState, TimerToken};
use crate::time_source::{TimeSource, TimeZone};
use crate::ui::{FrameInputs, RenderedStages, Renderer};

/// Providers each slot starts out bound to.
pub const DEFAULT_PROVIDERS: [(Slot, SystemProvider); 3] = [
    (Slot::Left, SystemProvider::UnreadNotificationCount),
    (Slot::Center, SystemProvider::StepCount),
    (Slot::Right, SystemProvider::WatchBattery),
];

/// Everything the host can tell the face.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    SurfaceReady { width: u32, height: u32 },
    SurfaceResized { width: u32, height: u32 },
    VisibilityChanged(bool),
    AmbientChanged(bool),
    PropertiesChanged { low_fidelity: bool, burn_in_risk: bool },
    MuteChanged(bool),
    TimeZoneChanged(TimeZone),
    /// Once-a-minute tick, the only refresh in ambient mode.
    TimeTick,
    PayloadUpdate { slot: Slot, payload: Payload },
    Tap { kind: TapKind, x: i32, y: i32, time_ms: i64 },
    TimerFired(TimerToken),
    Destroy,
}

/// Requests the face makes of the host.
pub trait Host {
    /// Run a complication's tap action. An error means the target is gone.
    fn run_action(&mut self, action: ActionRef) -> Result<(), DispatchError>;

    /// Open the permission-grant flow for `slot`. Fire and forget.
    fn request_permission(&mut self, slot: Slot, component: ComponentRef);

    /// Current battery percentage, if known.
    fn battery_level(&mut self) -> Option<u8>;
}

pub struct WatchFace<'a> {
    config: FaceConfig,
    time: TimeSource,
    store: ComplicationStore,
    mode: ModeController,
    scheduler: Scheduler,
    renderer: Renderer,
    battery: BatteryCache,
    peer: &'a PeerLink,
    needs_redraw: bool,
    destroyed: bool,
}

impl<'a> WatchFace<'a> {
    /// Build the face. Configuration errors are fatal here.
    pub fn new(config: FaceConfig, peer: &'a PeerLink) -> Result<Self, FaceError> {
        config.validate()?;

        let mut store =
            ComplicationStore::new(config.layout.slot_bounds(), Slot::ALL.map(default_slot_style))?;
        for (slot, provider) in DEFAULT_PROVIDERS {
            store.bind_default(slot, provider, PayloadKind::ShortText)?;
        }

        let scheduler = Scheduler::new(config.tick_interval_ms)?;
        let renderer = Renderer::new(config.stages, config.layout.clone());
        info!(
            "face ready: preset {:?}, tick {}ms",
            config.preset, config.tick_interval_ms
        );

        Ok(Self {
            mode: ModeController::new(config.preset),
            time: TimeSource::default(),
            store,
            scheduler,
            renderer,
            battery: BatteryCache::new(),
            peer,
            needs_redraw: true,
            destroyed: false,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &FaceConfig {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> &DisplayMode {
        self.mode.mode()
    }

    #[inline]
    pub fn time(&self) -> &TimeSource {
        &self.time
    }

    #[inline]
    pub fn store(&self) -> &ComplicationStore {
        &self.store
    }

    #[inline]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[inline]
    pub fn timer_state(&self) -> TimerState {
        self.scheduler.state()
    }

    /// Token the host should wake up for, if any.
    #[inline]
    pub fn pending_timer(&self) -> Option<TimerToken> {
        self.scheduler.pending()
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn set_background(&mut self, image: Bitmap) {
        self.renderer.set_background(image, self.mode.mode());
        self.needs_redraw = true;
    }

    pub fn push_overlay(&mut self, sprite: Bitmap, anchor: OverlayAnchor) {
        self.renderer.push_overlay(sprite, anchor);
        self.needs_redraw = true;
    }

    pub fn set_badge_icon(&mut self, icon: Bitmap) {
        self.renderer.set_badge_icon(icon);
        self.needs_redraw = true;
    }

    /// Returns and clears the pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        core::mem::take(&mut self.needs_redraw)
    }

    /// Hand out the timer token once it is due. Feed it back as
    /// [`HostEvent::TimerFired`].
    pub fn poll_timer(&mut self, now_ms: i64) -> Option<TimerToken> {
        self.scheduler.poll(now_ms)
    }

    fn apply(&mut self, change: ModeChange, now_ms: i64) {
        if change.redraw {
            self.needs_redraw = true;
        }
        if change.retime {
            self.scheduler.rearm(now_ms, self.mode.mode());
        }
    }

    /// Apply one host event. Only completed taps produce an outcome.
    pub fn handle<H>(&mut self, event: HostEvent, now_ms: i64, host: &mut H) -> Option<TapOutcome>
    where
        H: Host + ?Sized,
    {
        if self.destroyed {
            debug!("event after destroy ignored: {:?}", event);
            return None;
        }

        match event {
            HostEvent::SurfaceReady { width, height } => {
                self.renderer.resize(Size::new(width, height), self.mode.mode());
                self.time.refresh(now_ms);
                self.apply(ModeChange { redraw: true, retime: true }, now_ms);
            }
            HostEvent::SurfaceResized { width, height } => {
                self.renderer.resize(Size::new(width, height), self.mode.mode());
                self.needs_redraw = true;
            }
            HostEvent::VisibilityChanged(visible) => {
                if visible {
                    self.time.refresh(now_ms);
                }
                let change = self.mode.set_visible(visible);
                self.apply(change, now_ms);
            }
            HostEvent::AmbientChanged(ambient) => {
                let change = self.mode.set_ambient(ambient);
                self.apply(change, now_ms);
            }
            HostEvent::PropertiesChanged { low_fidelity, burn_in_risk } => {
                let change = self.mode.set_properties(low_fidelity, burn_in_risk);
                if change.redraw {
                    self.renderer.refresh_caches(self.mode.mode());
                }
                self.apply(change, now_ms);
            }
            HostEvent::MuteChanged(muted) => {
                let change = self.mode.set_muted(muted);
                self.apply(change, now_ms);
            }
            HostEvent::TimeZoneChanged(zone) => {
                self.time.set_time_zone(zone);
                self.needs_redraw = true;
            }
            HostEvent::TimeTick => {
                self.time.refresh(now_ms);
                let change = self.mode.clear_dimmed();
                self.apply(change, now_ms);
                self.needs_redraw = true;
            }
            HostEvent::PayloadUpdate { slot, payload } => {
                self.store.update(slot, payload);
                self.needs_redraw = true;
            }
            HostEvent::Tap { kind, x, y, time_ms } => {
                self.needs_redraw = true;
                if kind == TapKind::Tap {
                    return Some(handle_tap(&self.store, &mut self.mode, host, x, y, time_ms));
                }
            }
            HostEvent::TimerFired(token) => {
                if self.scheduler.fire(token, now_ms, self.mode.mode()) {
                    self.needs_redraw = true;
                }
            }
            HostEvent::Destroy => {
                self.scheduler.shutdown();
                self.destroyed = true;
                info!("face destroyed");
            }
        }
        None
    }

    /// Draw one frame into `target` at `now_ms`.
    pub fn render<D, H>(&mut self, target: &mut D, now_ms: i64, host: &mut H) -> RenderedStages
    where
        D: DrawTarget<Color = Rgb565>,
        H: Host + ?Sized,
    {
        if self.destroyed {
            return RenderedStages::default();
        }
        self.time.refresh(now_ms);

        let mode = *self.mode.mode();
        let battery = if self.config.stages.battery && !mode.ambient {
            self.battery
                .read(now_ms, self.time.minute(), || host.battery_level())
        } else {
            self.battery.level()
        };
        let palette = self.mode.palette();
        let inputs = FrameInputs {
            time: &self.time,
            store: &self.store,
            mode: &mode,
            palette: &palette,
            peer_connected: self.peer.is_connected(),
            battery,
            now_ms,
        };
        let report = self.renderer.render_frame(target, &inputs);
        self.needs_redraw = false;
        report
    }
}
