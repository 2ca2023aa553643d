//! Display mode flags and the palette derived from them.
//!
//! This module provides:
//! - `DisplayMode`, the host-driven flag tuple plus the user `dimmed` toggle
//! - `derive_palette`, a pure function from mode and preset to hand/tick inks
//! - `ModeController`, the setters that report whether a redraw or a timer
//!   re-arm is needed

use embedded_graphics::{pixelcolor::Rgb565, prelude::RgbColor};
use log::{info, warn};

use crate::config::PalettePreset;

pub const OPAQUE: u8 = 0xFF;
pub const MUTED_HAND_ALPHA: u8 = 100;
pub const MUTED_SECOND_ALPHA: u8 = 80;
pub const DIMMED_HAND_ALPHA: u8 = 0x60;

/// Interactive hand color (#00BFFF).
pub const HAND_COLOR: Rgb565 = Rgb565::new(0x00, 0xBF >> 2, 0xFF >> 3);
/// Second hand and, for some presets, ticks.
pub const HIGHLIGHT_COLOR: Rgb565 = Rgb565::RED;
/// Tick color for the classic preset (#808080).
pub const TICK_GRAY: Rgb565 = Rgb565::new(0x80 >> 3, 0x80 >> 2, 0x80 >> 3);
pub const SHADOW_COLOR: Rgb565 = Rgb565::BLACK;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DisplayMode {
    pub ambient: bool,
    pub low_fidelity: bool,
    pub burn_in_risk: bool,
    pub muted: bool,
    pub dimmed: bool,
    pub visible: bool,
}

/// How one visual element is stroked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ink {
    pub color: Rgb565,
    pub alpha: u8,
    pub anti_alias: bool,
    pub shadow: bool,
}

impl Ink {
    /// Color after blending `alpha` over `backdrop`.
    pub fn resolved(&self, backdrop: Rgb565) -> Rgb565 {
        blend(self.color, backdrop, self.alpha)
    }
}

/// `fg` at `alpha` over `bg`, per channel.
pub fn blend(fg: Rgb565, bg: Rgb565, alpha: u8) -> Rgb565 {
    if alpha == OPAQUE {
        return fg;
    }
    let a = alpha as u16;
    let mix = |f: u8, b: u8| ((f as u16 * a + b as u16 * (255 - a) + 127) / 255) as u8;
    Rgb565::new(mix(fg.r(), bg.r()), mix(fg.g(), bg.g()), mix(fg.b(), bg.b()))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub hour: Ink,
    pub minute: Ink,
    pub second: Ink,
    pub ticks: Ink,
}

/// Pure palette rules. Same inputs, same output.
pub fn derive_palette(mode: &DisplayMode, preset: PalettePreset) -> Palette {
    let (hand, second, ticks, anti_alias, shadow) = if mode.ambient {
        (Rgb565::WHITE, Rgb565::WHITE, Rgb565::WHITE, false, false)
    } else {
        (HAND_COLOR, HIGHLIGHT_COLOR, preset.tick_color(), true, true)
    };

    // dimming wins over mute for hour/minute
    let hand_alpha = if mode.dimmed && preset.allows_dimming() {
        DIMMED_HAND_ALPHA
    } else if mode.muted {
        MUTED_HAND_ALPHA
    } else {
        OPAQUE
    };
    let second_alpha = if mode.muted { MUTED_SECOND_ALPHA } else { OPAQUE };

    let ink = |color, alpha| Ink {
        color,
        alpha,
        anti_alias,
        shadow,
    };
    Palette {
        hour: ink(hand, hand_alpha),
        minute: ink(hand, hand_alpha),
        second: ink(second, second_alpha),
        ticks: ink(ticks, OPAQUE),
    }
}

/// What a mode change asks of the rest of the face.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct ModeChange {
    pub redraw: bool,
    pub retime: bool,
}

impl ModeChange {
    pub const NONE: ModeChange = ModeChange {
        redraw: false,
        retime: false,
    };
    const REDRAW: ModeChange = ModeChange {
        redraw: true,
        retime: false,
    };
    const BOTH: ModeChange = ModeChange {
        redraw: true,
        retime: true,
    };
}

#[derive(Clone, Debug)]
pub struct ModeController {
    mode: DisplayMode,
    preset: PalettePreset,
    properties_known: bool,
}

impl ModeController {
    pub fn new(preset: PalettePreset) -> Self {
        Self {
            mode: DisplayMode::default(),
            preset,
            properties_known: false,
        }
    }

    #[inline]
    pub fn mode(&self) -> &DisplayMode {
        &self.mode
    }

    #[inline]
    pub fn preset(&self) -> PalettePreset {
        self.preset
    }

    pub fn palette(&self) -> Palette {
        derive_palette(&self.mode, self.preset)
    }

    pub fn set_ambient(&mut self, ambient: bool) -> ModeChange {
        if self.mode.ambient == ambient {
            return ModeChange::NONE;
        }
        info!("ambient {}", if ambient { "on" } else { "off" });
        self.mode.ambient = ambient;
        ModeChange::BOTH
    }

    pub fn set_visible(&mut self, visible: bool) -> ModeChange {
        if self.mode.visible == visible {
            return ModeChange::NONE;
        }
        info!("visible {}", visible);
        self.mode.visible = visible;
        ModeChange {
            redraw: visible,
            retime: true,
        }
    }

    /// Device capabilities. Fixed after the first call; later differing calls
    /// are ignored.
    pub fn set_properties(&mut self, low_fidelity: bool, burn_in_risk: bool) -> ModeChange {
        if self.properties_known {
            if (self.mode.low_fidelity, self.mode.burn_in_risk) != (low_fidelity, burn_in_risk) {
                warn!(
                    "ignoring property change to low_fidelity={} burn_in_risk={}",
                    low_fidelity, burn_in_risk
                );
            }
            return ModeChange::NONE;
        }
        info!(
            "properties: low_fidelity={} burn_in_risk={}",
            low_fidelity, burn_in_risk
        );
        self.properties_known = true;
        self.mode.low_fidelity = low_fidelity;
        self.mode.burn_in_risk = burn_in_risk;
        ModeChange::REDRAW
    }

    pub fn set_muted(&mut self, muted: bool) -> ModeChange {
        if self.mode.muted == muted {
            return ModeChange::NONE;
        }
        info!("muted {}", muted);
        self.mode.muted = muted;
        ModeChange::REDRAW
    }

    /// Flip the dimmed-hands toggle. No-op on presets without one.
    pub fn toggle_dimmed(&mut self) -> ModeChange {
        if !self.preset.allows_dimming() {
            return ModeChange::NONE;
        }
        self.mode.dimmed = !self.mode.dimmed;
        ModeChange::REDRAW
    }

    /// Clear the dimmed toggle, as the minute tick does.
    pub fn clear_dimmed(&mut self) -> ModeChange {
        if !self.mode.dimmed {
            return ModeChange::NONE;
        }
        self.mode.dimmed = false;
        ModeChange::REDRAW
    }
}
