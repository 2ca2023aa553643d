//! Face configuration.
//!
//! Built once by the host and handed to [`WatchFace::new`](crate::engine::WatchFace::new),
//! which validates it. Use the `with_*` methods to adjust defaults:
//!
//! ```
//! use analog_face::config::{FaceConfig, PalettePreset};
//!
//! let config = FaceConfig::default()
//!     .with_preset(PalettePreset::Highlight)
//!     .with_tick_interval_ms(500);
//! assert!(config.validate().is_ok());
//! ```

use embedded_graphics::pixelcolor::Rgb565;

use crate::complication::Slot;
use crate::error::FaceError;
use crate::layout::FaceLayout;
use crate::mode::{HIGHLIGHT_COLOR, TICK_GRAY};

/// Default interactive redraw grain.
pub const DEFAULT_TICK_INTERVAL_MS: u32 = 1000;
/// Anything slower than once a minute is no longer a ticking face.
pub const MAX_TICK_INTERVAL_MS: u32 = 60_000;

/// Two variants of the face seen in the field.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PalettePreset {
    /// Gray ticks; a tap outside the complications dims the hands.
    #[default]
    Classic,
    /// Ticks in the highlight hue; no dimming toggle.
    Highlight,
}

impl PalettePreset {
    pub fn tick_color(self) -> Rgb565 {
        match self {
            PalettePreset::Classic => TICK_GRAY,
            PalettePreset::Highlight => HIGHLIGHT_COLOR,
        }
    }

    pub fn allows_dimming(self) -> bool {
        matches!(self, PalettePreset::Classic)
    }
}

/// Optional render stages, each independently switchable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderStages {
    pub overlays: bool,
    pub status_badge: bool,
    pub battery: bool,
    pub day_date: bool,
}

impl Default for RenderStages {
    fn default() -> Self {
        Self {
            overlays: true,
            status_badge: true,
            battery: true,
            day_date: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceConfig {
    pub preset: PalettePreset,
    pub tick_interval_ms: u32,
    pub stages: RenderStages,
    pub layout: FaceLayout,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            preset: PalettePreset::default(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            stages: RenderStages::default(),
            layout: FaceLayout::default(),
        }
    }
}

impl FaceConfig {
    pub fn with_preset(mut self, preset: PalettePreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_tick_interval_ms(mut self, ms: u32) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    pub fn with_stages(mut self, stages: RenderStages) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_layout(mut self, layout: FaceLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Startup checks. Any error here is fatal to building the face.
    pub fn validate(&self) -> Result<(), FaceError> {
        if self.tick_interval_ms == 0 || self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(FaceError::InvalidInterval(self.tick_interval_ms));
        }
        for slot in Slot::ALL {
            let r = self.layout.slots[slot as usize];
            if r.size.width == 0 || r.size.height == 0 {
                return Err(FaceError::MalformedRect { slot });
            }
        }
        Ok(())
    }
}
