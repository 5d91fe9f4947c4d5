use cosmic_config::{CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use std::time::Duration;

pub const ID: &str = "io.github.CosmicNotch";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, CosmicConfigEntry)]
#[version = 2]
pub struct NotchConfig {
    /// Width of the surface while compact, in logical pixels.
    pub compact_width: f32,
    /// Height of the surface while compact, in logical pixels.
    pub compact_height: f32,
    /// Width of the surface while expanded, in logical pixels.
    pub expanded_width: f32,
    /// Height of the surface while expanded, in logical pixels.
    pub expanded_height: f32,
    /// Distance between the top of the anchor region and the surface.
    pub margin_top: f32,
    /// Length of a full expand or collapse animation in milliseconds.
    pub animation_duration_ms: u32,
    /// Length of the width-only acknowledgement pulse in milliseconds.
    pub bounce_duration_ms: u32,
    /// Delay between two animation steps in milliseconds.
    pub frame_interval_ms: u32,
    /// Grace delay after the pointer leaves before a collapse check runs.
    pub hover_grace_ms: u32,
    /// Extra margin around the surface that still counts as hovering.
    pub hover_margin: f32,
    /// How long the output level overlay holds the surface.
    pub timeout_volume_ms: u32,
    /// How long the brightness overlay holds the surface.
    pub timeout_brightness_ms: u32,
    /// How long the pairing overlay holds the surface.
    pub timeout_bluetooth_ms: u32,
    /// How long the charge-start overlay holds the surface.
    pub timeout_battery_ms: u32,
    /// How long the capture-start overlay holds the surface.
    pub timeout_camera_ms: u32,
    /// Debounce applied to a paused player before media gives up the surface.
    pub timeout_media_switch_ms: u32,

    // Added in version 2
    /// Time the flyover icon takes to cross the compact surface (default: 800)
    #[serde(default = "default_flyover_duration")]
    pub flyover_duration_ms: u32,
    /// Fade-out after the flyover icon reaches the far edge (default: 200)
    #[serde(default = "default_flyover_fade")]
    pub flyover_fade_ms: u32,
    /// Size of the flyover icon (default: 24)
    #[serde(default = "default_flyover_icon_size")]
    pub flyover_icon_size: f32,
    /// Inset of the flyover path from the surface edges (default: 16)
    #[serde(default = "default_flyover_padding")]
    pub flyover_padding: f32,
    /// Whether expand/collapse is animated or snaps immediately (default: true)
    #[serde(default = "default_true")]
    pub enable_animations: bool,
}

impl Default for NotchConfig {
    fn default() -> Self {
        Self {
            compact_width: 180.0,
            compact_height: 40.0,
            expanded_width: 440.0,
            expanded_height: 180.0,
            margin_top: 5.0,
            animation_duration_ms: 300,
            bounce_duration_ms: 300,
            frame_interval_ms: 16,
            hover_grace_ms: 180,
            hover_margin: 30.0,
            timeout_volume_ms: 2000,
            timeout_brightness_ms: 2000,
            timeout_bluetooth_ms: 3000,
            timeout_battery_ms: 3000,
            timeout_camera_ms: 3000,
            timeout_media_switch_ms: 10000,
            flyover_duration_ms: default_flyover_duration(),
            flyover_fade_ms: default_flyover_fade(),
            flyover_icon_size: default_flyover_icon_size(),
            flyover_padding: default_flyover_padding(),
            enable_animations: default_true(),
        }
    }
}

impl NotchConfig {
    /// Duration of an expand or collapse, zero when animations are disabled
    pub fn animation_duration(&self) -> Duration {
        if self.enable_animations {
            ms(self.animation_duration_ms)
        } else {
            Duration::ZERO
        }
    }

    pub fn bounce_duration(&self) -> Duration {
        ms(self.bounce_duration_ms)
    }

    /// Step interval, never shorter than one millisecond
    pub fn frame_interval(&self) -> Duration {
        ms(self.frame_interval_ms.max(1))
    }

    pub fn hover_grace(&self) -> Duration {
        ms(self.hover_grace_ms)
    }

    pub fn flyover_duration(&self) -> Duration {
        ms(self.flyover_duration_ms)
    }

    pub fn flyover_fade(&self) -> Duration {
        ms(self.flyover_fade_ms)
    }

    pub fn media_switch_delay(&self) -> Duration {
        ms(self.timeout_media_switch_ms)
    }
}

const fn ms(value: u32) -> Duration {
    Duration::from_millis(value as u64)
}

// Default value helpers for serde
const fn default_true() -> bool {
    true
}

const fn default_flyover_duration() -> u32 {
    800
}

const fn default_flyover_fade() -> u32 {
    200
}

const fn default_flyover_icon_size() -> f32 {
    24.0
}

const fn default_flyover_padding() -> f32 {
    16.0
}
