use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of every source that can occupy the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceId {
    Battery,
    Media,
    Bluetooth,
    Volume,
    Brightness,
    Notification,
    Window,
    Camera,
    Recording,
}

/// How the arbiter treats events from a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Holds the surface while its condition stays true
    Sticky,
    /// Seizes the surface for a bounded window, then restores
    Overlay,
    /// Crosses the compact surface once, never expands
    Flyover,
}

impl SourceId {
    pub const ALL: [SourceId; 9] = [
        SourceId::Battery,
        SourceId::Media,
        SourceId::Bluetooth,
        SourceId::Volume,
        SourceId::Brightness,
        SourceId::Notification,
        SourceId::Window,
        SourceId::Camera,
        SourceId::Recording,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SourceId::Battery => "battery",
            SourceId::Media => "media",
            SourceId::Bluetooth => "bluetooth",
            SourceId::Volume => "volume",
            SourceId::Brightness => "brightness",
            SourceId::Notification => "notification",
            SourceId::Window => "window",
            SourceId::Camera => "camera",
            SourceId::Recording => "recording",
        }
    }

    pub const fn policy(self) -> Policy {
        match self {
            SourceId::Media | SourceId::Recording => Policy::Sticky,
            SourceId::Notification | SourceId::Window => Policy::Flyover,
            SourceId::Battery
            | SourceId::Bluetooth
            | SourceId::Volume
            | SourceId::Brightness
            | SourceId::Camera => Policy::Overlay,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What was visible before a temporary overlay took the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestoreToken {
    Media,
    Bluetooth,
    Volume,
    Battery,
}

impl RestoreToken {
    /// Token recorded for the given surface owner. Anything without a
    /// dedicated token restores as the idle source.
    pub fn for_owner(owner: Option<SourceId>) -> Self {
        match owner {
            Some(SourceId::Media) => RestoreToken::Media,
            Some(SourceId::Bluetooth) => RestoreToken::Bluetooth,
            Some(SourceId::Volume) => RestoreToken::Volume,
            _ => RestoreToken::Battery,
        }
    }

    pub fn source(self) -> SourceId {
        match self {
            RestoreToken::Media => SourceId::Media,
            RestoreToken::Bluetooth => SourceId::Bluetooth,
            RestoreToken::Volume => SourceId::Volume,
            RestoreToken::Battery => SourceId::Battery,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatteryInfo {
    pub percentage: f64,
    pub is_charging: bool,
    #[serde(default = "default_true")]
    pub is_present: bool,
    /// Set on the report where charging begins
    #[serde(default)]
    pub charge_started: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    pub is_playing: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub player: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BluetoothInfo {
    pub device_name: String,
    pub is_connected: bool,
    #[serde(default)]
    pub device_type: Option<String>,
}

/// Output level or screen brightness, 0-100
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u8,
    #[serde(default)]
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotificationInfo {
    pub app_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_urgent: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowInfo {
    pub app_name: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Camera, microphone or screen capture activity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CaptureInfo {
    pub is_active: bool,
    #[serde(default)]
    pub app_name: Option<String>,
}

/// Event emitted by an external source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum SourceEvent {
    Battery(BatteryInfo),
    Media(MediaInfo),
    Bluetooth(BluetoothInfo),
    Volume(LevelInfo),
    Brightness(LevelInfo),
    Notification(NotificationInfo),
    Window(WindowInfo),
    Camera(CaptureInfo),
    Recording(CaptureInfo),
}

impl SourceEvent {
    pub fn source(&self) -> SourceId {
        match self {
            SourceEvent::Battery(_) => SourceId::Battery,
            SourceEvent::Media(_) => SourceId::Media,
            SourceEvent::Bluetooth(_) => SourceId::Bluetooth,
            SourceEvent::Volume(_) => SourceId::Volume,
            SourceEvent::Brightness(_) => SourceId::Brightness,
            SourceEvent::Notification(_) => SourceId::Notification,
            SourceEvent::Window(_) => SourceId::Window,
            SourceEvent::Camera(_) => SourceId::Camera,
            SourceEvent::Recording(_) => SourceId::Recording,
        }
    }

    /// Whether the event asks for the surface
    ///
    /// Level and pairing changes always do; sticky sources and capture
    /// only while their condition holds; battery only on charge start.
    pub fn is_active(&self) -> bool {
        match self {
            SourceEvent::Battery(info) => info.charge_started,
            SourceEvent::Media(info) => info.is_playing,
            SourceEvent::Camera(info) | SourceEvent::Recording(info) => info.is_active,
            SourceEvent::Bluetooth(_)
            | SourceEvent::Volume(_)
            | SourceEvent::Brightness(_)
            | SourceEvent::Notification(_)
            | SourceEvent::Window(_) => true,
        }
    }
}

/// Turns raw battery reports into edge-triggered charge-start events
///
/// Repeated reports while charging only flag the first one.
#[derive(Debug, Default)]
pub struct BatteryTracker {
    was_charging: bool,
    has_value: bool,
}

impl BatteryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` for reports identical to the previous state
    pub fn observe(&mut self, percentage: f64, is_charging: bool, is_present: bool) -> Option<SourceEvent> {
        let first = !self.has_value;
        let charge_started = is_charging && !self.was_charging && !first;
        let changed = first || is_charging != self.was_charging;

        self.has_value = true;
        self.was_charging = is_charging;

        changed.then(|| {
            SourceEvent::Battery(BatteryInfo {
                percentage,
                is_charging,
                is_present,
                charge_started,
            })
        })
    }
}

const fn default_true() -> bool {
    true
}
