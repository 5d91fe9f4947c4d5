use crate::constants::SUMMARY_MAX_LENGTH;
use cosmic_notch_util::{
    FlyoverFrame, LayerStyle, Rect, SourceEvent, SourceId, Surface, View, ViewError,
};
use std::cell::{Cell, RefCell};
use std::fmt;

/// Container slot a view occupies on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Compact,
    Expanded,
    Secondary,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Slot::Compact => "compact",
            Slot::Expanded => "expanded",
            Slot::Secondary => "secondary",
        })
    }
}

/// View that reports visibility changes through the log
pub struct LogView {
    source: SourceId,
    slot: Slot,
    visible: Cell<bool>,
    text: RefCell<String>,
}

impl LogView {
    pub fn new(source: SourceId, slot: Slot) -> Self {
        Self {
            source,
            slot,
            visible: Cell::new(false),
            text: RefCell::new(String::new()),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Replace the displayed text, logging it when visible
    pub fn set_text(&self, text: &str) {
        if *self.text.borrow() == text {
            return;
        }
        text.clone_into(&mut self.text.borrow_mut());
        if self.visible.get() {
            tracing::info!(source = %self.source, slot = %self.slot, "{}", text);
        }
    }
}

impl View for LogView {
    fn show(&self) -> Result<(), ViewError> {
        if !self.visible.replace(true) {
            tracing::debug!(source = %self.source, slot = %self.slot, text = %self.text.borrow(), "view shown");
        }
        Ok(())
    }

    fn hide(&self) -> Result<(), ViewError> {
        if self.visible.replace(false) {
            tracing::debug!(source = %self.source, slot = %self.slot, "view hidden");
        }
        Ok(())
    }
}

/// Surface that logs geometry and flyover changes
#[derive(Default)]
pub struct LogSurface {
    geometry: Cell<Option<Rect>>,
    flying: Cell<bool>,
}

impl LogSurface {
    pub fn geometry(&self) -> Option<Rect> {
        self.geometry.get()
    }
}

impl Surface for LogSurface {
    fn set_geometry(&self, geometry: Rect) {
        if self.geometry.replace(Some(geometry)) != Some(geometry) {
            tracing::trace!(
                x = geometry.x,
                y = geometry.y,
                width = geometry.width,
                height = geometry.height,
                "surface geometry"
            );
        }
    }

    fn set_content(&self, compact: LayerStyle, expanded: LayerStyle) {
        tracing::trace!(?compact, ?expanded, "surface content");
    }

    fn set_flyover(&self, frame: Option<FlyoverFrame>) {
        match frame {
            Some(frame) if !self.flying.replace(true) => {
                tracing::debug!(x = frame.position.x, y = frame.position.y, "flyover started");
            }
            Some(frame) => tracing::trace!(?frame, "flyover frame"),
            None => {
                if self.flying.replace(false) {
                    tracing::debug!("flyover finished");
                }
            }
        }
    }
}

/// One-line text a view shows for an event
pub fn summary(event: &SourceEvent) -> String {
    let text = match event {
        SourceEvent::Battery(info) if !info.is_present => "No battery".to_string(),
        SourceEvent::Battery(info) if info.is_charging => {
            format!("{:.0}% charging", info.percentage)
        }
        SourceEvent::Battery(info) => format!("{:.0}%", info.percentage),
        SourceEvent::Media(info) => {
            let state = if info.is_playing { "Playing" } else { "Paused" };
            match (&info.title, &info.artist) {
                (Some(title), Some(artist)) => format!("{}: {} - {}", state, title, artist),
                (Some(title), None) => format!("{}: {}", state, title),
                _ => state.to_string(),
            }
        }
        SourceEvent::Bluetooth(info) => {
            let state = if info.is_connected { "connected" } else { "disconnected" };
            format!("{} {}", info.device_name, state)
        }
        SourceEvent::Volume(info) if info.muted => "Muted".to_string(),
        SourceEvent::Volume(info) => format!("Volume {}%", info.level.min(100)),
        SourceEvent::Brightness(info) => format!("Brightness {}%", info.level.min(100)),
        SourceEvent::Notification(info) if info.title.is_empty() => info.app_name.clone(),
        SourceEvent::Notification(info) => format!("{}: {}", info.app_name, info.title),
        SourceEvent::Window(info) => format!("{} opened", info.app_name),
        SourceEvent::Camera(info) if info.is_active => match &info.app_name {
            Some(app) => format!("{} is using the camera", app),
            None => "Camera in use".to_string(),
        },
        SourceEvent::Camera(_) => "Camera off".to_string(),
        SourceEvent::Recording(info) if info.is_active => "Recording".to_string(),
        SourceEvent::Recording(_) => "Recording stopped".to_string(),
    };
    truncate(text)
}

fn truncate(text: String) -> String {
    if text.chars().count() > SUMMARY_MAX_LENGTH {
        let kept: String = text.chars().take(SUMMARY_MAX_LENGTH - 3).collect();
        format!("{}...", kept)
    } else {
        text
    }
}
