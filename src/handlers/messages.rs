use cosmic_notch_config::NotchConfig;
use cosmic_notch_util::{Point, SourceEvent};

/// Application message types
#[derive(Debug, Clone)]
pub enum Message {
    /// Event from one of the status sources
    Source(SourceEvent),
    /// Pointer entered the surface
    PointerEntered,
    /// Pointer moved, in the same coordinates as the surface geometry
    PointerMoved(Point),
    /// Pointer left the surface
    PointerLeft,
    /// Secondary container of the split layout was clicked
    SecondaryActivated,
    /// Configuration updated
    Config(NotchConfig),
    /// Input closed or the process was asked to stop
    Shutdown,
}
