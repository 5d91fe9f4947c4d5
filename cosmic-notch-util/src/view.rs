//! Contracts between the arbiter and the host's rendering layer

use crate::geometry::{Point, Rect};

/// Failure reported by a view while changing its visibility
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The underlying widget no longer exists
    Destroyed,
    /// Any other host-side failure
    Host(String),
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewError::Destroyed => write!(f, "view has been destroyed"),
            ViewError::Host(msg) => write!(f, "view error: {}", msg),
        }
    }
}

impl std::error::Error for ViewError {}

/// A container a source shows on the surface
///
/// Views are otherwise opaque; hosts use interior mutability to update their
/// widgets from `&self`.
pub trait View {
    fn show(&self) -> Result<(), ViewError>;
    fn hide(&self) -> Result<(), ViewError>;
}

/// Opacity and scale of one content group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    /// 0.0 (transparent) to 1.0 (opaque)
    pub opacity: f32,
    pub scale: f32,
    pub visible: bool,
}

impl LayerStyle {
    pub const SHOWN: LayerStyle = LayerStyle {
        opacity: 1.0,
        scale: 1.0,
        visible: true,
    };
}

/// Icon crossing the compact surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyoverFrame {
    pub position: Point,
    pub size: f32,
    pub opacity: f32,
}

/// Geometry sink for the shared surface
pub trait Surface {
    fn set_geometry(&self, geometry: Rect);

    fn set_content(&self, compact: LayerStyle, expanded: LayerStyle);

    /// `None` removes the flyover icon
    fn set_flyover(&self, _frame: Option<FlyoverFrame>) {}
}
