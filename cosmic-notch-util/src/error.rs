use crate::event::SourceId;
use crate::view::ViewError;

/// Failure inside an arbiter handler
///
/// These never reach the event source; the controller logs them and leaves
/// its state consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotchError {
    /// An event or switch named a source that has no registration
    Unregistered(SourceId),
    /// A view of `owner` refused to change visibility
    View { owner: SourceId, error: ViewError },
}

impl std::fmt::Display for NotchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotchError::Unregistered(id) => write!(f, "source '{}' is not registered", id),
            NotchError::View { owner, error } => write!(f, "view of '{}' failed: {}", owner, error),
        }
    }
}

impl std::error::Error for NotchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NotchError::View { error, .. } => Some(error),
            NotchError::Unregistered(_) => None,
        }
    }
}
