pub mod animation;
pub mod clock;
pub mod controller;
pub mod cycle;
pub mod error;
pub mod event;
pub mod flyover;
pub mod geometry;
pub mod presenter;
pub mod state_machine;
pub mod timer;
pub mod view;

pub use animation::{
    AnimationEngine, CROSSFADE_THRESHOLD, Finished, Frame, Layout, Start, StepOutcome,
    bounce_frame, ease_in_out_quad, ease_out_back, frame,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{IDLE_SOURCE, NotchController, TimerKey};
pub use cycle::CycleManager;
pub use error::NotchError;
pub use event::{
    BatteryInfo, BatteryTracker, BluetoothInfo, CaptureInfo, LevelInfo, MediaInfo,
    NotificationInfo, Policy, RestoreToken, SourceEvent, SourceId, WindowInfo,
};
pub use flyover::{Flyover, FlyoverPath};
pub use geometry::{Anchor, Point, Rect, lerp};
pub use presenter::{Containers, PresenterRegistry, Registration, ViewHandle};
pub use state_machine::{NotchState, NotchStateMachine};
pub use timer::TimerRegistry;
pub use view::{FlyoverFrame, LayerStyle, Surface, View, ViewError};
