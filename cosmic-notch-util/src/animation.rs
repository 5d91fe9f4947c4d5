//! Expansion progress and everything derived from it
//!
//! Progress runs from 0.0 (compact) to 1.0 (expanded). The engine only keeps
//! time; the controller owns the `animation-frame` timer that calls
//! [`AnimationEngine::step`] and pushes the resulting [`Frame`] to the surface.

use crate::geometry::{Anchor, Rect, lerp};
use crate::view::LayerStyle;
use cosmic_notch_config::NotchConfig;
use std::time::{Duration, Instant};

/// Share of progress over which the two content groups cross-fade
pub const CROSSFADE_THRESHOLD: f32 = 0.2;

/// Progress differences below this are treated as no movement
pub const SNAP_EPSILON: f32 = 0.001;

const COMPACT_MIN_SCALE: f32 = 0.9;
const EXPANDED_MIN_SCALE: f32 = 0.5;
const BOUNCE_SQUEEZE: f32 = 0.9;

pub fn ease_out_back(t: f32) -> f32 {
    const C1: f32 = 1.70158;
    const C3: f32 = C1 + 1.0;
    let t = t - 1.0;
    1.0 + C3 * t.powi(3) + C1 * t.powi(2)
}

pub fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// Sizes and placement of the surface at both ends of the animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub anchor: Anchor,
    pub compact_width: f32,
    pub compact_height: f32,
    pub expanded_width: f32,
    pub expanded_height: f32,
    pub margin_top: f32,
}

impl Layout {
    pub fn new(config: &NotchConfig, anchor: Anchor) -> Self {
        Self {
            anchor,
            compact_width: config.compact_width,
            compact_height: config.compact_height,
            expanded_width: config.expanded_width,
            expanded_height: config.expanded_height,
            margin_top: config.margin_top,
        }
    }

    pub fn compact_rect(&self) -> Rect {
        self.anchor
            .place(self.compact_width, self.compact_height, self.margin_top)
    }

    pub fn expanded_rect(&self) -> Rect {
        self.anchor
            .place(self.expanded_width, self.expanded_height, self.margin_top)
    }
}

/// Everything the surface needs to draw one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub geometry: Rect,
    pub compact: LayerStyle,
    pub expanded: LayerStyle,
}

/// Frame for a progress value
///
/// With `steady` set the layer that is fully faded out is also marked
/// invisible; mid-animation both layers stay visible.
pub fn frame(progress: f32, steady: bool, layout: &Layout) -> Frame {
    let p = progress.clamp(0.0, 1.0);
    let width = lerp(layout.compact_width, layout.expanded_width, p);
    let height = lerp(layout.compact_height, layout.expanded_height, p);

    let (compact_opacity, expanded_opacity) = if p < CROSSFADE_THRESHOLD {
        (1.0 - p / CROSSFADE_THRESHOLD, p / CROSSFADE_THRESHOLD)
    } else {
        (0.0, 1.0)
    };

    let compact = LayerStyle {
        opacity: compact_opacity,
        scale: lerp(1.0, COMPACT_MIN_SCALE, (p / CROSSFADE_THRESHOLD).min(1.0)),
        visible: !steady || compact_opacity > 0.0,
    };
    let expanded = LayerStyle {
        opacity: expanded_opacity,
        scale: lerp(EXPANDED_MIN_SCALE, 1.0, p),
        visible: !steady || expanded_opacity > 0.0,
    };

    Frame {
        geometry: layout.anchor.place(width, height, layout.margin_top),
        compact,
        expanded,
    }
}

/// Compact frame with the width squeezed for the acknowledgement pulse
pub fn bounce_frame(t: f32, layout: &Layout) -> Frame {
    let t = t.clamp(0.0, 1.0);
    let full = layout.compact_width;
    let squeezed = full * BOUNCE_SQUEEZE;
    let width = if t < 0.5 {
        lerp(full, squeezed, ease_in_out_quad(t * 2.0))
    } else {
        lerp(squeezed, full, ease_out_back((t - 0.5) * 2.0))
    };

    Frame {
        geometry: layout
            .anchor
            .place(width, layout.compact_height, layout.margin_top),
        ..frame(0.0, true, layout)
    }
}

#[derive(Debug, Clone, Copy)]
struct Motion {
    from: f32,
    to: f32,
    started: Instant,
    duration: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Bounce {
    started: Instant,
    duration: Duration,
}

/// Result of asking for a new target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Start {
    /// Steps are needed until the target is reached
    Running,
    /// The target was reached immediately; nothing to schedule
    Settled(Frame),
}

/// What finished on the last step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Finished {
    /// An expand or collapse reached the given target
    Transition(f32),
    Bounce,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub frame: Frame,
    pub finished: Option<Finished>,
}

#[derive(Debug)]
pub struct AnimationEngine {
    layout: Layout,
    duration: Duration,
    bounce_duration: Duration,
    progress: f32,
    motion: Option<Motion>,
    bounce: Option<Bounce>,
    destroyed: bool,
}

impl AnimationEngine {
    pub fn new(config: &NotchConfig, anchor: Anchor) -> Self {
        Self {
            layout: Layout::new(config, anchor),
            duration: config.animation_duration(),
            bounce_duration: bounce_duration(config),
            progress: 0.0,
            motion: None,
            bounce: None,
            destroyed: false,
        }
    }

    /// Pick up new sizes and durations; running motions keep their timing
    pub fn reconfigure(&mut self, config: &NotchConfig, anchor: Anchor) {
        self.layout = Layout::new(config, anchor);
        self.duration = config.animation_duration();
        self.bounce_duration = bounce_duration(config);
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Target of the running expand or collapse
    pub fn target(&self) -> Option<f32> {
        self.motion.map(|m| m.to)
    }

    pub fn is_running(&self) -> bool {
        self.motion.is_some() || self.bounce.is_some()
    }

    pub fn is_bouncing(&self) -> bool {
        self.bounce.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Frame for the current progress while nothing moves
    pub fn current_frame(&self) -> Frame {
        frame(self.progress, true, &self.layout)
    }

    /// Start moving towards `target`, from wherever progress is now
    ///
    /// A running bounce is abandoned. Returns `None` after `destroy`.
    pub fn animate_to(&mut self, target: f32, now: Instant) -> Option<Start> {
        if self.destroyed {
            tracing::warn!("animation requested after destroy");
            return None;
        }

        let target = target.clamp(0.0, 1.0);
        self.bounce = None;

        if (self.progress - target).abs() < SNAP_EPSILON || self.duration.is_zero() {
            self.motion = None;
            self.progress = target;
            return Some(Start::Settled(self.current_frame()));
        }

        tracing::trace!(from = self.progress, to = target, "animation started");
        self.motion = Some(Motion {
            from: self.progress,
            to: target,
            started: now,
            duration: self.duration,
        });
        Some(Start::Running)
    }

    /// Start the width pulse. Refused unless fully compact and idle.
    pub fn start_bounce(&mut self, now: Instant) -> bool {
        if self.destroyed
            || self.motion.is_some()
            || self.progress > SNAP_EPSILON
            || self.bounce_duration.is_zero()
        {
            return false;
        }
        self.bounce = Some(Bounce {
            started: now,
            duration: self.bounce_duration,
        });
        true
    }

    /// Advance to `now`. Returns `None` when destroyed or idle.
    pub fn step(&mut self, now: Instant) -> Option<StepOutcome> {
        if self.destroyed {
            return None;
        }

        if let Some(motion) = self.motion {
            let t = fraction(now, motion.started, motion.duration);
            if t >= 1.0 {
                self.motion = None;
                self.progress = motion.to;
                return Some(StepOutcome {
                    frame: self.current_frame(),
                    finished: Some(Finished::Transition(motion.to)),
                });
            }

            let eased = if motion.to > motion.from {
                ease_out_back(t)
            } else {
                ease_in_out_quad(t)
            };
            self.progress = (motion.from + (motion.to - motion.from) * eased).clamp(0.0, 1.0);
            return Some(StepOutcome {
                frame: frame(self.progress, false, &self.layout),
                finished: None,
            });
        }

        let bounce = self.bounce?;
        let t = fraction(now, bounce.started, bounce.duration);
        if t >= 1.0 {
            self.bounce = None;
            return Some(StepOutcome {
                frame: self.current_frame(),
                finished: Some(Finished::Bounce),
            });
        }
        Some(StepOutcome {
            frame: bounce_frame(t, &self.layout),
            finished: None,
        })
    }

    /// Stop for good; later calls produce nothing
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.motion = None;
        self.bounce = None;
    }
}

fn bounce_duration(config: &NotchConfig) -> Duration {
    if config.enable_animations {
        config.bounce_duration()
    } else {
        Duration::ZERO
    }
}

fn fraction(now: Instant, started: Instant, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(started);
    (elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
}
