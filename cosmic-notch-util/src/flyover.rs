//! One-shot icon traversal across the compact surface

use crate::animation::ease_in_out_quad;
use crate::event::SourceId;
use crate::geometry::{Point, Rect, lerp};
use crate::view::FlyoverFrame;
use std::time::{Duration, Instant};

/// Left-to-right path of the icon, vertically centered on the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyoverPath {
    pub start: Point,
    pub end: Point,
    pub icon_size: f32,
}

impl FlyoverPath {
    pub fn new(surface: Rect, icon_size: f32, padding: f32) -> Self {
        let y = surface.y + (surface.height - icon_size) / 2.0;
        let start_x = surface.x + padding;
        // Surfaces narrower than the path collapse to a single point
        let end_x = (surface.x + surface.width - padding - icon_size).max(start_x);
        Self {
            start: Point::new(start_x, y),
            end: Point::new(end_x, y),
            icon_size,
        }
    }

    /// Icon position after `t` of the move phase
    pub fn position(&self, t: f32) -> Point {
        let eased = ease_in_out_quad(t.clamp(0.0, 1.0));
        Point::new(
            lerp(self.start.x, self.end.x, eased),
            lerp(self.start.y, self.end.y, eased),
        )
    }
}

/// A running flyover: the icon moves, then fades where it stopped
#[derive(Debug, Clone)]
pub struct Flyover {
    source: SourceId,
    previous: Option<SourceId>,
    path: FlyoverPath,
    started: Instant,
    move_duration: Duration,
    fade_duration: Duration,
}

impl Flyover {
    pub fn new(
        source: SourceId,
        previous: Option<SourceId>,
        path: FlyoverPath,
        started: Instant,
        move_duration: Duration,
        fade_duration: Duration,
    ) -> Self {
        Self {
            source,
            previous,
            path,
            started,
            move_duration,
            fade_duration,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Owner of the surface before the flyover took it
    pub fn previous(&self) -> Option<SourceId> {
        self.previous
    }

    /// Change where the surface returns once the icon is gone
    pub fn return_to(&mut self, source: SourceId) {
        self.previous = Some(source);
    }

    /// Icon frame at `now`, or `None` once both phases are over
    pub fn frame_at(&self, now: Instant) -> Option<FlyoverFrame> {
        let elapsed = now.saturating_duration_since(self.started);

        if elapsed < self.move_duration {
            let t = elapsed.as_secs_f32() / self.move_duration.as_secs_f32();
            return Some(FlyoverFrame {
                position: self.path.position(t),
                size: self.path.icon_size,
                opacity: 1.0,
            });
        }

        let fading = elapsed - self.move_duration;
        if fading < self.fade_duration {
            let t = fading.as_secs_f32() / self.fade_duration.as_secs_f32();
            return Some(FlyoverFrame {
                position: self.path.end,
                size: self.path.icon_size,
                opacity: 1.0 - t,
            });
        }

        None
    }
}
