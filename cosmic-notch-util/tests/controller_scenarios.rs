//! End-to-end arbitration scenarios driven by a manual clock
//!
//! Every source is registered with recording views so the tests can observe
//! which containers are visible after each step.

use cosmic_notch_config::NotchConfig;
use cosmic_notch_util::{
    Anchor, BatteryInfo, CaptureInfo, FlyoverFrame, LayerStyle, LevelInfo, ManualClock,
    MediaInfo, NotchController, NotchState, NotificationInfo, Point, Rect, Registration,
    RestoreToken, SourceEvent, SourceId, Surface, TimerKey, View, ViewError,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

#[derive(Default)]
struct RecordingView {
    visible: Cell<bool>,
}

impl View for RecordingView {
    fn show(&self) -> Result<(), ViewError> {
        self.visible.set(true);
        Ok(())
    }

    fn hide(&self) -> Result<(), ViewError> {
        self.visible.set(false);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSurface {
    geometries: RefCell<Vec<Rect>>,
    flyovers: RefCell<Vec<Option<FlyoverFrame>>>,
}

impl Surface for RecordingSurface {
    fn set_geometry(&self, geometry: Rect) {
        self.geometries.borrow_mut().push(geometry);
    }

    fn set_content(&self, _compact: LayerStyle, _expanded: LayerStyle) {}

    fn set_flyover(&self, frame: Option<FlyoverFrame>) {
        self.flyovers.borrow_mut().push(frame);
    }
}

struct Views {
    compact: Rc<RecordingView>,
    expanded: Rc<RecordingView>,
    secondary: Rc<RecordingView>,
}

struct Harness {
    clock: Rc<ManualClock>,
    surface: Rc<RecordingSurface>,
    controller: NotchController,
    views: HashMap<SourceId, Views>,
}

impl Harness {
    fn new() -> Self {
        let clock = Rc::new(ManualClock::new());
        let surface = Rc::new(RecordingSurface::default());
        let mut controller = NotchController::new(
            NotchConfig::default(),
            Anchor::default(),
            clock.clone(),
            surface.clone(),
        );

        let mut views = HashMap::new();
        for id in SourceId::ALL {
            let set = Views {
                compact: Rc::new(RecordingView::default()),
                expanded: Rc::new(RecordingView::default()),
                secondary: Rc::new(RecordingView::default()),
            };
            controller.register(
                id,
                Registration::new()
                    .compact(set.compact.clone())
                    .expanded(set.expanded.clone())
                    .secondary(set.secondary.clone()),
            );
            views.insert(id, set);
        }
        controller.start();

        Self {
            clock,
            surface,
            controller,
            views,
        }
    }

    /// Move time forward in small steps, running due timers after each
    fn run(&mut self, millis: u64) {
        let step = Duration::from_millis(4);
        let end = self.clock.elapsed() + Duration::from_millis(millis);
        while self.clock.elapsed() < end {
            self.clock.advance(step);
            self.controller.advance();
        }
    }

    fn shows(&self, id: SourceId) -> bool {
        self.views[&id].compact.visible.get()
    }

    fn shows_expanded(&self, id: SourceId) -> bool {
        self.views[&id].expanded.visible.get()
    }

    fn hidden(&self, id: SourceId) -> bool {
        let views = &self.views[&id];
        !views.compact.visible.get() && !views.expanded.visible.get() && !views.secondary.visible.get()
    }

    fn send(&mut self, event: SourceEvent) {
        self.controller.handle_event(event);
    }
}

fn media(is_playing: bool) -> SourceEvent {
    SourceEvent::Media(MediaInfo {
        is_playing,
        title: Some("Track".into()),
        ..Default::default()
    })
}

fn volume(level: u8) -> SourceEvent {
    SourceEvent::Volume(LevelInfo { level, muted: false })
}

fn charge_start() -> SourceEvent {
    SourceEvent::Battery(BatteryInfo {
        percentage: 55.0,
        is_charging: true,
        is_present: true,
        charge_started: true,
    })
}

fn notification() -> SourceEvent {
    SourceEvent::Notification(NotificationInfo {
        app_name: "mail".into(),
        title: "New message".into(),
        ..Default::default()
    })
}

#[test]
fn test_volume_over_media_restores_media() {
    let mut h = Harness::new();
    h.send(media(true));
    h.run(400);
    assert_eq!(h.controller.current(), Some(SourceId::Media));
    assert!(h.shows(SourceId::Media));
    assert!(h.hidden(SourceId::Battery));

    h.send(volume(72));
    assert!(h.shows(SourceId::Volume));
    assert!(h.shows_expanded(SourceId::Volume));
    assert!(h.hidden(SourceId::Media));
    assert_eq!(h.controller.state(), NotchState::Animating);
    assert_eq!(h.controller.restore_token(SourceId::Volume), Some(RestoreToken::Media));

    h.run(1000);
    assert_eq!(h.controller.state(), NotchState::Expanded);
    assert!(h.controller.is_armed(TimerKey::Volume));

    // Auto-collapse fires at 2s, the collapse takes another 300ms
    h.run(1400);
    assert_eq!(h.controller.state(), NotchState::Compact);
    assert_eq!(h.controller.current(), Some(SourceId::Media));
    assert!(h.shows(SourceId::Media));
    assert!(h.hidden(SourceId::Volume));
    assert_eq!(h.controller.restore_token(SourceId::Volume), None);
    assert_eq!(h.controller.active_overlay(), None);
}

#[test]
fn test_repeated_volume_extends_overlay() {
    let mut h = Harness::new();
    h.send(volume(10));
    h.run(1500);
    h.send(volume(20));
    h.run(1500);
    // Would have collapsed by now without the second event
    assert_eq!(h.controller.state(), NotchState::Expanded);
    assert_eq!(h.controller.restore_token(SourceId::Volume), Some(RestoreToken::Battery));

    h.run(1000);
    assert_eq!(h.controller.state(), NotchState::Compact);
    assert_eq!(h.controller.current(), Some(SourceId::Battery));
}

#[test]
fn test_battery_charge_start_replaces_timer() {
    let mut h = Harness::new();
    h.send(charge_start());
    assert_eq!(h.controller.state(), NotchState::Animating);
    assert_eq!(h.controller.current(), Some(SourceId::Battery));

    h.run(1000);
    assert_eq!(h.controller.state(), NotchState::Expanded);
    assert!(h.controller.is_armed(TimerKey::BatteryAutoCollapse));

    h.send(charge_start());
    assert!(h.controller.is_armed(TimerKey::BatteryAutoCollapse));

    // The first timer would have fired at 3s
    h.run(2500);
    assert_eq!(h.controller.state(), NotchState::Expanded);

    h.run(900);
    assert_eq!(h.controller.state(), NotchState::Compact);
    assert!(!h.controller.is_armed(TimerKey::BatteryAutoCollapse));
    assert_eq!(h.controller.active_overlay(), None);
}

#[test]
fn test_charge_start_ignored_while_hovered_open() {
    let mut h = Harness::new();
    h.controller.pointer_entered();
    h.run(400);
    assert_eq!(h.controller.state(), NotchState::Expanded);

    h.send(charge_start());
    assert_eq!(h.controller.active_overlay(), None);
    assert!(!h.controller.is_armed(TimerKey::BatteryAutoCollapse));
}

#[test]
fn test_pointer_within_margin_keeps_surface_open() {
    let mut h = Harness::new();
    h.controller.pointer_moved(Point::new(960.0, 20.0));
    h.controller.pointer_entered();
    h.run(400);
    assert_eq!(h.controller.state(), NotchState::Expanded);

    // Expanded bounds end at x = 1180; 1200 is inside the 30px margin
    h.controller.pointer_moved(Point::new(1200.0, 100.0));
    h.controller.pointer_left();
    h.run(1000);
    assert_eq!(h.controller.state(), NotchState::Expanded);
    assert!(h.controller.is_armed(TimerKey::Collapse));

    h.controller.pointer_moved(Point::new(1300.0, 400.0));
    h.run(600);
    assert_eq!(h.controller.state(), NotchState::Compact);
    assert!(!h.controller.is_armed(TimerKey::Collapse));

    let settled = h.surface.geometries.borrow().len();
    h.run(1000);
    assert_eq!(h.surface.geometries.borrow().len(), settled);
    assert_eq!(h.controller.pending_timers(), 0);
}

#[test]
fn test_pointer_leaving_beyond_margin_collapses_after_grace() {
    let mut h = Harness::new();
    h.controller.pointer_entered();
    h.run(400);

    h.controller.pointer_moved(Point::new(100.0, 600.0));
    h.controller.pointer_left();
    h.run(100);
    assert_eq!(h.controller.state(), NotchState::Expanded);

    h.run(100);
    assert_eq!(h.controller.state(), NotchState::Animating);
    h.run(400);
    assert_eq!(h.controller.state(), NotchState::Compact);
}

#[test]
fn test_hover_holds_overlay_open() {
    let mut h = Harness::new();
    h.send(volume(40));
    h.run(400);
    h.controller.pointer_entered();
    assert!(!h.controller.is_armed(TimerKey::Volume));

    h.run(5000);
    assert_eq!(h.controller.state(), NotchState::Expanded);
    assert_eq!(h.controller.current(), Some(SourceId::Volume));

    h.controller.pointer_moved(Point::new(0.0, 900.0));
    h.controller.pointer_left();
    h.run(600);
    assert_eq!(h.controller.state(), NotchState::Compact);
    assert_eq!(h.controller.current(), Some(SourceId::Battery));
    assert!(h.hidden(SourceId::Volume));
}

#[test]
fn test_destroy_mid_animation() {
    let mut h = Harness::new();
    h.send(volume(50));
    h.run(100);
    assert_eq!(h.controller.state(), NotchState::Animating);

    h.controller.destroy();
    let frames = h.surface.geometries.borrow().len();
    h.run(1000);
    assert_eq!(h.surface.geometries.borrow().len(), frames);
    assert_eq!(h.controller.next_deadline(), None);
    for id in SourceId::ALL {
        assert!(h.hidden(id));
    }

    h.controller.destroy();
    h.send(volume(60));
    h.controller.pointer_left();
    assert_eq!(h.controller.pending_timers(), 0);
}

#[test]
fn test_notification_flyover_crosses_compact_surface() {
    let mut h = Harness::new();
    h.send(notification());
    assert!(h.controller.is_flyover_running());
    assert_eq!(h.controller.current(), Some(SourceId::Notification));

    let first = h.surface.flyovers.borrow()[0].expect("flyover frame");
    assert_eq!(first.position.x, 886.0);
    assert_eq!(first.size, 24.0);

    h.run(500);
    let moving = h.surface.flyovers.borrow().last().copied().flatten().expect("frame");
    assert!(moving.position.x > first.position.x);
    assert_eq!(h.controller.state(), NotchState::Compact);

    h.run(600);
    assert!(!h.controller.is_flyover_running());
    assert_eq!(h.surface.flyovers.borrow().last().copied(), Some(None));
    assert_eq!(h.controller.current(), Some(SourceId::Battery));
    assert!(h.shows(SourceId::Battery));
    assert!(h.hidden(SourceId::Notification));
    assert_eq!(h.controller.state(), NotchState::Compact);
}

#[test]
fn test_overlay_cancels_flyover() {
    let mut h = Harness::new();
    h.send(media(true));
    h.run(400);
    h.send(notification());
    h.run(100);

    h.send(volume(30));
    assert!(!h.controller.is_flyover_running());
    assert_eq!(h.surface.flyovers.borrow().last().copied(), Some(None));
    assert_eq!(h.controller.restore_token(SourceId::Volume), Some(RestoreToken::Media));
}

#[test]
fn test_media_pause_is_debounced() {
    let mut h = Harness::new();
    h.send(media(true));
    h.run(400);

    h.send(media(false));
    assert!(h.controller.is_armed(TimerKey::MediaSwitch));
    h.run(5000);
    assert_eq!(h.controller.current(), Some(SourceId::Media));

    // Resuming cancels the pending switch
    h.send(media(true));
    assert!(!h.controller.is_armed(TimerKey::MediaSwitch));
    h.run(10_000);
    assert_eq!(h.controller.current(), Some(SourceId::Media));

    h.send(media(false));
    h.run(10_100);
    assert_eq!(h.controller.current(), Some(SourceId::Battery));
    assert!(h.shows(SourceId::Battery));
    assert!(h.hidden(SourceId::Media));
    assert_eq!(h.controller.sticky_sources().count(), 0);
}

#[test]
fn test_media_started_during_overlay_is_restored() {
    let mut h = Harness::new();
    h.send(volume(80));
    h.run(200);
    h.send(media(true));
    assert_eq!(h.controller.current(), Some(SourceId::Volume));

    h.run(2500);
    assert_eq!(h.controller.state(), NotchState::Compact);
    assert_eq!(h.controller.current(), Some(SourceId::Media));
}

#[test]
fn test_second_overlay_carries_token() {
    let mut h = Harness::new();
    h.send(media(true));
    h.run(400);
    h.send(volume(20));
    h.run(400);

    h.send(SourceEvent::Brightness(LevelInfo { level: 60, muted: false }));
    assert_eq!(h.controller.active_overlay(), Some(SourceId::Brightness));
    assert_eq!(h.controller.restore_token(SourceId::Brightness), Some(RestoreToken::Media));
    assert_eq!(h.controller.restore_token(SourceId::Volume), None);
    assert!(!h.controller.is_armed(TimerKey::Volume));
    assert!(h.hidden(SourceId::Volume));

    h.run(2500);
    assert_eq!(h.controller.current(), Some(SourceId::Media));
    assert!(h.hidden(SourceId::Brightness));
}

#[test]
fn test_recording_splits_with_media() {
    let mut h = Harness::new();
    h.send(media(true));
    h.run(400);
    h.send(SourceEvent::Recording(CaptureInfo {
        is_active: true,
        app_name: None,
    }));
    assert_eq!(h.controller.current(), Some(SourceId::Recording));
    assert!(h.shows(SourceId::Recording));
    assert!(h.views[&SourceId::Media].secondary.visible.get());

    h.run(400);
    h.send(SourceEvent::Recording(CaptureInfo {
        is_active: false,
        app_name: None,
    }));
    assert_eq!(h.controller.current(), Some(SourceId::Media));
    assert!(h.hidden(SourceId::Recording));
}

#[test]
fn test_camera_stop_changes_nothing() {
    let mut h = Harness::new();
    h.send(SourceEvent::Camera(CaptureInfo {
        is_active: false,
        app_name: Some("meet".into()),
    }));
    assert_eq!(h.controller.current(), Some(SourceId::Battery));
    assert_eq!(h.controller.state(), NotchState::Compact);
    assert_eq!(h.controller.pending_timers(), 0);
}

#[test]
fn test_sticky_change_pulses_compact_width() {
    let mut h = Harness::new();
    h.send(media(true));
    h.run(150);
    let narrowest = h
        .surface
        .geometries
        .borrow()
        .iter()
        .map(|g| g.width)
        .fold(f32::MAX, f32::min);
    assert!(narrowest < 180.0);

    h.run(300);
    let last = *h.surface.geometries.borrow().last().expect("geometry");
    assert_eq!(last, Rect::new(870.0, 5.0, 180.0, 40.0));
}

fn recording(is_active: bool) -> SourceEvent {
    SourceEvent::Recording(CaptureInfo {
        is_active,
        app_name: None,
    })
}

#[test]
fn test_stopping_sticky_behind_owner_clears_split() {
    let mut h = Harness::new();
    h.send(recording(true));
    h.run(400);
    h.send(media(true));
    h.run(400);
    assert_eq!(h.controller.current(), Some(SourceId::Media));
    assert!(h.views[&SourceId::Recording].secondary.visible.get());

    h.send(recording(false));
    assert_eq!(
        h.controller.sticky_sources().collect::<Vec<_>>(),
        vec![SourceId::Media]
    );
    assert_eq!(h.controller.current(), Some(SourceId::Media));
    assert!(h.shows(SourceId::Media));
    assert!(h.hidden(SourceId::Recording));
}

#[test]
fn test_media_switch_behind_recording_clears_split() {
    let mut h = Harness::new();
    h.send(media(true));
    h.run(400);
    h.send(recording(true));
    h.run(400);
    assert!(h.views[&SourceId::Media].secondary.visible.get());

    h.send(media(false));
    h.run(10_100);
    assert_eq!(
        h.controller.sticky_sources().collect::<Vec<_>>(),
        vec![SourceId::Recording]
    );
    assert_eq!(h.controller.current(), Some(SourceId::Recording));
    assert!(h.shows(SourceId::Recording));
    assert!(h.hidden(SourceId::Media));
}

#[test]
fn test_pointer_resting_inside_after_collapse_expands() {
    let mut h = Harness::new();
    h.send(volume(35));
    // Auto-collapse fired at 2s and is still animating
    h.run(2100);
    h.controller.pointer_entered();
    assert_eq!(h.controller.state(), NotchState::Animating);

    h.run(400);
    assert_eq!(h.controller.state(), NotchState::Compact);

    h.controller.pointer_moved(Point::new(960.0, 20.0));
    assert_eq!(h.controller.state(), NotchState::Animating);
    h.run(400);
    assert_eq!(h.controller.state(), NotchState::Expanded);

    // Moving while already open starts nothing new
    h.controller.pointer_moved(Point::new(961.0, 21.0));
    assert_eq!(h.controller.state(), NotchState::Expanded);
}

#[test]
fn test_secondary_click_swaps_sticky_sources() {
    let mut h = Harness::new();
    h.send(media(true));
    h.run(400);
    assert!(!h.controller.secondary_activated());

    h.send(recording(true));
    h.run(400);
    assert_eq!(h.controller.current(), Some(SourceId::Recording));

    assert!(h.controller.secondary_activated());
    assert_eq!(h.controller.current(), Some(SourceId::Media));
    assert!(h.shows(SourceId::Media));
    assert!(!h.views[&SourceId::Media].secondary.visible.get());
    assert!(!h.shows(SourceId::Recording));
    assert!(h.views[&SourceId::Recording].secondary.visible.get());
    assert!(h.controller.is_armed(TimerKey::AnimationFrame));

    h.run(400);
    assert!(h.controller.secondary_activated());
    assert_eq!(h.controller.current(), Some(SourceId::Recording));
    assert!(h.views[&SourceId::Media].secondary.visible.get());
    assert!(!h.views[&SourceId::Recording].secondary.visible.get());
}

#[test]
fn test_secondary_click_ignored_during_overlay() {
    let mut h = Harness::new();
    h.send(media(true));
    h.run(400);
    h.send(recording(true));
    h.run(400);
    h.send(volume(50));

    assert!(!h.controller.secondary_activated());
    assert_eq!(h.controller.current(), Some(SourceId::Volume));
}
