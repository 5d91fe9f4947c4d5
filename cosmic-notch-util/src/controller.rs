//! The arbiter deciding which source owns the surface
//!
//! Every entry point (source events, pointer callbacks, timers) runs to
//! completion on the host's loop. The host feeds events in, then sleeps until
//! [`NotchController::next_deadline`] and calls [`NotchController::advance`].

use crate::animation::{AnimationEngine, Finished, Frame, Start};
use crate::clock::Clock;
use crate::cycle::CycleManager;
use crate::error::NotchError;
use crate::event::{Policy, RestoreToken, SourceEvent, SourceId};
use crate::flyover::{Flyover, FlyoverPath};
use crate::geometry::{Anchor, Point};
use crate::presenter::{PresenterRegistry, Registration};
use crate::state_machine::{NotchState, NotchStateMachine};
use crate::timer::TimerRegistry;
use crate::view::Surface;
use cosmic_notch_config::NotchConfig;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source shown when nothing else claims the surface
pub const IDLE_SOURCE: SourceId = SourceId::Battery;

/// Names of the timers the controller arms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    Collapse,
    BatteryAutoCollapse,
    Volume,
    Brightness,
    Bluetooth,
    Camera,
    MediaSwitch,
    AnimationFrame,
    Flyover,
}

impl TimerKey {
    /// Auto-collapse timer of an overlay source
    pub fn auto_collapse(source: SourceId) -> Option<TimerKey> {
        match source {
            SourceId::Battery => Some(TimerKey::BatteryAutoCollapse),
            SourceId::Volume => Some(TimerKey::Volume),
            SourceId::Brightness => Some(TimerKey::Brightness),
            SourceId::Bluetooth => Some(TimerKey::Bluetooth),
            SourceId::Camera => Some(TimerKey::Camera),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TimerKey::Collapse => "collapse",
            TimerKey::BatteryAutoCollapse => "battery-auto-collapse",
            TimerKey::Volume => "volume",
            TimerKey::Brightness => "brightness",
            TimerKey::Bluetooth => "bluetooth",
            TimerKey::Camera => "camera",
            TimerKey::MediaSwitch => "media-switch",
            TimerKey::AnimationFrame => "animation-frame",
            TimerKey::Flyover => "flyover",
        }
    }
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const OVERLAY_TIMERS: [TimerKey; 5] = [
    TimerKey::BatteryAutoCollapse,
    TimerKey::Volume,
    TimerKey::Brightness,
    TimerKey::Bluetooth,
    TimerKey::Camera,
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum TimerAction {
    CollapseCheck,
    AutoCollapse(SourceId),
    MediaSwitch,
    AnimationFrame,
    FlyoverFrame,
}

pub struct NotchController {
    config: NotchConfig,
    anchor: Anchor,
    clock: Rc<dyn Clock>,
    surface: Rc<dyn Surface>,
    registry: PresenterRegistry,
    stack: CycleManager<SourceId>,
    timers: TimerRegistry<TimerKey, TimerAction>,
    machine: NotchStateMachine,
    engine: AnimationEngine,
    /// Restoration token per overlay family
    tokens: HashMap<SourceId, RestoreToken>,
    /// Overlay owning the surface until its collapse completes
    active_overlay: Option<SourceId>,
    flyover: Option<Flyover>,
    pointer: Option<Point>,
    pointer_inside: bool,
    destroyed: bool,
}

impl NotchController {
    pub fn new(
        config: NotchConfig,
        anchor: Anchor,
        clock: Rc<dyn Clock>,
        surface: Rc<dyn Surface>,
    ) -> Self {
        let engine = AnimationEngine::new(&config, anchor);
        Self {
            timers: TimerRegistry::new(clock.clone()),
            config,
            anchor,
            clock,
            surface,
            registry: PresenterRegistry::new(),
            stack: CycleManager::new(),
            machine: NotchStateMachine::new(),
            engine,
            tokens: HashMap::new(),
            active_overlay: None,
            flyover: None,
            pointer: None,
            pointer_inside: false,
            destroyed: false,
        }
    }

    /// Register the views of a source. A source can only be registered once.
    pub fn register(&mut self, id: SourceId, registration: Registration) -> bool {
        if self.destroyed {
            return false;
        }
        self.registry.register(id, registration)
    }

    /// Show the idle source on a compact surface
    pub fn start(&mut self) {
        if self.destroyed {
            return;
        }
        self.apply_frame(self.engine.current_frame());
        let initial = self.stack.current().copied().unwrap_or(IDLE_SOURCE);
        if let Err(err) = self.present(initial) {
            tracing::error!("failed to show initial source: {}", err);
        }
    }

    pub fn config(&self) -> &NotchConfig {
        &self.config
    }

    /// Apply new sizes, durations and timeouts
    ///
    /// Running animations and armed timers keep their timing; the surface is
    /// re-laid out right away when nothing is moving.
    pub fn set_config(&mut self, config: NotchConfig) {
        if self.destroyed {
            return;
        }
        self.engine.reconfigure(&config, self.anchor);
        self.config = config;
        if !self.engine.is_running() {
            self.apply_frame(self.engine.current_frame());
        }
    }

    /// Move the region the surface is centered on
    pub fn set_anchor(&mut self, anchor: Anchor) {
        if self.destroyed {
            return;
        }
        self.anchor = anchor;
        self.engine.reconfigure(&self.config, anchor);
        if !self.engine.is_running() {
            self.apply_frame(self.engine.current_frame());
        }
    }

    pub fn state(&self) -> NotchState {
        self.machine.state()
    }

    pub fn progress(&self) -> f32 {
        self.engine.progress()
    }

    /// Source currently owning the surface
    pub fn current(&self) -> Option<SourceId> {
        self.registry.current()
    }

    pub fn active_overlay(&self) -> Option<SourceId> {
        self.active_overlay
    }

    pub fn restore_token(&self, overlay: SourceId) -> Option<RestoreToken> {
        self.tokens.get(&overlay).copied()
    }

    /// Sticky sources, most recently activated first
    pub fn sticky_sources(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.stack.iter().copied()
    }

    pub fn is_armed(&self, key: TimerKey) -> bool {
        self.timers.has(&key)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_flyover_running(&self) -> bool {
        self.flyover.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.destroyed {
            return None;
        }
        self.timers.next_deadline()
    }

    /// Run every timer that is due. Returns how many fired.
    pub fn advance(&mut self) -> usize {
        let mut fired = 0;
        while !self.destroyed {
            let Some((key, action)) = self.timers.pop_due() else {
                break;
            };
            fired += 1;
            if let Err(err) = self.on_timer(action) {
                tracing::error!("timer '{}' failed: {}", key, err);
            }
        }
        fired
    }

    pub fn handle_event(&mut self, event: SourceEvent) {
        if self.destroyed {
            tracing::trace!(source = %event.source(), "event after destroy ignored");
            return;
        }
        let source = event.source();
        if let Err(err) = self.dispatch_event(&event) {
            tracing::error!("failed to handle {} event: {}", source, err);
        }
    }

    pub fn pointer_entered(&mut self) {
        if self.destroyed {
            return;
        }
        self.pointer_inside = true;
        self.timers.clear(&TimerKey::Collapse);
        for key in OVERLAY_TIMERS {
            self.timers.clear(&key);
        }
        if self.flyover.is_some() {
            if let Err(err) = self.finish_flyover(false) {
                tracing::error!("failed to end flyover on hover: {}", err);
            }
        }
        self.expand(false);
    }

    pub fn pointer_moved(&mut self, position: Point) {
        if self.destroyed {
            return;
        }
        self.pointer = Some(position);
        // An enter that arrived mid-collapse was refused
        if self.pointer_inside && self.machine.is_compact() {
            self.expand(false);
        }
    }

    /// Bring the sticky source peeking in through the secondary container
    /// forward. Returns whether the owner changed.
    pub fn secondary_activated(&mut self) -> bool {
        if self.destroyed
            || self.stack.count() < 2
            || self.active_overlay.is_some()
            || self.flyover.is_some()
        {
            return false;
        }
        let Some(next) = self.stack.next().copied() else {
            return false;
        };
        tracing::debug!(%next, "sticky sources swapped");
        if let Err(err) = self.present(next) {
            tracing::error!("failed to swap sticky sources: {}", err);
            return false;
        }
        self.pulse();
        true
    }

    pub fn pointer_left(&mut self) {
        if self.destroyed {
            return;
        }
        self.pointer_inside = false;
        self.timers
            .set(TimerKey::Collapse, self.config.hover_grace(), TimerAction::CollapseCheck);
    }

    /// Request expansion. Returns whether an animation was started or redirected.
    ///
    /// A forced request on an expanded surface is accepted without animating;
    /// the caller has already swapped the expanded view.
    pub fn expand(&mut self, force: bool) -> bool {
        if self.destroyed {
            return false;
        }
        if self.machine.is_expanded() {
            if force {
                tracing::debug!(owner = ?self.registry.current(), "expanded view swapped");
            }
            return false;
        }
        if !self.machine.can_expand(force) {
            tracing::debug!(state = %self.machine.state(), "expand refused");
            return false;
        }
        self.machine.transition_to(NotchState::Animating);
        self.start_animation(1.0);
        true
    }

    /// Request a collapse. Refused unless expanded and idle.
    pub fn collapse(&mut self) -> bool {
        if self.destroyed || !self.machine.can_collapse() {
            return false;
        }
        self.machine.transition_to(NotchState::Animating);
        self.start_animation(0.0);
        true
    }

    /// Tear everything down. Safe to call repeatedly and mid-animation.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        tracing::debug!("destroying notch controller");
        self.destroyed = true;
        self.timers.clear_all();
        if self.flyover.take().is_some() {
            self.surface.set_flyover(None);
        }
        self.pointer = None;
        self.pointer_inside = false;
        self.engine.destroy();
        self.registry.clear();
        self.stack.clear();
        self.tokens.clear();
        self.active_overlay = None;
    }

    fn dispatch_event(&mut self, event: &SourceEvent) -> Result<(), NotchError> {
        let source = event.source();
        self.registry.update(event)?;
        tracing::debug!(%source, active = event.is_active(), "source event");

        match source.policy() {
            Policy::Sticky if event.is_active() => self.claim_sticky(source),
            Policy::Sticky if source == SourceId::Media => {
                if self.stack.has(&source) {
                    self.timers.set(
                        TimerKey::MediaSwitch,
                        self.config.media_switch_delay(),
                        TimerAction::MediaSwitch,
                    );
                }
                Ok(())
            }
            Policy::Sticky => self.release_sticky(source),
            Policy::Overlay if event.is_active() => self.show_overlay(source),
            // Camera stop and plain battery reports only refresh the views
            Policy::Overlay => Ok(()),
            Policy::Flyover => self.start_flyover(source),
        }
    }

    fn claim_sticky(&mut self, source: SourceId) -> Result<(), NotchError> {
        if source == SourceId::Media {
            self.timers.clear(&TimerKey::MediaSwitch);
        }
        self.stack.activate(source);

        if self.active_overlay.is_some() {
            tracing::debug!(%source, "sticky source queued behind overlay");
            return Ok(());
        }
        if let Some(flyover) = self.flyover.as_mut() {
            flyover.return_to(source);
            return Ok(());
        }
        if self.registry.current() == Some(source) {
            return Ok(());
        }

        self.present(source)?;
        self.pulse();
        Ok(())
    }

    fn release_sticky(&mut self, source: SourceId) -> Result<(), NotchError> {
        if !self.stack.deactivate(&source) {
            return Ok(());
        }
        if self.active_overlay.is_some() {
            return Ok(());
        }

        let fallback = self.stack.current().copied().unwrap_or(IDLE_SOURCE);
        if let Some(flyover) = self.flyover.as_mut() {
            if flyover.previous() == Some(source) {
                flyover.return_to(fallback);
            }
            return Ok(());
        }
        match self.registry.current() {
            Some(owner) if owner != source => {
                // The released source may still peek in through the split
                tracing::debug!(%source, %owner, "sticky source released behind owner");
                return self.present(owner);
            }
            None => return Ok(()),
            Some(_) => {}
        }

        tracing::debug!(%source, %fallback, "sticky source released");
        self.present(fallback)?;
        self.pulse();
        Ok(())
    }

    fn show_overlay(&mut self, source: SourceId) -> Result<(), NotchError> {
        let Some(key) = TimerKey::auto_collapse(source) else {
            return Ok(());
        };
        if !self.registry.is_registered(source) {
            return Err(NotchError::Unregistered(source));
        }
        if source == SourceId::Battery
            && !(self.machine.is_compact() || self.active_overlay == Some(SourceId::Battery))
        {
            tracing::debug!(state = %self.machine.state(), "charge start ignored");
            return Ok(());
        }

        let visible = match self.flyover.as_ref() {
            Some(flyover) => flyover.previous(),
            None => self.registry.current(),
        };
        self.cancel_flyover();

        let token = match self.active_overlay {
            Some(active) => {
                if active != source {
                    if let Some(previous_key) = TimerKey::auto_collapse(active) {
                        self.timers.clear(&previous_key);
                    }
                }
                self.tokens
                    .remove(&active)
                    .unwrap_or_else(|| RestoreToken::for_owner(visible))
            }
            None => RestoreToken::for_owner(visible),
        };
        tracing::debug!(%source, ?token, "overlay shown");
        self.tokens.insert(source, token);
        self.active_overlay = Some(source);

        self.present(source)?;
        self.expand(true);
        self.timers
            .set(key, self.overlay_timeout(source), TimerAction::AutoCollapse(source));
        Ok(())
    }

    fn overlay_timeout(&self, source: SourceId) -> Duration {
        let ms = match source {
            SourceId::Volume => self.config.timeout_volume_ms,
            SourceId::Brightness => self.config.timeout_brightness_ms,
            SourceId::Bluetooth => self.config.timeout_bluetooth_ms,
            SourceId::Camera => self.config.timeout_camera_ms,
            _ => self.config.timeout_battery_ms,
        };
        Duration::from_millis(ms as u64)
    }

    /// Hand the surface back after an overlay has collapsed
    fn restore_after_overlay(&mut self) -> Result<(), NotchError> {
        let Some(overlay) = self.active_overlay.take() else {
            return Ok(());
        };
        let token = self.tokens.remove(&overlay);
        if let Some(key) = TimerKey::auto_collapse(overlay) {
            self.timers.clear(&key);
        }

        let target = self.restore_target(token);
        tracing::debug!(%overlay, ?token, %target, "restoring after overlay");
        self.present(target)?;
        self.pulse();
        Ok(())
    }

    /// Sticky media first, then the token, then the stack, then idle
    fn restore_target(&self, token: Option<RestoreToken>) -> SourceId {
        if self.stack.has(&SourceId::Media) {
            return SourceId::Media;
        }
        token
            .map(RestoreToken::source)
            .filter(|source| *source != IDLE_SOURCE && self.is_restorable(*source))
            .or_else(|| self.stack.current().copied())
            .unwrap_or(IDLE_SOURCE)
    }

    fn is_restorable(&self, source: SourceId) -> bool {
        self.registry.is_registered(source)
            && (source.policy() != Policy::Sticky || self.stack.has(&source))
    }

    fn start_flyover(&mut self, source: SourceId) -> Result<(), NotchError> {
        if !self.machine.is_compact() || self.active_overlay.is_some() {
            tracing::debug!(%source, state = %self.machine.state(), "flyover skipped");
            return Ok(());
        }
        if !self.registry.is_registered(source) {
            return Err(NotchError::Unregistered(source));
        }

        let previous = match self.flyover.as_ref() {
            Some(flyover) => flyover.previous(),
            None => self.registry.current(),
        };
        self.present(source)?;

        let now = self.clock.now();
        let path = FlyoverPath::new(
            self.engine.layout().compact_rect(),
            self.config.flyover_icon_size,
            self.config.flyover_padding,
        );
        let flyover = Flyover::new(
            source,
            previous,
            path,
            now,
            self.config.flyover_duration(),
            self.config.flyover_fade(),
        );
        self.surface.set_flyover(flyover.frame_at(now));
        self.flyover = Some(flyover);
        self.timers
            .set(TimerKey::Flyover, self.config.frame_interval(), TimerAction::FlyoverFrame);
        Ok(())
    }

    /// Remove the icon and give the surface back to whoever had it
    fn finish_flyover(&mut self, pulse: bool) -> Result<(), NotchError> {
        let Some(flyover) = self.flyover.take() else {
            return Ok(());
        };
        self.timers.clear(&TimerKey::Flyover);
        self.surface.set_flyover(None);

        let target = flyover
            .previous()
            .filter(|source| self.is_restorable(*source))
            .or_else(|| self.stack.current().copied())
            .unwrap_or(IDLE_SOURCE);
        self.present(target)?;
        if pulse {
            self.pulse();
        }
        Ok(())
    }

    fn cancel_flyover(&mut self) {
        if self.flyover.take().is_some() {
            self.timers.clear(&TimerKey::Flyover);
            self.surface.set_flyover(None);
        }
    }

    fn on_timer(&mut self, action: TimerAction) -> Result<(), NotchError> {
        match action {
            TimerAction::AnimationFrame => self.on_animation_frame(),
            TimerAction::CollapseCheck => {
                self.on_collapse_check();
                Ok(())
            }
            TimerAction::AutoCollapse(source) => self.on_auto_collapse(source),
            TimerAction::MediaSwitch => self.release_sticky(SourceId::Media),
            TimerAction::FlyoverFrame => self.on_flyover_frame(),
        }
    }

    fn on_animation_frame(&mut self) -> Result<(), NotchError> {
        let Some(outcome) = self.engine.step(self.clock.now()) else {
            return Ok(());
        };
        self.apply_frame(outcome.frame);

        match outcome.finished {
            Some(Finished::Transition(target)) => self.finish_transition(target),
            Some(Finished::Bounce) => Ok(()),
            None => {
                self.timers.set(
                    TimerKey::AnimationFrame,
                    self.config.frame_interval(),
                    TimerAction::AnimationFrame,
                );
                Ok(())
            }
        }
    }

    fn on_collapse_check(&mut self) {
        if self.pointer_inside {
            return;
        }
        let near = self.pointer.is_some_and(|pointer| {
            self.engine
                .layout()
                .expanded_rect()
                .contains_with_margin(pointer, self.config.hover_margin)
        });
        if self.machine.is_animating() || (self.machine.is_expanded() && near) {
            self.timers
                .set(TimerKey::Collapse, self.config.hover_grace(), TimerAction::CollapseCheck);
            return;
        }
        self.collapse();
    }

    fn on_auto_collapse(&mut self, source: SourceId) -> Result<(), NotchError> {
        if self.active_overlay != Some(source) {
            tracing::warn!(%source, "stale auto-collapse ignored");
            return Ok(());
        }
        match self.machine.state() {
            NotchState::Expanded => {
                self.collapse();
                Ok(())
            }
            NotchState::Animating => {
                if let Some(key) = TimerKey::auto_collapse(source) {
                    self.timers
                        .set(key, self.config.frame_interval(), TimerAction::AutoCollapse(source));
                }
                Ok(())
            }
            NotchState::Compact => self.restore_after_overlay(),
        }
    }

    fn on_flyover_frame(&mut self) -> Result<(), NotchError> {
        let Some(frame) = self
            .flyover
            .as_ref()
            .and_then(|flyover| flyover.frame_at(self.clock.now()))
        else {
            return self.finish_flyover(true);
        };
        self.surface.set_flyover(Some(frame));
        self.timers
            .set(TimerKey::Flyover, self.config.frame_interval(), TimerAction::FlyoverFrame);
        Ok(())
    }

    fn start_animation(&mut self, target: f32) {
        match self.engine.animate_to(target, self.clock.now()) {
            Some(Start::Running) => {
                self.timers.set(
                    TimerKey::AnimationFrame,
                    self.config.frame_interval(),
                    TimerAction::AnimationFrame,
                );
            }
            Some(Start::Settled(frame)) => {
                self.timers.clear(&TimerKey::AnimationFrame);
                self.apply_frame(frame);
                if let Err(err) = self.finish_transition(target) {
                    tracing::error!("failed to settle animation: {}", err);
                }
            }
            None => {}
        }
    }

    fn finish_transition(&mut self, target: f32) -> Result<(), NotchError> {
        let state = self.machine.complete(target);
        tracing::debug!(%state, "transition finished");
        if state == NotchState::Compact && self.active_overlay.is_some() {
            self.restore_after_overlay()?;
        }
        Ok(())
    }

    /// Width pulse acknowledging a change while compact
    fn pulse(&mut self) {
        if self.machine.is_compact() && self.engine.start_bounce(self.clock.now()) {
            self.timers.set(
                TimerKey::AnimationFrame,
                self.config.frame_interval(),
                TimerAction::AnimationFrame,
            );
        }
    }

    /// Make `source` the only visible registration
    ///
    /// Hide and show failures are logged per container and do not stop the
    /// switch; an unregistered `source` leaves everything untouched.
    fn present(&mut self, source: SourceId) -> Result<(), NotchError> {
        if !self.registry.is_registered(source) {
            return Err(NotchError::Unregistered(source));
        }

        for (id, registration) in self.registry.iter().filter(|(id, _)| *id != source) {
            for view in registration.containers().iter() {
                if let Err(err) = view.hide() {
                    tracing::warn!(%id, "failed to hide container: {}", err);
                }
            }
        }

        match self.registry.switch_to(source, true) {
            Err(NotchError::View { owner, error }) => {
                tracing::warn!(%owner, "activation hook failed: {}", error);
            }
            other => {
                other?;
            }
        }

        if let Some(registration) = self.registry.get(source) {
            // The owner never peeks in next to itself
            if let Some(view) = registration.secondary_container() {
                if let Err(err) = view.hide() {
                    tracing::warn!(%source, "failed to hide secondary container: {}", err);
                }
            }
            if let Some(view) = registration.expanded_container() {
                if let Err(err) = view.show() {
                    tracing::warn!(%source, "failed to show expanded container: {}", err);
                }
            }
        }

        self.show_split(source);
        Ok(())
    }

    /// With several sticky sources the next one peeks in through its
    /// secondary container
    fn show_split(&self, source: SourceId) {
        if self.stack.count() < 2 || self.stack.current() != Some(&source) {
            return;
        }
        let Some(next) = self.stack.peek_next().copied() else {
            return;
        };
        if let Some(view) = self.registry.get(next).and_then(Registration::secondary_container) {
            if let Err(err) = view.show() {
                tracing::warn!(%next, "failed to show secondary container: {}", err);
            }
        }
    }

    fn apply_frame(&self, frame: Frame) {
        self.surface.set_geometry(frame.geometry);
        self.surface.set_content(frame.compact, frame.expanded);
    }
}

impl Drop for NotchController {
    fn drop(&mut self) {
        self.destroy();
    }
}
