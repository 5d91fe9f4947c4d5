//! Which source owns the surface, and the containers each source exposes

use crate::error::NotchError;
use crate::event::{SourceEvent, SourceId};
use crate::view::{View, ViewError};
use std::collections::BTreeMap;
use std::rc::Rc;

pub type ViewHandle = Rc<dyn View>;

/// Called on activation with the source's containers and the previous owner
pub type ActivateHook = Box<dyn FnMut(&Containers, Option<SourceId>) -> Result<(), ViewError>>;

/// Receives each event of the source so its views can refresh their content
pub type UpdateHook = Box<dyn FnMut(&SourceEvent)>;

/// View slots of one source. Any slot may be empty.
#[derive(Clone, Default)]
pub struct Containers {
    pub compact: Option<ViewHandle>,
    pub expanded: Option<ViewHandle>,
    pub secondary: Option<ViewHandle>,
}

impl Containers {
    pub fn iter(&self) -> impl Iterator<Item = &ViewHandle> {
        [&self.compact, &self.expanded, &self.secondary]
            .into_iter()
            .flatten()
    }
}

/// Everything the registry knows about one source
#[derive(Default)]
pub struct Registration {
    containers: Containers,
    on_activate: Option<ActivateHook>,
    on_update: Option<UpdateHook>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact(mut self, view: ViewHandle) -> Self {
        self.containers.compact = Some(view);
        self
    }

    pub fn expanded(mut self, view: ViewHandle) -> Self {
        self.containers.expanded = Some(view);
        self
    }

    pub fn secondary(mut self, view: ViewHandle) -> Self {
        self.containers.secondary = Some(view);
        self
    }

    /// Replace the default activation behaviour, which shows the compact container
    pub fn on_activate<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Containers, Option<SourceId>) -> Result<(), ViewError> + 'static,
    {
        self.on_activate = Some(Box::new(hook));
        self
    }

    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&SourceEvent) + 'static,
    {
        self.on_update = Some(Box::new(hook));
        self
    }

    pub fn containers(&self) -> &Containers {
        &self.containers
    }

    pub fn expanded_container(&self) -> Option<&ViewHandle> {
        self.containers.expanded.as_ref()
    }

    pub fn secondary_container(&self) -> Option<&ViewHandle> {
        self.containers.secondary.as_ref()
    }

    fn activate(&mut self, previous: Option<SourceId>) -> Result<(), ViewError> {
        match self.on_activate.as_mut() {
            Some(hook) => hook(&self.containers, previous),
            None => self.containers.compact.as_ref().map_or(Ok(()), |view| view.show()),
        }
    }
}

/// Registrations keyed by source plus the current owner of the surface
///
/// Switching never hides the previous owner; callers do that through the
/// containers each registration exposes.
#[derive(Default)]
pub struct PresenterRegistry {
    presenters: BTreeMap<SourceId, Registration>,
    current: Option<SourceId>,
}

impl PresenterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` and keeps the existing entry if `id` is already registered
    pub fn register(&mut self, id: SourceId, registration: Registration) -> bool {
        if self.presenters.contains_key(&id) {
            tracing::debug!(%id, "presenter already registered");
            return false;
        }
        self.presenters.insert(id, registration);
        true
    }

    pub fn get(&self, id: SourceId) -> Option<&Registration> {
        self.presenters.get(&id)
    }

    pub fn is_registered(&self, id: SourceId) -> bool {
        self.presenters.contains_key(&id)
    }

    pub fn current(&self) -> Option<SourceId> {
        self.current
    }

    /// Make `id` the owner and run its activation hook
    ///
    /// Returns `Ok(false)` without doing anything when `id` already owns the
    /// surface and `force` is not set.
    pub fn switch_to(&mut self, id: SourceId, force: bool) -> Result<bool, NotchError> {
        if self.current == Some(id) && !force {
            return Ok(false);
        }

        let registration = self
            .presenters
            .get_mut(&id)
            .ok_or(NotchError::Unregistered(id))?;

        let previous = self.current.replace(id);
        tracing::debug!(%id, ?previous, "surface owner switched");
        registration
            .activate(previous)
            .map_err(|error| NotchError::View { owner: id, error })?;
        Ok(true)
    }

    /// Hand an event to the source's update hook
    pub fn update(&mut self, event: &SourceEvent) -> Result<(), NotchError> {
        let id = event.source();
        let registration = self
            .presenters
            .get_mut(&id)
            .ok_or(NotchError::Unregistered(id))?;
        if let Some(hook) = registration.on_update.as_mut() {
            hook(event);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &Registration)> {
        self.presenters.iter().map(|(id, r)| (*id, r))
    }

    /// Hide every container and drop all registrations
    pub fn clear(&mut self) {
        for (id, registration) in &self.presenters {
            for view in registration.containers.iter() {
                if let Err(err) = view.hide() {
                    tracing::warn!(%id, "failed to hide container during teardown: {}", err);
                }
            }
        }
        self.presenters.clear();
        self.current = None;
    }
}
