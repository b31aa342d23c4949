use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    Wheel,
    Resize,
    KeyDown,
}

impl EventKind {
    pub const POINTER: [EventKind; 3] =
        [EventKind::PointerDown, EventKind::PointerMove, EventKind::PointerUp];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Host-side event subscriptions, per drawing surface.
///
/// Mirrors how a canvas library registers handlers: `attach` always adds a
/// new subscription, so callers are responsible for not attaching twice.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_surface: u64,
    next_listener: u64,
    listeners: HashMap<SurfaceId, Vec<(EventKind, ListenerId)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_surface(&mut self) -> SurfaceId {
        self.next_surface += 1;
        let surface = SurfaceId(self.next_surface);
        self.listeners.insert(surface, Vec::new());
        surface
    }

    pub fn attach(&mut self, surface: SurfaceId, kind: EventKind) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.entry(surface).or_default().push((kind, id));
        log::trace!("surface {} +{kind:?} ({:?})", surface.raw(), id);
        id
    }

    pub fn attach_all(&mut self, surface: SurfaceId, kinds: &[EventKind]) -> Vec<ListenerId> {
        kinds.iter().map(|kind| self.attach(surface, *kind)).collect()
    }

    /// Removes every subscription of `kind` on `surface`, returning how many were dropped.
    pub fn detach_kind(&mut self, surface: SurfaceId, kind: EventKind) -> usize {
        let Some(entries) = self.listeners.get_mut(&surface) else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|(existing, _)| *existing != kind);
        before - entries.len()
    }

    /// Tears down a surface entirely (replacement or unmount).
    pub fn detach_surface(&mut self, surface: SurfaceId) -> usize {
        let removed = self.listeners.remove(&surface).map(|entries| entries.len()).unwrap_or(0);
        if removed > 0 {
            log::debug!("surface {} torn down, {removed} listeners removed", surface.raw());
        }
        removed
    }

    pub fn listener_count(&self, surface: SurfaceId, kind: EventKind) -> usize {
        self.listeners
            .get(&surface)
            .map(|entries| entries.iter().filter(|(existing, _)| *existing == kind).count())
            .unwrap_or(0)
    }

    pub fn total_listeners(&self, surface: SurfaceId) -> usize {
        self.listeners.get(&surface).map(Vec::len).unwrap_or(0)
    }

    pub fn is_live(&self, surface: SurfaceId) -> bool {
        self.listeners.contains_key(&surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_is_not_deduplicated() {
        let mut registry = ListenerRegistry::new();
        let surface = registry.create_surface();

        registry.attach(surface, EventKind::Wheel);
        registry.attach(surface, EventKind::Wheel);

        assert_eq!(registry.listener_count(surface, EventKind::Wheel), 2);
    }

    #[test]
    fn detach_kind_leaves_other_kinds() {
        let mut registry = ListenerRegistry::new();
        let surface = registry.create_surface();

        registry.attach_all(surface, &EventKind::POINTER);
        registry.attach(surface, EventKind::Resize);

        assert_eq!(registry.detach_kind(surface, EventKind::PointerMove), 1);
        assert_eq!(registry.listener_count(surface, EventKind::PointerMove), 0);
        assert_eq!(registry.listener_count(surface, EventKind::Resize), 1);
        assert_eq!(registry.total_listeners(surface), 3);
    }

    #[test]
    fn surfaces_are_isolated() {
        let mut registry = ListenerRegistry::new();
        let first = registry.create_surface();
        let second = registry.create_surface();
        assert_ne!(first, second);

        registry.attach(first, EventKind::Wheel);
        assert_eq!(registry.listener_count(second, EventKind::Wheel), 0);

        assert_eq!(registry.detach_surface(first), 1);
        assert!(!registry.is_live(first));
        assert!(registry.is_live(second));
        assert_eq!(registry.detach_surface(first), 0);
    }
}
