use core::fmt;
use std::collections::{BTreeSet, HashMap};

use crate::error::RegistryError;
use crate::protocol::EntityId;
use crate::surface::DrawingSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Agent,
    Obstacle,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Agent => "agent",
            EntityKind::Obstacle => "obstacle",
        })
    }
}

/// On-screen state owned by the registry for one entity.
pub trait VisualHandle {
    /// Destroys every drawable this handle owns.
    fn release(&self, surface: &mut dyn DrawingSurface);
}

/// Identity → handle store for one entity kind.
///
/// Holds at most one handle per id. Iteration order carries no meaning; depth is assigned by the
/// scene composer, not by insertion order.
#[derive(Debug)]
pub struct EntityRegistry<H> {
    kind: EntityKind,
    handles: HashMap<EntityId, H>,
}

impl<H: VisualHandle> EntityRegistry<H> {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            handles: HashMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn get(&self, id: &EntityId) -> Option<&H> {
        self.handles.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut H> {
        self.handles.get_mut(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.handles.contains_key(id)
    }

    /// Registers a new handle. Callers check with [`Self::get`] first; a second insert for the
    /// same id is a bug and is refused.
    pub fn insert(&mut self, id: EntityId, handle: H) -> Result<(), RegistryError> {
        if self.handles.contains_key(&id) {
            return Err(RegistryError::Duplicate {
                kind: self.kind,
                id,
            });
        }
        self.handles.insert(id, handle);
        Ok(())
    }

    /// Releases the handle's drawables and forgets the id. Returns whether anything was removed.
    pub fn remove_if_present(&mut self, id: &EntityId, surface: &mut dyn DrawingSurface) -> bool {
        match self.handles.remove(id) {
            Some(handle) => {
                handle.release(surface);
                true
            }
            None => false,
        }
    }

    pub fn all_ids(&self) -> BTreeSet<EntityId> {
        self.handles.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &H)> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Viewport;
    use crate::surface::{DrawableId, RetainedSurface};

    struct Glyph(DrawableId);

    impl VisualHandle for Glyph {
        fn release(&self, surface: &mut dyn DrawingSurface) {
            surface.destroy(self.0);
        }
    }

    #[test]
    fn second_insert_for_an_id_is_refused() {
        let mut surface = RetainedSurface::new(Viewport::default());
        let mut registry = EntityRegistry::new(EntityKind::Agent);
        registry
            .insert(EntityId::Int(3), Glyph(surface.create()))
            .expect("first insert");

        let err = registry
            .insert(EntityId::Int(3), Glyph(surface.create()))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Duplicate {
                kind: EntityKind::Agent,
                ..
            }
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn integer_and_text_ids_are_distinct() {
        let mut surface = RetainedSurface::new(Viewport::default());
        let mut registry = EntityRegistry::new(EntityKind::Obstacle);
        registry
            .insert(EntityId::Int(7), Glyph(surface.create()))
            .expect("int id");
        registry
            .insert(EntityId::Text("7".to_string()), Glyph(surface.create()))
            .expect("text id");
        assert_eq!(registry.all_ids().len(), 2);
    }

    #[test]
    fn removal_releases_drawables_once() {
        let mut surface = RetainedSurface::new(Viewport::default());
        let mut registry = EntityRegistry::new(EntityKind::Agent);
        let drawable = surface.create();
        registry
            .insert(EntityId::Int(1), Glyph(drawable))
            .expect("insert");

        assert!(registry.remove_if_present(&EntityId::Int(1), &mut surface));
        assert!(!surface.contains(drawable));
        assert!(!registry.remove_if_present(&EntityId::Int(1), &mut surface));
        assert!(registry.is_empty());
    }
}
