use bevy_ecs::prelude::*;

/// A handle to a mesh asset in a [`crate::MeshStore`].
///
/// Ids are never reused by a store, a handle to an evicted mesh stays dangling instead of aliasing
/// a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Component)]
pub struct MeshHandle {
    id: u64,
}

impl MeshHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}
