use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::{MeshAsset, MeshHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshStoreConfig {
    /// Ticks a mesh survives without being touched
    pub ttl: u16,
}

impl Default for MeshStoreConfig {
    fn default() -> Self {
        Self { ttl: 600 }
    }
}

#[derive(Debug)]
struct StoredMesh {
    asset: MeshAsset,
    ttl: u16,
}

/// Cache owning every loaded mesh asset.
///
/// Meshes not touched for [`MeshStoreConfig::ttl`] ticks are evicted. Eviction drops the asset,
/// which releases its device buffers.
#[derive(Debug, Resource, Default)]
pub struct MeshStore {
    config: MeshStoreConfig,
    next_id: u64,
    meshes: HashMap<MeshHandle, StoredMesh>,
}

impl MeshStore {
    pub fn new(config: MeshStoreConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &MeshStoreConfig {
        &self.config
    }

    pub fn insert(&mut self, asset: MeshAsset) -> MeshHandle {
        let handle = MeshHandle::new(self.next_id);
        self.next_id += 1;
        assert!(
            self.meshes
                .insert(
                    handle,
                    StoredMesh {
                        asset,
                        ttl: self.config.ttl,
                    }
                )
                .is_none(),
            "Mesh handles are never reused"
        );
        handle
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&MeshAsset> {
        self.meshes.get(&handle).map(|stored| &stored.asset)
    }

    pub fn get_mut(&mut self, handle: MeshHandle) -> Option<&mut MeshAsset> {
        self.meshes.get_mut(&handle).map(|stored| &mut stored.asset)
    }

    /// Mark a mesh as in use, restoring its full ttl. Returns false for unknown handles
    pub fn touch(&mut self, handle: MeshHandle) -> bool {
        match self.meshes.get_mut(&handle) {
            Some(stored) => {
                stored.ttl = self.config.ttl;
                true
            }
            None => false,
        }
    }

    /// Remove a mesh, return [`None`] if removing a non-existent mesh
    pub fn remove(&mut self, handle: MeshHandle) -> Option<MeshAsset> {
        self.meshes.remove(&handle).map(|stored| stored.asset)
    }

    /// Age every mesh by one tick and evict those which ran out, returning their handles
    pub fn tick(&mut self) -> Vec<MeshHandle> {
        let mut evicted = Vec::new();
        self.meshes.retain(|handle, stored| {
            stored.ttl = stored.ttl.saturating_sub(1);
            if stored.ttl == 0 {
                tracing::info!(
                    "Evicting mesh {:?} ({:?})",
                    handle,
                    stored.asset.label()
                );
                evicted.push(*handle);
                false
            } else {
                true
            }
        });
        evicted.sort_unstable();
        evicted
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = MeshHandle> + '_ {
        self.meshes.keys().copied()
    }
}
