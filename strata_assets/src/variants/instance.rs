use crate::{MeshAssetError, MeshData};

/// Decoded instance mesh: vertex colored triangles labeled with a semantic object per face
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstanceMeshSource {
    pub positions: Vec<glam::Vec3>,
    /// Empty, or one per vertex
    pub colors: Vec<glam::Vec3>,
    pub indices: Vec<u32>,
    /// One per triangle
    pub object_ids: Vec<u32>,
}

impl InstanceMeshSource {
    pub(crate) fn build(self) -> Result<(MeshData, InstanceMeshData), MeshAssetError> {
        let geometry = MeshData::new(self.positions, self.indices)?.with_colors(self.colors)?;
        if self.object_ids.len() != geometry.triangle_count() {
            tracing::warn!(
                "Instance mesh has {} object ids for {} faces",
                self.object_ids.len(),
                geometry.triangle_count()
            );
            return Err(MeshAssetError::MalformedAsset(format!(
                "{} object ids for {} faces",
                self.object_ids.len(),
                geometry.triangle_count()
            )));
        }
        Ok((
            geometry,
            InstanceMeshData {
                object_ids: self.object_ids,
            },
        ))
    }
}

/// Per face semantic labels of an instance mesh
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceMeshData {
    object_ids: Vec<u32>,
}

impl InstanceMeshData {
    pub fn face_count(&self) -> usize {
        self.object_ids.len()
    }

    /// Object the triangle `face` belongs to
    pub fn object_id(&self, face: usize) -> Option<u32> {
        self.object_ids.get(face).copied()
    }

    pub fn faces_with_object(&self, object_id: u32) -> impl Iterator<Item = usize> + '_ {
        self.object_ids
            .iter()
            .enumerate()
            .filter(move |(_, id)| **id == object_id)
            .map(|(face, _)| face)
    }

    /// Distinct object ids, ascending
    pub fn object_ids(&self) -> Vec<u32> {
        let mut ids = self.object_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
