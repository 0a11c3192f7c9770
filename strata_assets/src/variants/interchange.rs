use crate::{MeshAssetError, MeshData};

/// Decoded indexed triangle mesh from an interchange format
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterchangeMeshSource {
    pub positions: Vec<glam::Vec3>,
    /// Generated when absent or empty
    pub normals: Option<Vec<glam::Vec3>>,
    pub uvs: Option<Vec<glam::Vec2>>,
    pub indices: Vec<u32>,
}

impl InterchangeMeshSource {
    pub(crate) fn build(self) -> Result<(MeshData, InterchangeMeshData), MeshAssetError> {
        let mut geometry =
            MeshData::new(self.positions, self.indices)?.with_uvs(self.uvs.unwrap_or_default())?;
        let generated_normals = match self.normals {
            Some(normals) if !normals.is_empty() => {
                geometry = geometry.with_normals(normals)?;
                false
            }
            _ => {
                geometry.generate_smooth_normals();
                true
            }
        };
        Ok((geometry, InterchangeMeshData { generated_normals }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterchangeMeshData {
    generated_normals: bool,
}

impl InterchangeMeshData {
    /// Whether the source came without normals and they were generated on population
    pub fn has_generated_normals(&self) -> bool {
        self.generated_normals
    }
}
