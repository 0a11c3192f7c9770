use std::ops::Range;

use crate::MeshAssetError;
use crate::error::device_u32;

/// Interleaved vertex layout handed to the device on upload
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 3],
}

/// Render ready geometry in the uniform layout every format populates.
///
/// Attribute arrays are either empty or exactly one entry per vertex. Indices always form a
/// triangle list whose entries are in `0..vertex_count`. Construction enforces both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    positions: Vec<glam::Vec3>,
    normals: Vec<glam::Vec3>,
    uvs: Vec<glam::Vec2>,
    colors: Vec<glam::Vec3>,
    indices: Vec<u32>,
}

fn malformed(message: impl Into<String>) -> MeshAssetError {
    let message = message.into();
    tracing::warn!("Rejecting mesh data: {}", message);
    MeshAssetError::MalformedAsset(message)
}

impl MeshData {
    /// Validates the topology against `positions`, attributes are added with the `with_*` methods
    pub fn new(positions: Vec<glam::Vec3>, indices: Vec<u32>) -> Result<Self, MeshAssetError> {
        if indices.len() % 3 != 0 {
            return Err(malformed(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(index) = indices.iter().find(|i| **i as usize >= positions.len()) {
            return Err(malformed(format!(
                "index {} out of range for {} vertices",
                index,
                positions.len()
            )));
        }
        Ok(Self {
            positions,
            indices,
            ..Default::default()
        })
    }

    fn check_attribute(&self, name: &str, len: usize) -> Result<(), MeshAssetError> {
        if len != 0 && len != self.positions.len() {
            return Err(malformed(format!(
                "{} {} entries for {} vertices",
                len,
                name,
                self.positions.len()
            )));
        }
        Ok(())
    }

    pub fn with_normals(mut self, normals: Vec<glam::Vec3>) -> Result<Self, MeshAssetError> {
        self.check_attribute("normal", normals.len())?;
        self.normals = normals;
        Ok(self)
    }

    pub fn with_uvs(mut self, uvs: Vec<glam::Vec2>) -> Result<Self, MeshAssetError> {
        self.check_attribute("uv", uvs.len())?;
        self.uvs = uvs;
        Ok(self)
    }

    pub fn with_colors(mut self, colors: Vec<glam::Vec3>) -> Result<Self, MeshAssetError> {
        self.check_attribute("color", colors.len())?;
        self.colors = colors;
        Ok(self)
    }

    pub fn positions(&self) -> &[glam::Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[glam::Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[glam::Vec2] {
        &self.uvs
    }

    pub fn colors(&self) -> &[glam::Vec3] {
        &self.colors
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Loaded but empty, as opposed to not loaded at all
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn view(&self) -> MeshView<'_> {
        MeshView {
            positions: &self.positions,
            normals: &self.normals,
            uvs: &self.uvs,
            colors: &self.colors,
            indices: &self.indices,
        }
    }

    /// View over a triangle aligned range of the index buffer, [`None`] if out of bounds
    pub fn view_range(&self, range: Range<usize>) -> Option<MeshView<'_>> {
        if range.start % 3 != 0 || range.end % 3 != 0 {
            return None;
        }
        let indices = self.indices.get(range)?;
        Some(MeshView {
            indices,
            ..self.view()
        })
    }

    pub fn collision_view(&self) -> strata_physics::CollisionGeometryView<'_> {
        strata_physics::CollisionGeometryView::new(&self.positions, &self.indices)
    }

    pub fn bounding_box(&self) -> strata_physics::BoundingBox {
        strata_physics::BoundingBox::from_points(&self.positions)
    }

    /// Bake `transform` into positions, normals follow the inverse transpose
    pub(crate) fn apply_transform(&mut self, transform: glam::Mat4) {
        for position in self.positions.iter_mut() {
            *position = transform.transform_point3(*position);
        }
        let normal_matrix = glam::Mat3::from_mat4(transform).inverse().transpose();
        for normal in self.normals.iter_mut() {
            *normal = (normal_matrix * *normal).normalize_or_zero();
        }
    }

    /// Area weighted smooth normals, replaces any existing normals
    pub(crate) fn generate_smooth_normals(&mut self) {
        let mut normals = vec![glam::Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for normal in normals.iter_mut() {
            *normal = normal.normalize_or_zero();
        }
        self.normals = normals;
    }

    /// Interleave attributes for upload, missing attributes are zeroed and missing colors are white
    pub fn gpu_vertices(&self) -> Vec<GpuVertex> {
        (0..self.positions.len())
            .map(|i| GpuVertex {
                position: self.positions[i].to_array(),
                normal: self.normals.get(i).copied().unwrap_or_default().to_array(),
                uv: self.uvs.get(i).copied().unwrap_or_default().to_array(),
                color: self.colors.get(i).copied().unwrap_or(glam::Vec3::ONE).to_array(),
            })
            .collect()
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Concatenate meshes, returning the merged mesh and each input's range in the index buffer
    ///
    /// Attributes missing from some inputs but present in others are zero filled.
    pub(crate) fn merge(
        parts: Vec<MeshData>,
    ) -> Result<(MeshData, Vec<Range<usize>>), MeshAssetError> {
        let has_normals = parts.iter().any(|p| !p.normals.is_empty());
        let has_uvs = parts.iter().any(|p| !p.uvs.is_empty());
        let has_colors = parts.iter().any(|p| !p.colors.is_empty());

        let mut merged = MeshData::default();
        let mut ranges = Vec::with_capacity(parts.len());
        for part in parts {
            let base = device_u32(merged.positions.len(), "merged vertex count")?;
            let start = merged.indices.len();
            let count = part.positions.len();
            let offset = part
                .indices
                .iter()
                .map(|i| {
                    i.checked_add(base).ok_or_else(|| {
                        MeshAssetError::MalformedAsset(format!(
                            "index {i} overflows after offsetting by {base}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            merged.indices.extend(offset);
            if has_normals {
                fill(&mut merged.normals, part.normals, count);
            }
            if has_uvs {
                fill(&mut merged.uvs, part.uvs, count);
            }
            if has_colors {
                fill(&mut merged.colors, part.colors, count);
            }
            merged.positions.extend(part.positions);
            ranges.push(start..merged.indices.len());
        }
        Ok((merged, ranges))
    }
}

fn fill<T: Default + Clone>(dst: &mut Vec<T>, src: Vec<T>, count: usize) {
    if src.is_empty() {
        dst.resize(dst.len() + count, T::default());
    } else {
        dst.extend(src);
    }
}

/// Borrowed window into a [`MeshData`]. Vertex attributes are always whole, only the index buffer
/// is narrowed, so index values stay valid against [`MeshView::positions`].
///
/// Only [`MeshData`] hands these out, so every index is in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshView<'a> {
    positions: &'a [glam::Vec3],
    normals: &'a [glam::Vec3],
    uvs: &'a [glam::Vec2],
    colors: &'a [glam::Vec3],
    indices: &'a [u32],
}

impl<'a> MeshView<'a> {
    pub fn positions(&self) -> &'a [glam::Vec3] {
        self.positions
    }

    pub fn normals(&self) -> &'a [glam::Vec3] {
        self.normals
    }

    pub fn uvs(&self) -> &'a [glam::Vec2] {
        self.uvs
    }

    pub fn colors(&self) -> &'a [glam::Vec3] {
        self.colors
    }

    pub fn indices(&self) -> &'a [u32] {
        self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn collision_view(&self) -> strata_physics::CollisionGeometryView<'a> {
        strata_physics::CollisionGeometryView::new(self.positions, self.indices)
    }

    /// Bounds of the vertices this view's triangles actually reference
    pub fn bounding_box(&self) -> strata_physics::BoundingBox {
        let positions = self.positions;
        strata_physics::BoundingBox::from_points(
            self.indices.iter().filter_map(|i| positions.get(*i as usize)),
        )
    }
}
