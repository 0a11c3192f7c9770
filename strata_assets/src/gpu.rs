use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::device_u32;
use crate::{MeshAssetError, UploadError};

/// Opaque device side handle for one uploaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuMeshId(pub u64);

/// A drawable slice of an uploaded mesh, shares the vertex and index buffers of `mesh`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuSubMesh {
    pub mesh: GpuMeshId,
    pub first_index: u32,
    pub index_count: u32,
}

/// Everything the device needs to create vertex and index buffers for one mesh
#[derive(Debug, Clone, Copy)]
pub struct MeshUpload<'a> {
    pub label: Option<&'a str>,
    /// Tightly packed [`crate::GpuVertex`]
    pub vertex_bytes: &'a [u8],
    pub vertex_count: u32,
    /// Tightly packed `u32` triangle list
    pub index_bytes: &'a [u8],
    pub index_count: u32,
}

/// The graphics device as seen by mesh assets.
///
/// Implementations perform the actual API calls. [`MeshUploader::upload`] may block until the
/// transfer has completed, mesh assets only publish residency after it returns.
pub trait MeshUploader: std::fmt::Debug + Send + Sync {
    fn upload(&self, upload: MeshUpload<'_>) -> Result<GpuMeshId, UploadError>;

    /// Release buffers created by [`MeshUploader::upload`]
    fn release(&self, mesh: GpuMeshId);
}

/// Device buffers owned by one mesh asset, released back to the device on drop
#[derive(Debug)]
pub(crate) struct GpuMeshBuffers {
    device: Arc<dyn MeshUploader>,
    mesh: GpuMeshId,
    sub_meshes: Vec<GpuSubMesh>,
}

impl GpuMeshBuffers {
    pub(crate) fn upload(
        device: &Arc<dyn MeshUploader>,
        label: Option<&str>,
        geometry: &crate::MeshData,
        parts: &[Range<usize>],
    ) -> Result<Self, MeshAssetError> {
        let vertices = geometry.gpu_vertices();
        let vertex_count = device_u32(vertices.len(), "vertex count")?;
        let index_count = device_u32(geometry.index_count(), "index count")?;
        let sub_meshes: Vec<(u32, u32)> = parts
            .iter()
            .map(|range| {
                Ok((
                    device_u32(range.start, "sub mesh offset")?,
                    device_u32(range.len(), "sub mesh length")?,
                ))
            })
            .collect::<Result<_, MeshAssetError>>()?;
        let mesh = device.upload(MeshUpload {
            label,
            vertex_bytes: bytemuck::cast_slice(&vertices),
            vertex_count,
            index_bytes: geometry.index_bytes(),
            index_count,
        })?;
        let sub_meshes = sub_meshes
            .into_iter()
            .map(|(first_index, index_count)| GpuSubMesh {
                mesh,
                first_index,
                index_count,
            })
            .collect();
        Ok(Self {
            device: device.clone(),
            mesh,
            sub_meshes,
        })
    }

    pub(crate) fn mesh(&self) -> GpuMeshId {
        self.mesh
    }

    pub(crate) fn sub_mesh(&self, index: usize) -> Option<GpuSubMesh> {
        self.sub_meshes.get(index).copied()
    }
}

impl Drop for GpuMeshBuffers {
    fn drop(&mut self) {
        tracing::debug!("Releasing gpu mesh {:?}", self.mesh);
        self.device.release(self.mesh);
    }
}

/// Device that keeps nothing and only hands out ids, for headless simulation without a renderer
#[derive(Debug, Default)]
pub struct HeadlessUploader {
    next_id: AtomicU64,
    uploads: AtomicU64,
    releases: AtomicU64,
    last_label: Mutex<Option<String>>,
}

impl HeadlessUploader {
    pub fn uploads(&self) -> u64 {
        self.uploads.load(Ordering::Acquire)
    }

    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::Acquire)
    }

    /// Meshes uploaded and not yet released
    pub fn live(&self) -> u64 {
        self.uploads().saturating_sub(self.releases())
    }

    pub fn last_label(&self) -> Option<String> {
        self.last_label
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MeshUploader for HeadlessUploader {
    fn upload(&self, upload: MeshUpload<'_>) -> Result<GpuMeshId, UploadError> {
        *self.last_label.lock().unwrap_or_else(PoisonError::into_inner) =
            upload.label.map(str::to_owned);
        self.uploads.fetch_add(1, Ordering::AcqRel);
        Ok(GpuMeshId(self.next_id.fetch_add(1, Ordering::AcqRel)))
    }

    fn release(&self, _mesh: GpuMeshId) {
        self.releases.fetch_add(1, Ordering::AcqRel);
    }
}
