//! In memory representation of mesh assets.
//!
//! Every mesh, whatever format it was decoded from, is a [`MeshAsset`]. The asset tracks its own
//! residency on the device and exposes the same contract to the renderer
//! ([`MeshAsset::upload_to_gpu`], [`MeshAsset::render_geometry`]) and to physics
//! ([`MeshAsset::collision_view`]).

mod error;
mod format;
mod geometry;
mod gpu;
mod handles;
mod mesh;
mod mesh_store;
mod residency;
pub mod variants;

pub use error::{MeshAssetError, UploadError};
pub use format::MeshFormatTag;
pub use geometry::{GpuVertex, MeshData, MeshView};
pub use gpu::{GpuMeshId, GpuSubMesh, HeadlessUploader, MeshUpload, MeshUploader};
pub use handles::MeshHandle;
pub use mesh::MeshAsset;
pub use mesh_store::{MeshStore, MeshStoreConfig};
pub use residency::ResidencyState;
pub use variants::{
    InstanceMeshData, InstanceMeshSource, InterchangeMeshData, InterchangeMeshSource, MeshSource,
    MeshVariant, PanoramicMeshData, PanoramicMeshSource, PanoramicTile, PanoramicTileSource,
};

pub use strata_physics::{BoundingBox, CollisionGeometryView};
