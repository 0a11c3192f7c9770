use std::sync::PoisonError;

use thiserror::Error;

use crate::MeshFormatTag;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshAssetError {
    /// Decoded data is structurally invalid, the loader should abandon this asset
    #[error("Malformed mesh asset: {0}")]
    MalformedAsset(String),

    #[error("Expected populated render geometry, got none")]
    NotLoaded,

    #[error("Mesh of type {current} cannot be used as {requested}")]
    TypeMismatch {
        current: MeshFormatTag,
        requested: MeshFormatTag,
    },

    #[error("Mesh is resident on the GPU, its geometry can no longer be replaced")]
    AlreadyResident,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Poisoned lock")]
    PoisonedLock,
}

impl<T> From<PoisonError<T>> for MeshAssetError {
    fn from(_: PoisonError<T>) -> Self {
        MeshAssetError::PoisonedLock
    }
}

/// Failures reported by a [`crate::MeshUploader`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Device ran out of memory")]
    OutOfMemory,

    #[error("Device error: {0}")]
    Device(String),
}

/// Narrow a buffer length or offset to the `u32` the device and index buffers use
pub(crate) fn device_u32(value: usize, what: &str) -> Result<u32, MeshAssetError> {
    u32::try_from(value).map_err(|_| {
        MeshAssetError::MalformedAsset(format!("{what} {value} does not fit in a u32"))
    })
}
