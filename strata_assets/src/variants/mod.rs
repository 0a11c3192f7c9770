//! Format specific payloads carried by a [`crate::MeshAsset`].
//!
//! The set of formats is closed. Each [`MeshFormatTag`] except `Undefined` has one decoded source
//! type the loader hands in, and one payload type kept alongside the render geometry for queries
//! only that format can answer.

use std::ops::Range;

use crate::{MeshAssetError, MeshData, MeshFormatTag};

mod instance;
mod interchange;
mod panoramic;

pub use instance::{InstanceMeshData, InstanceMeshSource};
pub use interchange::{InterchangeMeshData, InterchangeMeshSource};
pub use panoramic::{PanoramicMeshData, PanoramicMeshSource, PanoramicTile, PanoramicTileSource};

/// Decoded data produced by a format loader, ready to populate an asset of the matching tag
#[derive(Debug, Clone, PartialEq)]
pub enum MeshSource {
    Instance(InstanceMeshSource),
    Panoramic(PanoramicMeshSource),
    Interchange(InterchangeMeshSource),
}

impl MeshSource {
    pub fn format_tag(&self) -> MeshFormatTag {
        match self {
            MeshSource::Instance(_) => MeshFormatTag::InstanceMesh,
            MeshSource::Panoramic(_) => MeshFormatTag::PanoramicMesh,
            MeshSource::Interchange(_) => MeshFormatTag::InterchangeMesh,
        }
    }

    /// Validate and convert into the uniform render layout plus the format payload
    pub(crate) fn build(self) -> Result<(MeshData, MeshVariant), MeshAssetError> {
        match self {
            MeshSource::Instance(source) => source
                .build()
                .map(|(geometry, data)| (geometry, MeshVariant::Instance(data))),
            MeshSource::Panoramic(source) => source
                .build()
                .map(|(geometry, data)| (geometry, MeshVariant::Panoramic(data))),
            MeshSource::Interchange(source) => source
                .build()
                .map(|(geometry, data)| (geometry, MeshVariant::Interchange(data))),
        }
    }
}

impl From<InstanceMeshSource> for MeshSource {
    fn from(value: InstanceMeshSource) -> Self {
        MeshSource::Instance(value)
    }
}

impl From<PanoramicMeshSource> for MeshSource {
    fn from(value: PanoramicMeshSource) -> Self {
        MeshSource::Panoramic(value)
    }
}

impl From<InterchangeMeshSource> for MeshSource {
    fn from(value: InterchangeMeshSource) -> Self {
        MeshSource::Interchange(value)
    }
}

/// Format payload of an asset, always in agreement with the asset's [`MeshFormatTag`]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MeshVariant {
    #[default]
    Undefined,
    Instance(InstanceMeshData),
    Panoramic(PanoramicMeshData),
    Interchange(InterchangeMeshData),
}

impl MeshVariant {
    /// Payload of an asset committed to `tag` that has not been populated yet
    pub fn empty(tag: MeshFormatTag) -> Self {
        match tag {
            MeshFormatTag::Undefined => MeshVariant::Undefined,
            MeshFormatTag::InstanceMesh => MeshVariant::Instance(Default::default()),
            MeshFormatTag::PanoramicMesh => MeshVariant::Panoramic(Default::default()),
            MeshFormatTag::InterchangeMesh => MeshVariant::Interchange(Default::default()),
        }
    }

    pub fn format_tag(&self) -> MeshFormatTag {
        match self {
            MeshVariant::Undefined => MeshFormatTag::Undefined,
            MeshVariant::Instance(_) => MeshFormatTag::InstanceMesh,
            MeshVariant::Panoramic(_) => MeshFormatTag::PanoramicMesh,
            MeshVariant::Interchange(_) => MeshFormatTag::InterchangeMesh,
        }
    }

    /// Index buffer ranges of each addressable sub component, empty for unpartitioned formats
    pub(crate) fn part_ranges(&self) -> &[Range<usize>] {
        match self {
            MeshVariant::Panoramic(data) => data.index_ranges(),
            MeshVariant::Undefined | MeshVariant::Instance(_) | MeshVariant::Interchange(_) => &[],
        }
    }
}
