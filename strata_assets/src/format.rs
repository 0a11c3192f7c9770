/// Identifies which concrete representation a [`crate::MeshAsset`] holds.
///
/// Every concrete tag maps to exactly one [`crate::MeshVariant`] payload.
/// [`MeshFormatTag::Undefined`] is reserved for assets that have not committed to a format yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum MeshFormatTag {
    /// Created programmatically or from an unknown format, carries no format specific data
    #[default]
    Undefined,
    /// Meshes with per face semantic object identifiers, e.g. segmented scans
    InstanceMesh,
    /// Meshes partitioned into tiles over a texture atlas
    PanoramicMesh,
    /// Indexed triangle meshes from interchange formats such as glTF
    InterchangeMesh,
}

impl MeshFormatTag {
    /// Every tag an asset can commit to
    pub const ALL: [MeshFormatTag; 3] = [
        MeshFormatTag::InstanceMesh,
        MeshFormatTag::PanoramicMesh,
        MeshFormatTag::InterchangeMesh,
    ];

    pub fn is_concrete(&self) -> bool {
        !matches!(self, MeshFormatTag::Undefined)
    }

    /// Whether sub geometry is addressable by index for this format
    pub fn is_partitioned(&self) -> bool {
        match self {
            MeshFormatTag::PanoramicMesh => true,
            MeshFormatTag::Undefined
            | MeshFormatTag::InstanceMesh
            | MeshFormatTag::InterchangeMesh => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MeshFormatTag::Undefined => "undefined",
            MeshFormatTag::InstanceMesh => "instance",
            MeshFormatTag::PanoramicMesh => "panoramic",
            MeshFormatTag::InterchangeMesh => "interchange",
        }
    }
}

impl std::fmt::Display for MeshFormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
