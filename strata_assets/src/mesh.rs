use std::sync::{Arc, Mutex, PoisonError, RwLock};

use strata_physics::{BoundingBox, CollisionGeometryView};

use crate::gpu::GpuMeshBuffers;
use crate::residency::Residency;
use crate::variants::{
    InstanceMeshData, InterchangeMeshData, MeshSource, MeshVariant, PanoramicMeshData,
};
use crate::{
    GpuMeshId, GpuSubMesh, MeshAssetError, MeshData, MeshFormatTag, MeshUploader, MeshView,
    ResidencyState,
};

/// One mesh loaded from a file, in whatever format it came in.
///
/// The loader constructs the asset for a format, populates geometry, sets the transform and
/// computes the bounding box through `&mut self`. Afterwards the asset is shared: renderer and
/// physics read it through `&self`, and the renderer triggers [`MeshAsset::upload_to_gpu`] on
/// first draw. Dropping the asset releases its device buffers.
#[derive(Debug)]
pub struct MeshAsset {
    label: Option<String>,
    variant: MeshVariant,
    transform: glam::Mat4,
    bounding_box: BoundingBox,
    bounding_box_computed: bool,
    geometry: Option<MeshData>,
    residency: Residency,
    /// Serializes uploads, held for the whole device transfer
    upload_gate: Mutex<()>,
    gpu: RwLock<Option<GpuMeshBuffers>>,
}

impl Default for MeshAsset {
    fn default() -> Self {
        Self::new(MeshFormatTag::Undefined)
    }
}

impl MeshAsset {
    pub fn new(tag: MeshFormatTag) -> Self {
        Self {
            label: None,
            variant: MeshVariant::empty(tag),
            transform: glam::Mat4::IDENTITY,
            bounding_box: BoundingBox::EMPTY,
            bounding_box_computed: false,
            geometry: None,
            residency: Residency::default(),
            upload_gate: Mutex::new(()),
            gpu: RwLock::new(None),
        }
    }

    /// Name used for logging and handed to the device as a debug label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn format_tag(&self) -> MeshFormatTag {
        self.variant.format_tag()
    }

    /// Retag the asset.
    ///
    /// Only allowed while no geometry has been populated, the format payload is reset to the empty
    /// payload of `tag`. Setting the current tag again is a no-op.
    pub fn set_format_tag(&mut self, tag: MeshFormatTag) -> Result<(), MeshAssetError> {
        let current = self.format_tag();
        if current == tag {
            return Ok(());
        }
        if self.geometry.is_some() {
            tracing::warn!(
                "Refusing to retag populated {} mesh {:?} as {}",
                current,
                self.label,
                tag
            );
            return Err(MeshAssetError::TypeMismatch {
                current,
                requested: tag,
            });
        }
        self.variant = MeshVariant::empty(tag);
        Ok(())
    }

    pub fn variant(&self) -> &MeshVariant {
        &self.variant
    }

    pub fn as_instance(&self) -> Option<&InstanceMeshData> {
        match &self.variant {
            MeshVariant::Instance(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_panoramic(&self) -> Option<&PanoramicMeshData> {
        match &self.variant {
            MeshVariant::Panoramic(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_interchange(&self) -> Option<&InterchangeMeshData> {
        match &self.variant {
            MeshVariant::Interchange(data) => Some(data),
            _ => None,
        }
    }

    /// Populate render geometry from decoded format data, moving the asset to
    /// [`ResidencyState::Loaded`].
    ///
    /// Replacing geometry wholesale is allowed until the asset becomes resident. On error the
    /// asset is left untouched.
    pub fn populate_geometry(
        &mut self,
        source: impl Into<MeshSource>,
    ) -> Result<(), MeshAssetError> {
        if self.is_gpu_resident() {
            return Err(MeshAssetError::AlreadyResident);
        }
        let source = source.into();
        let current = self.format_tag();
        if source.format_tag() != current {
            tracing::warn!(
                "Cannot populate {} mesh {:?} from {} data",
                current,
                self.label,
                source.format_tag()
            );
            return Err(MeshAssetError::TypeMismatch {
                current,
                requested: source.format_tag(),
            });
        }

        let (geometry, variant) = source.build()?;
        tracing::debug!(
            "Populated {} mesh {:?}: {} vertices, {} triangles",
            current,
            self.label,
            geometry.vertex_count(),
            geometry.triangle_count()
        );
        self.geometry = Some(geometry);
        self.variant = variant;
        self.bounding_box = BoundingBox::EMPTY;
        self.bounding_box_computed = false;
        self.residency.advance(ResidencyState::Loaded);
        Ok(())
    }

    pub fn transform(&self) -> glam::Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: glam::Mat4) {
        self.transform = transform;
    }

    /// Compute the bounding box once geometry is final.
    ///
    /// Later calls return the same box until geometry is replaced wholesale.
    pub fn compute_bounding_box(&mut self) -> Result<BoundingBox, MeshAssetError> {
        let geometry = self.geometry.as_ref().ok_or(MeshAssetError::NotLoaded)?;
        if !self.bounding_box_computed {
            self.bounding_box = geometry.bounding_box();
            self.bounding_box_computed = true;
            tracing::debug!(
                "Bounding box of mesh {:?}: {} .. {}",
                self.label,
                self.bounding_box.min(),
                self.bounding_box.max()
            );
        }
        Ok(self.bounding_box)
    }

    /// Mesh local bounds, empty until [`MeshAsset::compute_bounding_box`] has run
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Bake a translation into the vertex positions, recording it in the transform
    pub fn translate_mesh(&mut self, offset: glam::Vec3) -> Result<(), MeshAssetError> {
        let translation = glam::Mat4::from_translation(offset);
        self.edit_frame(translation)?;
        self.transform = translation * self.transform;
        Ok(())
    }

    /// Bake the current transform into the geometry and reset it to identity
    pub fn bake_transform(&mut self) -> Result<(), MeshAssetError> {
        self.edit_frame(self.transform)?;
        self.transform = glam::Mat4::IDENTITY;
        Ok(())
    }

    /// Coordinate frame edits change every vertex, so the box is recomputed as for new geometry.
    /// The collision view borrows the same storage and follows along.
    fn edit_frame(&mut self, transform: glam::Mat4) -> Result<(), MeshAssetError> {
        if self.is_gpu_resident() {
            return Err(MeshAssetError::AlreadyResident);
        }
        let geometry = self.geometry.as_mut().ok_or(MeshAssetError::NotLoaded)?;
        geometry.apply_transform(transform);
        self.bounding_box = geometry.bounding_box();
        self.bounding_box_computed = true;
        Ok(())
    }

    pub fn residency(&self) -> ResidencyState {
        self.residency.get()
    }

    pub fn is_gpu_resident(&self) -> bool {
        self.residency() == ResidencyState::Resident
    }

    /// Transfer render geometry to the device.
    ///
    /// Without `force`, an already resident asset is left alone and the call succeeds without
    /// device work, so racing first draws upload once. With `force` the buffers are uploaded
    /// again and replace the old ones, which are then released. Residency is only published after
    /// the transfer has completed.
    pub fn upload_to_gpu(
        &self,
        device: &Arc<dyn MeshUploader>,
        force: bool,
    ) -> Result<(), MeshAssetError> {
        let _gate = self.upload_gate.lock()?;
        let geometry = self.geometry.as_ref().ok_or(MeshAssetError::NotLoaded)?;
        if self.is_gpu_resident() && !force {
            tracing::debug!("Mesh {:?} already resident, skipping upload", self.label);
            return Ok(());
        }

        let buffers = GpuMeshBuffers::upload(
            device,
            self.label.as_deref(),
            geometry,
            self.variant.part_ranges(),
        )
        .inspect_err(|e| tracing::error!("Failed to upload mesh {:?}: {}", self.label, e))?;
        let mesh = buffers.mesh();
        let previous = self.gpu.write()?.replace(buffers);
        self.residency.advance(ResidencyState::Resident);
        tracing::info!(
            "Uploaded {} mesh {:?} as {:?}{}",
            self.format_tag(),
            self.label,
            mesh,
            if previous.is_some() { ", replacing previous buffers" } else { "" }
        );
        drop(previous);
        Ok(())
    }

    /// Whole asset geometry, [`None`] until populated
    pub fn render_geometry(&self) -> Option<&MeshData> {
        self.geometry.as_ref()
    }

    /// Number of addressable sub components, zero for unpartitioned formats
    pub fn sub_geometry_count(&self) -> usize {
        match self.geometry {
            Some(_) => self.variant.part_ranges().len(),
            None => 0,
        }
    }

    /// Geometry of one sub component, [`None`] means nothing to draw for that slot
    pub fn sub_geometry(&self, index: usize) -> Option<MeshView<'_>> {
        let range = self.variant.part_ranges().get(index)?.clone();
        self.geometry.as_ref()?.view_range(range)
    }

    pub fn gpu_mesh(&self) -> Option<GpuMeshId> {
        self.gpu
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|buffers| buffers.mesh())
    }

    /// Device side counterpart of [`MeshAsset::sub_geometry`]
    pub fn gpu_sub_mesh(&self, index: usize) -> Option<GpuSubMesh> {
        self.gpu
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()?
            .sub_mesh(index)
    }

    /// Geometry and topology for physics, empty while unloaded
    pub fn collision_view(&self) -> CollisionGeometryView<'_> {
        self.geometry
            .as_ref()
            .map(MeshData::collision_view)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        HeadlessUploader, InstanceMeshSource, InterchangeMeshSource, PanoramicMeshSource,
        PanoramicTileSource,
    };

    fn quad_source() -> InterchangeMeshSource {
        InterchangeMeshSource {
            positions: vec![
                glam::Vec3::new(0.0, 0.0, 0.0),
                glam::Vec3::new(1.0, 0.0, 0.0),
                glam::Vec3::new(0.0, 1.0, 0.0),
                glam::Vec3::new(1.0, 1.0, 0.0),
            ],
            indices: vec![0, 1, 2, 2, 1, 3],
            ..Default::default()
        }
    }

    fn device() -> (Arc<HeadlessUploader>, Arc<dyn MeshUploader>) {
        let headless = Arc::new(HeadlessUploader::default());
        let device: Arc<dyn MeshUploader> = headless.clone();
        (headless, device)
    }

    #[test]
    fn test_new_asset_is_unloaded() {
        let asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        assert_eq!(asset.residency(), ResidencyState::Unloaded);
        assert!(!asset.is_gpu_resident());
        assert!(asset.render_geometry().is_none());
        assert!(asset.collision_view().is_empty());
        assert!(asset.bounding_box().is_empty());
        assert_eq!(asset.transform(), glam::Mat4::IDENTITY);
    }

    #[test]
    fn test_populate_moves_to_loaded() {
        let mut asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        asset.populate_geometry(quad_source()).unwrap();
        assert_eq!(asset.residency(), ResidencyState::Loaded);
        assert!(!asset.is_gpu_resident());
        assert_eq!(asset.collision_view().triangle_count(), 2);
    }

    #[test]
    fn test_loaded_but_empty_is_not_unloaded() {
        let mut asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        asset
            .populate_geometry(InterchangeMeshSource::default())
            .unwrap();
        assert!(asset.render_geometry().unwrap().is_empty());
        assert_eq!(asset.residency(), ResidencyState::Loaded);
        assert!(asset.compute_bounding_box().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_source_leaves_asset_untouched() {
        let mut asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        let mut source = quad_source();
        source.indices[5] = 4;
        assert!(matches!(
            asset.populate_geometry(source),
            Err(MeshAssetError::MalformedAsset(_))
        ));
        assert_eq!(asset.residency(), ResidencyState::Unloaded);
        assert!(asset.render_geometry().is_none());
    }

    #[test]
    fn test_source_must_match_tag() {
        let mut asset = MeshAsset::new(MeshFormatTag::InstanceMesh);
        assert_eq!(
            asset.populate_geometry(quad_source()),
            Err(MeshAssetError::TypeMismatch {
                current: MeshFormatTag::InstanceMesh,
                requested: MeshFormatTag::InterchangeMesh,
            })
        );
        let mut undefined = MeshAsset::default();
        assert!(matches!(
            undefined.populate_geometry(quad_source()),
            Err(MeshAssetError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_retag_unpopulated() {
        let mut asset = MeshAsset::default();
        asset.set_format_tag(MeshFormatTag::InterchangeMesh).unwrap();
        assert_eq!(asset.format_tag(), MeshFormatTag::InterchangeMesh);
        asset.populate_geometry(quad_source()).unwrap();
        assert!(asset.as_interchange().unwrap().has_generated_normals());
    }

    #[test]
    fn test_retag_populated_fails_without_side_effects() {
        let mut asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        asset.populate_geometry(quad_source()).unwrap();
        let before = asset.render_geometry().cloned();
        for tag in [
            MeshFormatTag::Undefined,
            MeshFormatTag::InstanceMesh,
            MeshFormatTag::PanoramicMesh,
        ] {
            assert!(matches!(
                asset.set_format_tag(tag),
                Err(MeshAssetError::TypeMismatch { .. })
            ));
        }
        assert_eq!(asset.format_tag(), MeshFormatTag::InterchangeMesh);
        assert_eq!(asset.render_geometry().cloned(), before);
        assert!(asset.as_interchange().is_some());
        assert!(asset.set_format_tag(MeshFormatTag::InterchangeMesh).is_ok());
    }

    #[test]
    fn test_bounding_box_of_quad() {
        let mut asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        assert_eq!(asset.compute_bounding_box(), Err(MeshAssetError::NotLoaded));
        asset.populate_geometry(quad_source()).unwrap();
        let bb = asset.compute_bounding_box().unwrap();
        assert_eq!(bb.min(), glam::Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(bb.max(), glam::Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(asset.bounding_box(), bb);
    }

    #[test]
    fn test_upload_unloaded_fails() {
        let (headless, device) = device();
        let asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        assert_eq!(asset.upload_to_gpu(&device, false), Err(MeshAssetError::NotLoaded));
        assert_eq!(asset.residency(), ResidencyState::Unloaded);
        assert_eq!(headless.uploads(), 0);
    }

    #[test]
    fn test_upload_is_idempotent() {
        let (headless, device) = device();
        let mut asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        asset.populate_geometry(quad_source()).unwrap();
        asset.upload_to_gpu(&device, false).unwrap();
        let mesh = asset.gpu_mesh();
        asset.upload_to_gpu(&device, false).unwrap();
        assert!(asset.is_gpu_resident());
        assert_eq!(headless.uploads(), 1);
        assert_eq!(asset.gpu_mesh(), mesh);
    }

    #[test]
    fn test_forced_upload_replaces_buffers() {
        let (headless, device) = device();
        let mut asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        asset.populate_geometry(quad_source()).unwrap();
        asset.upload_to_gpu(&device, false).unwrap();
        let first = asset.gpu_mesh().unwrap();
        asset.upload_to_gpu(&device, true).unwrap();
        assert!(asset.is_gpu_resident());
        assert_eq!(headless.uploads(), 2);
        assert_eq!(headless.releases(), 1);
        assert_ne!(asset.gpu_mesh().unwrap(), first);
        drop(asset);
        assert_eq!(headless.releases(), 2);
        assert_eq!(headless.live(), 0);
    }

    #[test]
    fn test_resident_geometry_is_frozen() {
        let (_, device) = device();
        let mut asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        asset.populate_geometry(quad_source()).unwrap();
        asset.upload_to_gpu(&device, false).unwrap();
        assert_eq!(
            asset.populate_geometry(quad_source()),
            Err(MeshAssetError::AlreadyResident)
        );
        assert_eq!(
            asset.translate_mesh(glam::Vec3::X),
            Err(MeshAssetError::AlreadyResident)
        );
        assert!(asset.is_gpu_resident());
    }

    #[test]
    fn test_translate_mesh_keeps_collision_view_in_sync() {
        let mut asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        asset.populate_geometry(quad_source()).unwrap();
        asset.compute_bounding_box().unwrap();
        asset.translate_mesh(glam::Vec3::new(0.0, 0.0, 5.0)).unwrap();
        assert!(asset
            .collision_view()
            .positions()
            .iter()
            .all(|p| p.z == 5.0));
        assert_eq!(asset.bounding_box().min(), glam::Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(
            asset.transform(),
            glam::Mat4::from_translation(glam::Vec3::new(0.0, 0.0, 5.0))
        );
    }

    #[test]
    fn test_bake_transform() {
        let mut asset = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        assert_eq!(asset.bake_transform(), Err(MeshAssetError::NotLoaded));
        asset.populate_geometry(quad_source()).unwrap();
        asset.set_transform(glam::Mat4::from_scale(glam::Vec3::splat(2.0)));
        asset.bake_transform().unwrap();
        assert_eq!(asset.transform(), glam::Mat4::IDENTITY);
        assert_eq!(asset.bounding_box().max(), glam::Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(
            asset.collision_view().positions()[3],
            glam::Vec3::new(2.0, 2.0, 0.0)
        );
    }

    #[test]
    fn test_sub_geometry_out_of_range_is_absent() {
        let mut interchange = MeshAsset::new(MeshFormatTag::InterchangeMesh);
        assert!(interchange.sub_geometry(0).is_none());
        interchange.populate_geometry(quad_source()).unwrap();
        assert_eq!(interchange.sub_geometry_count(), 0);
        assert!(interchange.sub_geometry(0).is_none());

        let mut instance = MeshAsset::new(MeshFormatTag::InstanceMesh);
        instance
            .populate_geometry(InstanceMeshSource {
                positions: vec![glam::Vec3::ZERO, glam::Vec3::X, glam::Vec3::Y],
                indices: vec![0, 1, 2],
                object_ids: vec![4],
                ..Default::default()
            })
            .unwrap();
        assert!(instance.sub_geometry(0).is_none());
        assert_eq!(instance.as_instance().unwrap().object_id(0), Some(4));

        let mut panoramic = MeshAsset::new(MeshFormatTag::PanoramicMesh);
        panoramic
            .populate_geometry(PanoramicMeshSource {
                tiles: vec![PanoramicTileSource {
                    atlas_index: 2,
                    positions: vec![glam::Vec3::ZERO, glam::Vec3::X, glam::Vec3::Y],
                    indices: vec![0, 1, 2],
                    ..Default::default()
                }],
            })
            .unwrap();
        assert_eq!(panoramic.sub_geometry_count(), 1);
        assert_eq!(panoramic.sub_geometry(0).unwrap().triangle_count(), 1);
        assert!(panoramic.sub_geometry(1).is_none());
        assert!(panoramic.gpu_sub_mesh(0).is_none());
    }

    #[test]
    fn test_panoramic_sub_meshes_follow_upload() {
        let (headless, device) = device();
        let mut asset = MeshAsset::new(MeshFormatTag::PanoramicMesh).with_label("pano");
        let tile = |atlas_index| PanoramicTileSource {
            atlas_index,
            positions: vec![glam::Vec3::ZERO, glam::Vec3::X, glam::Vec3::Y],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        asset
            .populate_geometry(PanoramicMeshSource {
                tiles: vec![tile(0), tile(1)],
            })
            .unwrap();
        asset.upload_to_gpu(&device, false).unwrap();
        let mesh = asset.gpu_mesh().unwrap();
        assert_eq!(
            asset.gpu_sub_mesh(1),
            Some(GpuSubMesh {
                mesh,
                first_index: 3,
                index_count: 3,
            })
        );
        assert!(asset.gpu_sub_mesh(2).is_none());
        assert_eq!(headless.uploads(), 1);
        assert_eq!(headless.last_label().as_deref(), Some("pano"));
    }

    #[test]
    fn test_panoramic_tile_collision_and_bounds() {
        let mut asset = MeshAsset::new(MeshFormatTag::PanoramicMesh);
        let tile = |atlas_index, offset: f32| PanoramicTileSource {
            atlas_index,
            positions: vec![
                glam::Vec3::new(offset, 0.0, 0.0),
                glam::Vec3::new(offset + 1.0, 0.0, 0.0),
                glam::Vec3::new(offset, 1.0, 0.0),
            ],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        asset
            .populate_geometry(PanoramicMeshSource {
                tiles: vec![tile(0, 0.0), tile(1, 10.0)],
            })
            .unwrap();

        let second = asset.sub_geometry(1).unwrap();
        let bb = second.bounding_box();
        assert_eq!(bb.min(), glam::Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(bb.max(), glam::Vec3::new(11.0, 1.0, 0.0));

        let triangles: Vec<_> = second.collision_view().triangles().collect();
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0][0], glam::Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(asset.collision_view().triangle_count(), 2);
    }
}
