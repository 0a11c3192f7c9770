use std::ops::Range;

use crate::{MeshAssetError, MeshData};

/// One decoded tile of a panoramic mesh, indices are local to the tile
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanoramicTileSource {
    /// Page of the texture atlas this tile samples from
    pub atlas_index: u32,
    pub positions: Vec<glam::Vec3>,
    pub normals: Vec<glam::Vec3>,
    pub uvs: Vec<glam::Vec2>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanoramicMeshSource {
    pub tiles: Vec<PanoramicTileSource>,
}

impl PanoramicMeshSource {
    /// Tiles are validated individually, then merged into one mesh with their index ranges kept
    pub(crate) fn build(self) -> Result<(MeshData, PanoramicMeshData), MeshAssetError> {
        let mut atlas_indices = Vec::with_capacity(self.tiles.len());
        let mut parts = Vec::with_capacity(self.tiles.len());
        for (index, tile) in self.tiles.into_iter().enumerate() {
            let part = MeshData::new(tile.positions, tile.indices)
                .and_then(|part| part.with_normals(tile.normals))
                .and_then(|part| part.with_uvs(tile.uvs))
                .map_err(|err| match err {
                    MeshAssetError::MalformedAsset(message) => {
                        MeshAssetError::MalformedAsset(format!("tile {}: {}", index, message))
                    }
                    other => other,
                })?;
            atlas_indices.push(tile.atlas_index);
            parts.push(part);
        }
        let (geometry, index_ranges) = MeshData::merge(parts)?;
        Ok((
            geometry,
            PanoramicMeshData {
                atlas_indices,
                index_ranges,
            },
        ))
    }
}

/// Addressing information for one tile of a populated panoramic mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanoramicTile {
    pub atlas_index: u32,
    /// Range in the merged index buffer
    pub index_range: Range<usize>,
}

impl PanoramicTile {
    pub fn first_face(&self) -> usize {
        self.index_range.start / 3
    }

    pub fn face_count(&self) -> usize {
        self.index_range.len() / 3
    }
}

/// Tile table of a panoramic mesh. Tiles are contiguous and ordered in the merged index buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanoramicMeshData {
    atlas_indices: Vec<u32>,
    index_ranges: Vec<Range<usize>>,
}

impl PanoramicMeshData {
    pub fn tile_count(&self) -> usize {
        self.index_ranges.len()
    }

    pub fn tile(&self, index: usize) -> Option<PanoramicTile> {
        Some(PanoramicTile {
            atlas_index: *self.atlas_indices.get(index)?,
            index_range: self.index_ranges.get(index)?.clone(),
        })
    }

    /// Tile containing the triangle `face` of the merged mesh
    pub fn tile_of_face(&self, face: usize) -> Option<usize> {
        let index = face.checked_mul(3)?;
        let tile = self.index_ranges.partition_point(|range| range.end <= index);
        self.index_ranges
            .get(tile)
            .filter(|range| range.contains(&index))
            .map(|_| tile)
    }

    pub fn tiles_for_atlas(&self, atlas_index: u32) -> impl Iterator<Item = usize> + '_ {
        self.atlas_indices
            .iter()
            .enumerate()
            .filter(move |(_, atlas)| **atlas == atlas_index)
            .map(|(tile, _)| tile)
    }

    pub(crate) fn index_ranges(&self) -> &[Range<usize>] {
        &self.index_ranges
    }
}
