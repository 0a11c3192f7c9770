/// Borrowed geometry and topology handed to physics for collision shape construction.
///
/// The view never owns its data. It borrows straight from the asset's render geometry, so it is
/// always in whatever coordinate frame that geometry is currently in. If a loader bakes a
/// transform into the render geometry, collision shapes built afterwards see the baked frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionGeometryView<'a> {
    positions: &'a [glam::Vec3],
    indices: &'a [u32],
}

impl<'a> CollisionGeometryView<'a> {
    /// Expects `indices` to be a triangle list referencing `positions`, this is checked upstream
    /// when geometry is populated
    pub fn new(positions: &'a [glam::Vec3], indices: &'a [u32]) -> Self {
        debug_assert!(indices.len() % 3 == 0, "Indices must form a triangle list");
        Self { positions, indices }
    }

    pub fn positions(&self) -> &'a [glam::Vec3] {
        self.positions
    }

    pub fn indices(&self) -> &'a [u32] {
        self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles as their 3 corner positions
    pub fn triangles(&self) -> impl Iterator<Item = [glam::Vec3; 3]> + 'a {
        let positions = self.positions;
        self.indices.chunks_exact(3).map(move |tri| {
            [
                positions[tri[0] as usize],
                positions[tri[1] as usize],
                positions[tri[2] as usize],
            ]
        })
    }

    pub fn bounding_box(&self) -> crate::BoundingBox {
        crate::BoundingBox::from_points(self.positions)
    }
}
