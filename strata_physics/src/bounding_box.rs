use bevy_ecs::prelude::*;

/// Describes an axis aligned bounding box by its min and max extents in 3d space
///
/// The default box is empty: `min` is `+inf` and `max` is `-inf` on every axis, so extending it
/// by any point yields a box around exactly that point.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct BoundingBox {
    min: glam::Vec3,
    max: glam::Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min: glam::Vec3::INFINITY,
        max: glam::Vec3::NEG_INFINITY,
    };

    /// Smallest box enclosing every point, [`BoundingBox::EMPTY`] if there are none
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a glam::Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut bb, point| {
            bb.extend(*point);
            bb
        })
    }

    pub fn min(&self) -> glam::Vec3 {
        self.min
    }

    pub fn max(&self) -> glam::Vec3 {
        self.max
    }

    /// An empty box contains nothing, not even its own corners
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Grow the box so it encloses `point`
    pub fn extend(&mut self, point: glam::Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Inclusive containment test
    pub fn contains(&self, point: glam::Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}
