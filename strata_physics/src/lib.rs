#![allow(dead_code)]

pub mod bounding_box;
pub mod collision;

pub use bounding_box::BoundingBox;
pub use collision::CollisionGeometryView;
