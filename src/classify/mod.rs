pub mod classifier;
pub mod frustum;
pub mod lod;

pub use classifier::{Classification, ClassificationChange, SlotRelabel, ViewClassifier};
pub use frustum::{Frustum, Viewpoint};
pub use lod::{LodEntry, LodTable, LOD_NONE};
