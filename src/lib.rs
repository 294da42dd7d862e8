//! Instance batching and visibility/LOD classification for a real-time
//! renderer.
//!
//! Two coupled subsystems: the per-viewpoint classifier (frustum test + LOD
//! distance selection, evaluated in parallel over all tracked instances) and
//! the batch manager (render group -> render sequence -> sub-batch) that
//! packs visible instances into draw-call-sized chunks with per-instance
//! shading-parameter overrides. A [`context::RenderContext`] owns every
//! registry and drives the fixed per-frame order: classify, notify, prepare,
//! draw.
//!
//! Logging goes through the `log` facade; hosts pick the sink (tests use
//! `env_logger`).

pub mod asset;
pub mod batch;
pub mod classify;
pub mod context;
pub mod draw;
pub mod handle;
pub mod indirection;
pub mod settings;
pub mod transform;

pub use asset::{Assets, Geometry, Handle, LocalBounds, Material, SubPart};
pub use batch::{
    BatchError, InstanceKey, InstanceLayout, InstanceValue, PropertyValue, RenderGroup,
    ShadingConfig, ShadingFlags, BATCH_SIZE,
};
pub use classify::{Classification, ClassificationChange, LodTable, ViewClassifier, Viewpoint, LOD_NONE};
pub use context::{InstanceDesc, RenderContext};
pub use draw::DrawDescriptor;
pub use handle::{ClassificationListener, GroupId, RenderableInstance, ViewId};
pub use indirection::{SlotRemap, TransformSource, TransformTable};
pub use settings::BatcherSettings;
pub use transform::Transform;
