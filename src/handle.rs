use crate::batch::InstanceKey;

/// Identifies one view (observation point) registered with the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub(crate) u32);

/// Identifies one render group owned by the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) u32);

/// Stable reference to one spawned instance.
///
/// Correlates the instance's classifier slots (one per view) with its batch
/// slot. Holds ids only, never storage: the context's arena maps the id to
/// the current dense slots, so swap-removals elsewhere never invalidate a
/// live handle. After `despawn` the handle is stale and every operation on
/// it becomes a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderableInstance {
    pub(crate) id: u32,
    pub(crate) group: GroupId,
    pub(crate) key: InstanceKey,
}

impl RenderableInstance {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn key(&self) -> InstanceKey {
        self.key
    }
}

/// Edge-triggered classification events, fired at most once per changed
/// instance per frame, after the classification pass has joined.
///
/// Methods default to no-ops so listeners implement only the edges they
/// care about.
pub trait ClassificationListener {
    fn on_lod_change(&mut self, old_level: u32, new_level: u32) {
        let _ = (old_level, new_level);
    }

    fn on_visibility_change(&mut self, visible: bool) {
        let _ = visible;
    }
}
