//! Spatial-transform indirection boundary.
//!
//! The classifier never holds node references; it holds stable integer slots
//! into a table of world matrices owned by the host scene. The table
//! renumbers slots on removal (swap-with-last), and every renumbering is
//! pushed to consumers as a [`SlotRemap`] so stored slots are rewritten
//! rather than polled.

use glam::Mat4;

/// Read side of the indirection service, shared with the parallel
/// classification pass. `Sync` because the pass reads it from worker threads.
pub trait TransformSource: Sync {
    fn world_matrix(&self, slot: u32) -> Mat4;
}

/// Slot renumbering produced by a removal: the matrix previously at `old`
/// now lives at `new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRemap {
    pub old: u32,
    pub new: u32,
}

/// Reference implementation of the indirection service.
///
/// Dense `Vec<Mat4>` so the classification pass reads matrices with a single
/// index; removal swap-removes and reports the resulting [`SlotRemap`].
pub struct TransformTable {
    matrices: Vec<Mat4>,
}

impl TransformTable {
    pub fn new() -> Self {
        Self {
            matrices: Vec::new(),
        }
    }

    pub fn track(&mut self, world: Mat4) -> u32 {
        let slot = self.matrices.len() as u32;
        self.matrices.push(world);
        slot
    }

    pub fn set_world_matrix(&mut self, slot: u32, world: Mat4) {
        if let Some(m) = self.matrices.get_mut(slot as usize) {
            *m = world;
        } else {
            log::warn!("set_world_matrix on untracked slot {}", slot);
        }
    }

    /// Removes a slot. Returns the renumbering the removal caused, if any,
    /// which the caller must forward to every consumer holding slots.
    pub fn untrack(&mut self, slot: u32) -> Option<SlotRemap> {
        let index = slot as usize;
        if index >= self.matrices.len() {
            log::warn!("untrack on untracked slot {}", slot);
            return None;
        }
        let last = self.matrices.len() - 1;
        self.matrices.swap_remove(index);
        if index == last {
            None
        } else {
            Some(SlotRemap {
                old: last as u32,
                new: slot,
            })
        }
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

impl Default for TransformTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformSource for TransformTable {
    fn world_matrix(&self, slot: u32) -> Mat4 {
        self.matrices
            .get(slot as usize)
            .copied()
            .unwrap_or(Mat4::IDENTITY)
    }
}
