//! The single value handed from the detection loop to the render loop.

use crate::config::ParallaxConfig;
use crate::jitter::HeadDisplacement;
use std::cell::Cell;
use std::rc::Rc;

/// Pixel-space parallax target
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetOffset {
    /// Horizontal target
    pub target_x: f64,
    /// Vertical target
    pub target_y: f64,
}

impl TargetOffset {
    #[must_use]
    pub const fn new(target_x: f64, target_y: f64) -> Self {
        Self { target_x, target_y }
    }

    /// Convert a millimeter displacement into a pixel target
    #[must_use]
    pub fn from_displacement(displacement: HeadDisplacement, px_per_mm: (f64, f64), parallax: &ParallaxConfig) -> Self {
        Self {
            target_x: displacement.x_mm * px_per_mm.0 * parallax.scale_x,
            target_y: displacement.y_mm * px_per_mm.1 * parallax.scale_y,
        }
    }
}

/// Target plus the head velocity that produced it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetSnapshot {
    /// Parallax target
    pub offset: TargetOffset,
    /// Head velocity in mm/s
    pub velocity_mm_s: (f64, f64),
    /// Incremented on every publish; lets readers notice fresh velocity
    pub sequence: u64,
}

/// Single-slot, most-recent-wins cell shared by both loops
///
/// Both loops run on one thread. Every publish replaces the whole snapshot.
#[derive(Debug, Clone, Default)]
pub struct TargetCell {
    slot: Rc<Cell<TargetSnapshot>>,
}

impl TargetCell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current target, bumping the sequence number
    pub fn publish(&self, offset: TargetOffset, velocity_mm_s: (f64, f64)) {
        let sequence = self.slot.get().sequence.wrapping_add(1);
        self.slot.set(TargetSnapshot {
            offset,
            velocity_mm_s,
            sequence,
        });
    }

    /// Latest snapshot
    #[must_use]
    pub fn load(&self) -> TargetSnapshot {
        self.slot.get()
    }

    /// Zero target and velocity
    pub fn clear(&self) {
        self.publish(TargetOffset::default(), (0.0, 0.0));
    }
}
