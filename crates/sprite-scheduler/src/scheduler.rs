use std::time::Instant;

use sprite_interp::VirtualInstant;

use crate::clock::VirtualClock;
use crate::redraw::RedrawCoalescer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityUpdateReason {
    ShownAfterHidden,
    VisibleTick,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerDecision {
    pub now: VirtualInstant,
    pub should_render: bool,
    pub should_invalidate_all_interpolations: bool,
    pub update_reason: Option<VisibilityUpdateReason>,
}

/// Redraw coalescing plus the visibility-gated virtual clock, generalized
/// from `frame_scheduler::FrameScheduler`'s active/inactive decision pattern
/// (there: brush hot path; here: host visibility).
#[derive(Debug)]
pub struct FrameRedrawScheduler {
    clock: VirtualClock,
    redraw: RedrawCoalescer,
    was_visible: bool,
}

impl FrameRedrawScheduler {
    pub fn new() -> Self {
        Self { clock: VirtualClock::new(), redraw: RedrawCoalescer::new(), was_visible: true }
    }

    pub fn request_redraw(&mut self) {
        self.redraw.request_redraw();
    }

    pub fn set_interpolation_enabled(&mut self, enabled: bool) {
        self.clock.set_interpolation_enabled(enabled);
    }

    pub fn current_time(&self) -> VirtualInstant {
        self.clock.current()
    }

    /// Call once per host frame with the current visibility and wall clock
    /// sample. Returns the decision the caller should act on: whether to
    /// invalidate every channel's interpolation state, whether a render is
    /// due, and the up-to-date virtual timestamp.
    pub fn tick(&mut self, visible: bool, wall_now: Instant) -> SchedulerDecision {
        let became_visible = visible && !self.was_visible;
        let invalidate = self.clock.set_visible(visible);
        if became_visible {
            self.redraw.request_redraw();
        }

        let reason = if visible == self.was_visible {
            if visible { Some(VisibilityUpdateReason::VisibleTick) } else { None }
        } else if visible {
            Some(VisibilityUpdateReason::ShownAfterHidden)
        } else {
            Some(VisibilityUpdateReason::Hidden)
        };
        self.was_visible = visible;

        let now = self.clock.tick(wall_now);
        let should_render = visible && self.redraw.take();

        SchedulerDecision { now, should_render, should_invalidate_all_interpolations: invalidate, update_reason: reason }
    }
}

impl Default for FrameRedrawScheduler {
    fn default() -> Self {
        Self::new()
    }
}
