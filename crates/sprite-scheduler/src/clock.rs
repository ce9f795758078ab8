use std::time::Instant;

use sprite_interp::VirtualInstant;

/// Accumulates virtual interpolation time, advancing only while the host is
/// both visible and has interpolation calculation enabled; wall time elapsed
/// while paused never reaches the accumulator.
#[derive(Debug)]
pub struct VirtualClock {
    visible: bool,
    interpolation_enabled: bool,
    accumulated_millis: f64,
    anchor: Option<Instant>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self { visible: true, interpolation_enabled: true, accumulated_millis: 0.0, anchor: None }
    }

    pub fn is_running(&self) -> bool {
        self.visible && self.interpolation_enabled
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Sets interpolation-calculation enablement. Unlike `set_visible`, this
    /// never invalidates channels; it only gates whether the clock advances.
    pub fn set_interpolation_enabled(&mut self, enabled: bool) {
        self.interpolation_enabled = enabled;
        if !self.is_running() {
            self.anchor = None;
        }
    }

    /// Sets host visibility. Returns `true` if channels must be invalidated
    /// (hidden transition). On a hidden→visible transition the anchor is
    /// reset so the paused interval is never counted as elapsed time.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        if visible == self.visible {
            return false;
        }
        self.visible = visible;
        self.anchor = None;
        !visible
    }

    /// Advances the accumulator by wall time elapsed since the last `tick`
    /// call, if running, and returns the current virtual timestamp.
    pub fn tick(&mut self, wall_now: Instant) -> VirtualInstant {
        if self.is_running() {
            if let Some(anchor) = self.anchor {
                let elapsed_millis = wall_now.duration_since(anchor).as_secs_f64() * 1000.0;
                self.accumulated_millis += elapsed_millis;
            }
            self.anchor = Some(wall_now);
        } else {
            self.anchor = None;
        }
        VirtualInstant::from_millis(self.accumulated_millis)
    }

    pub fn current(&self) -> VirtualInstant {
        VirtualInstant::from_millis(self.accumulated_millis)
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}
