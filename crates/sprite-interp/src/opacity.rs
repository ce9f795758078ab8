use crate::channel::{Channel, ChannelOptions};
use crate::clock::VirtualInstant;

/// Wraps a `Channel<f32>` interpolating the caller-requested *base* opacity.
/// The rendered value re-applies `opacityMultiplier` and `lodOpacity` on top of
/// the interpolated base every frame, so a multiplier/LOD change takes effect
/// immediately without restarting the animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityChannel {
    base: Channel<f32>,
    lod_opacity: f32,
}

impl OpacityChannel {
    pub fn new(initial_base: f32) -> Self {
        Self {
            base: Channel::new(initial_base),
            lod_opacity: 1.0,
        }
    }

    pub fn commit_base(&mut self, base_value: f32, options: ChannelOptions) {
        self.base.commit(base_value, options);
    }

    pub fn step(&mut self, now: VirtualInstant) -> (bool, bool) {
        self.base.step(now)
    }

    pub fn is_active(&self) -> bool {
        self.base.is_active()
    }

    pub fn set_lod_opacity(&mut self, lod_opacity: f32) {
        self.lod_opacity = lod_opacity;
    }

    pub fn invalidate(&mut self) {
        self.base.invalidate();
    }

    pub fn base_value(&self) -> f32 {
        self.base.current()
    }

    /// `clamp01(baseValue * multiplier * lodOpacity)`.
    pub fn rendered(&self, multiplier: f32) -> f32 {
        (self.base.current() * multiplier * self.lod_opacity).clamp(0.0, 1.0)
    }
}
