use sprite_math::EasingCurve;

use crate::clock::VirtualInstant;
use crate::interpolable::Interpolable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Feedback,
    Feedforward,
}

/// Options passed to `Channel::commit`. Malformed values (non-finite or
/// negative duration) fail open to an immediate snap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelOptions {
    pub duration_ms: f64,
    pub mode: InterpolationMode,
    pub easing: EasingCurve,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            duration_ms: 0.0,
            mode: InterpolationMode::Feedback,
            easing: EasingCurve::LINEAR,
        }
    }
}

impl ChannelOptions {
    fn sanitized_duration_ms(&self) -> f64 {
        if self.duration_ms.is_finite() && self.duration_ms > 0.0 {
            self.duration_ms
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct InterpolationState<T> {
    from: T,
    to: T,
    start: Option<VirtualInstant>,
    duration_ms: f64,
    easing: EasingCurve,
}

/// A single animatable value: the last-evaluated `current`, an optional
/// in-flight interpolation, and bookkeeping for invalidate-on-hide and
/// no-op detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel<T: Interpolable> {
    current: T,
    invalidated: bool,
    last_command_value: Option<T>,
    state: Option<InterpolationState<T>>,
}

impl<T: Interpolable> Channel<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: initial,
            invalidated: false,
            last_command_value: None,
            state: None,
        }
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn last_command_value(&self) -> Option<T> {
        self.last_command_value
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Records a new commanded value. Starts a new interpolation when the
    /// duration is positive, the channel isn't freshly invalidated, and the
    /// target actually differs from `current`; otherwise snaps immediately.
    pub fn commit(&mut self, next_value: T, options: ChannelOptions) {
        let previous_command = self.last_command_value;
        self.last_command_value = Some(next_value);

        let duration_ms = options.sanitized_duration_ms();
        if self.invalidated || duration_ms <= 0.0 || next_value == self.current {
            self.current = next_value;
            self.state = None;
            self.invalidated = false;
            return;
        }

        let to = match options.mode {
            InterpolationMode::Feedback => next_value,
            InterpolationMode::Feedforward => match previous_command {
                Some(previous_command) => {
                    T::feedforward_extrapolate(previous_command, next_value)
                }
                None => next_value,
            },
        };

        self.state = Some(InterpolationState {
            from: self.current,
            to,
            start: None,
            duration_ms,
            easing: options.easing,
        });
    }

    /// Advances the interpolation to `now`. Returns `(done, active)`: `done`
    /// is true exactly on the tick that completes the interpolation; `active`
    /// is true whenever a future tick would still make progress.
    pub fn step(&mut self, now: VirtualInstant) -> (bool, bool) {
        let Some(state) = &mut self.state else {
            return (false, false);
        };

        let start = *state.start.get_or_insert(now);
        let elapsed = now.saturating_sub(start);
        let progress = if state.duration_ms <= 0.0 {
            1.0
        } else {
            (elapsed / state.duration_ms).clamp(0.0, 1.0)
        };

        let eased = state.easing.evaluate(progress as f32);
        self.current = T::lerp(state.from, state.to, eased);

        if progress >= 1.0 {
            self.current = state.to;
            self.state = None;
            (true, false)
        } else {
            (false, true)
        }
    }

    /// Erases interpolation state without touching `current` or
    /// `last_command_value`.
    pub fn clear(&mut self) {
        self.state = None;
    }

    /// Marks the channel so the next `commit` snaps instead of animating;
    /// used on hide/re-enable.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
        self.state = None;
    }
}
