/// Named easing curves, forwarded to the `simple_easing` crate's functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedCurve {
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    SineIn,
    SineOut,
    SineInOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
    BackIn,
    BackOut,
    BackInOut,
}

impl NamedCurve {
    fn apply(self, t: f32) -> f32 {
        match self {
            NamedCurve::Linear => t,
            NamedCurve::QuadIn => simple_easing::quad_in(t),
            NamedCurve::QuadOut => simple_easing::quad_out(t),
            NamedCurve::QuadInOut => simple_easing::quad_in_out(t),
            NamedCurve::CubicIn => simple_easing::cubic_in(t),
            NamedCurve::CubicOut => simple_easing::cubic_out(t),
            NamedCurve::CubicInOut => simple_easing::cubic_in_out(t),
            NamedCurve::SineIn => simple_easing::sine_in(t),
            NamedCurve::SineOut => simple_easing::sine_out(t),
            NamedCurve::SineInOut => simple_easing::sine_in_out(t),
            NamedCurve::ExpoIn => simple_easing::expo_in(t),
            NamedCurve::ExpoOut => simple_easing::expo_out(t),
            NamedCurve::ExpoInOut => simple_easing::expo_in_out(t),
            NamedCurve::BackIn => simple_easing::back_in(t),
            NamedCurve::BackOut => simple_easing::back_out(t),
            NamedCurve::BackInOut => simple_easing::back_in_out(t),
        }
    }
}

/// An easing function selectable per animation channel: either a named curve or an
/// arbitrary cubic-bezier (CSS `cubic-bezier(p1x, p1y, p2x, p2y)` convention, with the
/// curve's start/end pinned at `(0,0)`/`(1,1)`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EasingCurve {
    Named(NamedCurve),
    CubicBezier { p1x: f32, p1y: f32, p2x: f32, p2y: f32 },
}

impl EasingCurve {
    pub const LINEAR: Self = EasingCurve::Named(NamedCurve::Linear);

    /// Evaluates the curve at `t` in `[0, 1]`. Invalid bezier control points (NaN,
    /// infinite, or an x-coordinate outside `[0, 1]` that would make the curve
    /// non-monotonic in time) fail open to linear rather than propagating an error,
    /// since an easing glitch should never halt animation playback.
    pub fn evaluate(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingCurve::Named(curve) => curve.apply(t),
            EasingCurve::CubicBezier { p1x, p1y, p2x, p2y } => {
                if !is_valid_bezier(p1x, p2x) {
                    return t;
                }
                solve_cubic_bezier(p1x, p1y, p2x, p2y, t)
            }
        }
    }
}

fn is_valid_bezier(p1x: f32, p2x: f32) -> bool {
    [p1x, p2x].iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v))
}

/// Solves `y` at parameter `t` for a cubic bezier anchored at `(0,0)` and `(1,1)` by
/// Newton-Raphson on the `x(s) = t` equation, then evaluating `y(s)`.
fn solve_cubic_bezier(p1x: f32, p1y: f32, p2x: f32, p2y: f32, t: f32) -> f32 {
    let bezier_component = |s: f32, a: f32, b: f32| {
        let s_inv = 1.0 - s;
        3.0 * s_inv * s_inv * s * a + 3.0 * s_inv * s * s * b + s * s * s
    };
    let bezier_derivative = |s: f32, a: f32, b: f32| {
        let s_inv = 1.0 - s;
        3.0 * s_inv * s_inv * a + 6.0 * s_inv * s * (b - a) + 3.0 * s * s * (1.0 - b)
    };

    let mut s = t;
    for _ in 0..8 {
        let x = bezier_component(s, p1x, p2x) - t;
        if x.abs() < 1e-5 {
            break;
        }
        let dx = bezier_derivative(s, p1x, p2x);
        if dx.abs() < 1e-6 {
            break;
        }
        s -= x / dx;
        s = s.clamp(0.0, 1.0);
    }
    bezier_component(s, p1y, p2y)
}
