/// A value a `Channel<T>` can animate between: linear interpolation plus the
/// feed-forward extrapolation rule (`next + (next - previous)`).
pub trait Interpolable: Copy + PartialEq {
    fn lerp(from: Self, to: Self, t: f32) -> Self;
    fn feedforward_extrapolate(previous_command: Self, next_command: Self) -> Self;
}

impl Interpolable for f32 {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        from + (to - from) * t
    }

    fn feedforward_extrapolate(previous_command: Self, next_command: Self) -> Self {
        next_command + (next_command - previous_command)
    }
}

/// A rotation in degrees, interpolated along the shortest signed arc (mod 360).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angle(pub f32);

impl Angle {
    pub fn normalized(self) -> Self {
        let mut deg = self.0 % 360.0;
        if deg < 0.0 {
            deg += 360.0;
        }
        Angle(deg)
    }

    /// Shortest signed delta from `self` to `other`, in `(-180, 180]`.
    pub fn shortest_signed_delta_to(self, other: Self) -> f32 {
        let mut delta = (other.0 - self.0) % 360.0;
        if delta > 180.0 {
            delta -= 360.0;
        } else if delta <= -180.0 {
            delta += 360.0;
        }
        delta
    }
}

impl Interpolable for Angle {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        let delta = from.shortest_signed_delta_to(to);
        Angle(from.0 + delta * t)
    }

    fn feedforward_extrapolate(previous_command: Self, next_command: Self) -> Self {
        let delta = previous_command.shortest_signed_delta_to(next_command);
        Angle(next_command.0 + delta)
    }
}

/// A sprite's geographic anchor: longitude, latitude, and an optional altitude
/// in meters. Interpolated component-wise (longitude/latitude are not
/// wrap-around here; displacements involved are always small relative to the
/// antimeridian).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lng: f64,
    pub lat: f64,
    pub z: Option<f64>,
}

impl Location {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat, z: None }
    }

    pub fn with_altitude(lng: f64, lat: f64, z: f64) -> Self {
        Self { lng, lat, z: Some(z) }
    }
}

impl Interpolable for Location {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        let t = t as f64;
        Location {
            lng: from.lng + (to.lng - from.lng) * t,
            lat: from.lat + (to.lat - from.lat) * t,
            z: match (from.z, to.z) {
                (Some(a), Some(b)) => Some(a + (b - a) * t),
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            },
        }
    }

    fn feedforward_extrapolate(previous_command: Self, next_command: Self) -> Self {
        Location {
            lng: next_command.lng + (next_command.lng - previous_command.lng),
            lat: next_command.lat + (next_command.lat - previous_command.lat),
            z: match (previous_command.z, next_command.z) {
                (Some(prev), Some(next)) => Some(next + (next - prev)),
                (None, Some(next)) => Some(next),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_lerp_crosses_zero_the_short_way() {
        let from = Angle(350.0);
        let to = Angle(10.0);
        let mid = Angle::lerp(from, to, 0.5);
        assert!((mid.0 - 0.0).abs() < 1e-3 || (mid.0 - 360.0).abs() < 1e-3);
    }

    #[test]
    fn angle_lerp_never_exceeds_180_degrees_of_travel() {
        for (start, end) in [(10.0, 350.0), (0.0, 179.0), (179.0, -179.0)] {
            let from = Angle(start);
            let to = Angle(end);
            for step in 0..=10 {
                let t = step as f32 / 10.0;
                let current = Angle::lerp(from, to, t);
                let travelled = from.shortest_signed_delta_to(current).abs();
                assert!(travelled <= 180.0 + 1e-3);
            }
        }
    }

    #[test]
    fn location_feedforward_doubles_the_displacement() {
        let previous = Location::new(0.0, 0.0);
        let next = Location::new(1.0, 0.0);
        let extrapolated = Location::feedforward_extrapolate(previous, next);
        assert!((extrapolated.lng - 2.0).abs() < 1e-9);
        assert_eq!(extrapolated.lat, 0.0);
    }
}
