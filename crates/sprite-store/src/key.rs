slotmap::new_key_type! {
    /// Stable per-sprite handle, after `render_protocol::ImageHandle`: a
    /// generational slotmap key rather than a monotonic counter, since sprites
    /// churn far more than registered images and slot reuse matters here.
    pub struct SpriteHandle;
}

/// `(subLayer, order)` encoded to a single comparable scalar, with a `NONE`
/// sentinel distinct from any real pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OriginKey(u64);

impl OriginKey {
    pub const NONE: Self = Self(u64::MAX);

    pub fn new(sub_layer: u32, order: u32) -> Self {
        Self(((sub_layer as u64) << 32) | order as u64)
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn sub_layer(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn order(self) -> u32 {
        self.0 as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_sub_layer_and_order() {
        let key = OriginKey::new(3, 7);
        assert_eq!(key.sub_layer(), 3);
        assert_eq!(key.order(), 7);
        assert!(!key.is_none());
    }

    #[test]
    fn orders_by_sub_layer_then_order() {
        assert!(OriginKey::new(0, 5) < OriginKey::new(1, 0));
        assert!(OriginKey::new(0, 0) < OriginKey::new(0, 1));
    }

    #[test]
    fn none_is_distinct_from_ordinary_pairs() {
        assert!(OriginKey::NONE.is_none());
        assert_ne!(OriginKey::NONE, OriginKey::new(0, 0));
        assert_ne!(OriginKey::NONE, OriginKey::new(1_000, 1_000));
    }
}
