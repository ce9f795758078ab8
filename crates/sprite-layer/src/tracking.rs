use sprite_math::LngLat;
use sprite_store::SpriteStore;

use crate::hosts::HostMap;

#[derive(Debug, Clone, PartialEq)]
struct TrackedSprite {
    id: String,
    track_rotation: Option<(u32, u32)>,
}

/// Nominates a sprite as the host camera's focal target.
#[derive(Debug, Default)]
pub struct SpriteTracking {
    tracked: Option<TrackedSprite>,
}

impl SpriteTracking {
    pub fn new() -> Self {
        Self::default()
    }

    /// `track_rotation` names the `(subLayer, order)` image whose
    /// `currentAutoRotateDeg + rotateDeg` should drive camera bearing, or
    /// `None` to only follow location.
    pub fn track_sprite(&mut self, id: impl Into<String>, track_rotation: Option<(u32, u32)>) {
        self.tracked = Some(TrackedSprite { id: id.into(), track_rotation });
    }

    pub fn untrack_sprite(&mut self) {
        self.tracked = None;
    }

    pub fn tracked_id(&self) -> Option<&str> {
        self.tracked.as_ref().map(|tracked| tracked.id.as_str())
    }

    /// Centers the host camera on the tracked sprite's current location, and
    /// sets its bearing if rotation tracking was requested and the
    /// designated image still exists. No-op if nothing is tracked or the
    /// tracked sprite has since been removed.
    pub fn apply(&self, store: &SpriteStore, map: &mut dyn HostMap) {
        let Some(tracked) = &self.tracked else { return };
        let Some(sprite) = store.get_by_id(&tracked.id) else { return };

        let location = sprite.location.current();
        map.set_center(LngLat::new(location.lng, location.lat));

        if let Some((sub_layer, order)) = tracked.track_rotation {
            if let Some(image) = sprite.image(sub_layer, order) {
                let bearing = sprite.current_auto_rotate_deg + image.rotate_deg.current().0;
                map.set_bearing(bearing);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprite_math::ScreenPoint;
    use sprite_store::{ImageInit, SpriteInit};

    struct RecordingHostMap {
        center: Option<LngLat>,
        bearing: Option<f32>,
    }

    impl HostMap for RecordingHostMap {
        fn project(&self, _location: LngLat) -> Option<ScreenPoint> {
            None
        }
        fn unproject(&self, _point: ScreenPoint) -> Option<LngLat> {
            None
        }
        fn zoom(&self) -> f32 {
            0.0
        }
        fn is_visible(&self) -> bool {
            true
        }
        fn trigger_repaint(&self) {}
        fn set_center(&mut self, location: LngLat) {
            self.center = Some(location);
        }
        fn set_bearing(&mut self, bearing_deg: f32) {
            self.bearing = Some(bearing_deg);
        }
    }

    #[test]
    fn apply_centers_camera_on_tracked_sprite_location() {
        let mut store = SpriteStore::new();
        store.add_sprite("a", SpriteInit { location: sprite_interp::Location::new(1.0, 2.0), ..SpriteInit::default() }).unwrap();
        let mut tracking = SpriteTracking::new();
        tracking.track_sprite("a", None);

        let mut map = RecordingHostMap { center: None, bearing: None };
        tracking.apply(&store, &mut map);
        assert_eq!(map.center, Some(LngLat::new(1.0, 2.0)));
        assert_eq!(map.bearing, None);
    }

    #[test]
    fn apply_sets_bearing_from_designated_image_rotation() {
        let mut store = SpriteStore::new();
        store
            .add_sprite("a", SpriteInit { images: vec![ImageInit::new(0, 0, "x")], ..SpriteInit::default() })
            .unwrap();
        store.get_by_id_mut("a").unwrap().current_auto_rotate_deg = 10.0;

        let mut tracking = SpriteTracking::new();
        tracking.track_sprite("a", Some((0, 0)));

        let mut map = RecordingHostMap { center: None, bearing: None };
        tracking.apply(&store, &mut map);
        assert_eq!(map.bearing, Some(10.0));
    }

    #[test]
    fn untrack_clears_the_binding() {
        let mut tracking = SpriteTracking::new();
        tracking.track_sprite("a", None);
        tracking.untrack_sprite();
        assert!(tracking.tracked_id().is_none());
    }
}
