use crate::state::SpriteState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginError {
    MissingReferent { sub_layer: u32, order: u32 },
    Cycle { sub_layer: u32, order: u32 },
}

/// Origin references form a DAG per sprite. Walks each image's
/// `originLocation` chain depth-first, after `document::LayerTreeNode`'s
/// recursive tree-walk idiom, bounding depth by the sprite's own image count
/// so a cycle can never run away.
pub fn validate_origins(sprite: &SpriteState) -> Result<(), OriginError> {
    for image in sprite.iter_images() {
        let Some(origin) = image.origin_location else { continue };
        walk_from(sprite, image.sub_layer, image.order, origin.sub_layer, origin.order)?;
    }
    Ok(())
}

fn walk_from(
    sprite: &SpriteState,
    start_sub_layer: u32,
    start_order: u32,
    mut sub_layer: u32,
    mut order: u32,
) -> Result<(), OriginError> {
    let max_depth = sprite.iter_images().count().max(1);
    for _ in 0..max_depth {
        if sub_layer == start_sub_layer && order == start_order {
            return Err(OriginError::Cycle { sub_layer: start_sub_layer, order: start_order });
        }
        let Some(referent) = sprite.image(sub_layer, order) else {
            return Err(OriginError::MissingReferent { sub_layer, order });
        };
        match referent.origin_location {
            Some(next) => {
                sub_layer = next.sub_layer;
                order = next.order;
            }
            None => return Ok(()),
        }
    }
    Err(OriginError::Cycle { sub_layer: start_sub_layer, order: start_order })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::SpriteHandle;
    use crate::state::{ImageMode, ImageState, OffsetChannels, OriginLocation};
    use sprite_interp::{Angle, Channel, Location, OpacityChannel};

    fn handle() -> SpriteHandle {
        let mut map: slotmap::SlotMap<SpriteHandle, ()> = slotmap::SlotMap::with_key();
        map.insert(())
    }

    fn image(sub_layer: u32, order: u32, origin: Option<(u32, u32)>) -> ImageState {
        ImageState {
            sub_layer,
            order,
            image_id: "img".into(),
            image_handle: 0,
            mode: ImageMode::Billboard,
            anchor: sprite_math::Anchor::CENTER,
            scale: 1.0,
            opacity: OpacityChannel::new(1.0),
            border: None,
            leader_line: None,
            rotate_deg: Channel::new(Angle(0.0)),
            auto_rotation: false,
            auto_rotation_min_distance_meters: 0.0,
            offset: OffsetChannels::new(0.0, 0.0),
            origin_location: origin.map(|(sub_layer, order)| OriginLocation {
                sub_layer,
                order,
                use_resolved_anchor: false,
            }),
            interpolation_dirty: false,
            origin_render_target_index: None,
            hit_test_corners: None,
        }
    }

    fn sprite_with(images: Vec<ImageState>) -> SpriteState {
        let mut sprite = SpriteState::new(handle(), Location::new(0.0, 0.0));
        for image in images {
            sprite.insert_image(image);
        }
        sprite
    }

    #[test]
    fn acyclic_chain_validates() {
        let sprite = sprite_with(vec![image(0, 0, None), image(0, 1, Some((0, 0)))]);
        assert!(validate_origins(&sprite).is_ok());
    }

    #[test]
    fn direct_cycle_is_rejected() {
        let sprite = sprite_with(vec![image(0, 0, Some((0, 1))), image(0, 1, Some((0, 0)))]);
        assert!(matches!(validate_origins(&sprite), Err(OriginError::Cycle { .. })));
    }

    #[test]
    fn missing_referent_is_rejected() {
        let sprite = sprite_with(vec![image(0, 0, Some((5, 5)))]);
        assert!(matches!(validate_origins(&sprite), Err(OriginError::MissingReferent { .. })));
    }
}
