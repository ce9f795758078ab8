use sprite_store::SpriteHandle;

use crate::controller::HitTestController;

/// Pointer phase vocabulary generalized from the stroke-input driver's
/// `PointerEventPhase` to hit-test queries: no pressure/tilt payload, just
/// enough to drive click/hover/move/leave dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Move,
    Down,
    Up,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub phase: PointerPhase,
    pub screen_x: f32,
    pub screen_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteEventKind {
    Click,
    Hover,
    Move,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteEvent {
    pub kind: SpriteEventKind,
    pub sprite: SpriteHandle,
    pub sub_layer: u32,
    pub order: u32,
    pub screen_point: (f32, f32),
}

pub type ListenerId = u64;

/// Turns host pointer samples into `spriteclick`/`spritehover`/
/// `spritemove`/`spriteleave` events by querying the hit-test controller each
/// time, tracking which entry (if any) is currently hovered so leave/hover
/// transitions fire exactly once.
#[derive(Default)]
pub struct EventDispatcher {
    next_listener_id: ListenerId,
    listeners: Vec<(ListenerId, SpriteEventKind, Box<dyn FnMut(SpriteEvent)>)>,
    hovered: Option<(SpriteHandle, u32, u32)>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: SpriteEventKind, listener: impl FnMut(SpriteEvent) + 'static) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, kind, Box::new(listener)));
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, kind: SpriteEventKind, sprite: SpriteHandle, sub_layer: u32, order: u32, screen_point: (f32, f32)) {
        let event = SpriteEvent { kind, sprite, sub_layer, order, screen_point };
        for (_, listener_kind, listener) in &mut self.listeners {
            if *listener_kind == kind {
                listener(event);
            }
        }
    }

    /// Dispatches one pointer sample against the hit-tester's current
    /// entries. `Move` samples drive hover/leave/move; `Up` drives click
    /// (resolved against the point where the pointer was released).
    pub fn dispatch(&mut self, controller: &HitTestController, sample: PointerSample) {
        let point = (sample.screen_x, sample.screen_y);
        let hit = controller.resolve(point).map(|entry| (entry.sprite, entry.sub_layer, entry.order));

        match sample.phase {
            PointerPhase::Move | PointerPhase::Down => {
                if hit != self.hovered {
                    if let Some((sprite, sub_layer, order)) = self.hovered.take() {
                        self.emit(SpriteEventKind::Leave, sprite, sub_layer, order, point);
                    }
                    if let Some((sprite, sub_layer, order)) = hit {
                        self.emit(SpriteEventKind::Hover, sprite, sub_layer, order, point);
                    }
                    self.hovered = hit;
                }
                if let Some((sprite, sub_layer, order)) = hit {
                    self.emit(SpriteEventKind::Move, sprite, sub_layer, order, point);
                }
            }
            PointerPhase::Up => {
                if let Some((sprite, sub_layer, order)) = hit {
                    self.emit(SpriteEventKind::Click, sprite, sub_layer, order, point);
                }
            }
            PointerPhase::Cancel => {
                if let Some((sprite, sub_layer, order)) = self.hovered.take() {
                    self.emit(SpriteEventKind::Leave, sprite, sub_layer, order, point);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use sprite_store::SpriteHandle;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn hover_then_leave_fire_once_each_on_transition() {
        let mut map: SlotMap<SpriteHandle, ()> = SlotMap::with_key();
        let sprite = map.insert(());
        let mut controller = HitTestController::new();
        controller.register_hit_test_entry(sprite, 0, 0, [(90.0, 90.0), (110.0, 90.0), (110.0, 110.0), (90.0, 110.0)], 0);

        let hovers = Rc::new(RefCell::new(0));
        let leaves = Rc::new(RefCell::new(0));
        let mut dispatcher = EventDispatcher::new();
        let hovers_clone = Rc::clone(&hovers);
        dispatcher.on(SpriteEventKind::Hover, move |_| *hovers_clone.borrow_mut() += 1);
        let leaves_clone = Rc::clone(&leaves);
        dispatcher.on(SpriteEventKind::Leave, move |_| *leaves_clone.borrow_mut() += 1);

        dispatcher.dispatch(&controller, PointerSample { phase: PointerPhase::Move, screen_x: 100.0, screen_y: 100.0 });
        dispatcher.dispatch(&controller, PointerSample { phase: PointerPhase::Move, screen_x: 100.0, screen_y: 100.0 });
        assert_eq!(*hovers.borrow(), 1);

        dispatcher.dispatch(&controller, PointerSample { phase: PointerPhase::Move, screen_x: 500.0, screen_y: 500.0 });
        assert_eq!(*leaves.borrow(), 1);
    }

    #[test]
    fn click_fires_only_on_up_over_an_entry() {
        let mut map: SlotMap<SpriteHandle, ()> = SlotMap::with_key();
        let sprite = map.insert(());
        let mut controller = HitTestController::new();
        controller.register_hit_test_entry(sprite, 0, 0, [(90.0, 90.0), (110.0, 90.0), (110.0, 110.0), (90.0, 110.0)], 0);

        let clicks = Rc::new(RefCell::new(0));
        let mut dispatcher = EventDispatcher::new();
        let clicks_clone = Rc::clone(&clicks);
        dispatcher.on(SpriteEventKind::Click, move |_| *clicks_clone.borrow_mut() += 1);

        dispatcher.dispatch(&controller, PointerSample { phase: PointerPhase::Up, screen_x: 500.0, screen_y: 500.0 });
        assert_eq!(*clicks.borrow(), 0);
        dispatcher.dispatch(&controller, PointerSample { phase: PointerPhase::Up, screen_x: 100.0, screen_y: 100.0 });
        assert_eq!(*clicks.borrow(), 1);
    }
}
