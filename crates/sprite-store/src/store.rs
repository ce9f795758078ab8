use std::collections::HashMap;

use slotmap::SlotMap;

use crate::key::SpriteHandle;
use crate::state::SpriteState;

/// Pure in-memory sprite/image store keyed by `spriteId`. Mutation is
/// routed through `mutation::MutationApi`; this type only owns the data and
/// the `spriteId <-> handle` index, after `atlas::ImageRegistry`'s
/// id-to-handle table split.
#[derive(Default)]
pub struct SpriteStore {
    sprites: SlotMap<SpriteHandle, SpriteState>,
    id_by_handle: HashMap<SpriteHandle, String>,
    handle_by_id: HashMap<String, SpriteHandle>,
}

impl SpriteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.handle_by_id.contains_key(id)
    }

    pub fn handle_for_id(&self, id: &str) -> Option<SpriteHandle> {
        self.handle_by_id.get(id).copied()
    }

    pub fn id_for_handle(&self, handle: SpriteHandle) -> Option<&str> {
        self.id_by_handle.get(&handle).map(String::as_str)
    }

    pub(crate) fn insert(&mut self, id: String, build: impl FnOnce(SpriteHandle) -> SpriteState) -> SpriteHandle {
        let handle = self.sprites.insert_with_key(|handle| build(handle));
        self.id_by_handle.insert(handle, id.clone());
        self.handle_by_id.insert(id, handle);
        handle
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let Some(handle) = self.handle_by_id.remove(id) else { return false };
        self.id_by_handle.remove(&handle);
        self.sprites.remove(handle).is_some()
    }

    pub fn remove_all(&mut self) -> usize {
        let count = self.sprites.len();
        self.sprites.clear();
        self.id_by_handle.clear();
        self.handle_by_id.clear();
        count
    }

    pub fn get(&self, handle: SpriteHandle) -> Option<&SpriteState> {
        self.sprites.get(handle)
    }

    pub fn get_mut(&mut self, handle: SpriteHandle) -> Option<&mut SpriteState> {
        self.sprites.get_mut(handle)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&SpriteState> {
        self.get(self.handle_for_id(id)?)
    }

    pub fn get_by_id_mut(&mut self, id: &str) -> Option<&mut SpriteState> {
        let handle = self.handle_for_id(id)?;
        self.get_mut(handle)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn all_ids(&self) -> Vec<&str> {
        self.handle_by_id.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpriteHandle, &SpriteState)> {
        self.sprites.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SpriteHandle, &mut SpriteState)> {
        self.sprites.iter_mut()
    }
}
