//! Hit-test entry storage, point-in-quad resolution, and pointer event
//! dispatch.

mod controller;
mod dispatcher;
mod entry;

pub use controller::HitTestController;
pub use dispatcher::{EventDispatcher, ListenerId, PointerPhase, PointerSample, SpriteEvent, SpriteEventKind};
pub use entry::HitTestEntry;
