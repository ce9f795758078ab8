//! Sprite/image state store, mutation API with origin-reference validation,
//! and the render-target builder.

mod key;
mod mutation;
mod origin;
mod render_target;
mod state;
mod store;

pub use key::{OriginKey, SpriteHandle};
pub use mutation::{ImageInit, MutateDecision, MutationError, SpriteInit, SpriteUpdaterEntry};
pub use origin::{validate_origins, OriginError};
pub use render_target::{RenderTargetCache, RenderTargetEntry};
pub use state::{
    BorderSpec, ImageMode, ImageState, LeaderLineSpec, OffsetChannels, OriginLocation, SpriteState,
};
pub use store::SpriteStore;
