//! Time-budgeted, cancellable text-to-bitmap glyph generation queue.

mod queue;
mod token;

pub use queue::{GlyphDrainStats, GlyphQueue, GlyphRasterizer, RasterizeError};
pub use token::CancelToken;
