use std::cell::Cell;
use std::rc::Rc;

/// Shared cancellation flag handed back from `request`; checked right before
/// rasterization so a job cancelled while still queued never does the
/// (comparatively expensive) rasterize/register/upsert work at all.
#[derive(Debug, Clone)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(false)))
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
