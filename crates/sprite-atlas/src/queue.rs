use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::deferred::AtlasDeferred;
use crate::error::AtlasOpError;
use crate::key::ImageHandle;
use crate::manager::AtlasManager;
use crate::registry::UvRect;

pub type SharedDeferred<T> = Rc<RefCell<AtlasDeferred<T>>>;

enum AtlasOp {
    Upsert { width: u32, height: u32 },
    Remove,
}

struct QueuedOperation {
    op: AtlasOp,
    deferred: SharedDeferred<(i32, UvRect)>,
}

/// A time-budgeted operation queue: `upsert`/`remove` are enqueued rather
/// than applied immediately so a single caller burst (e.g. loading a sprite
/// sheet) can't blow a frame's time budget. Draining follows
/// `frame_scheduler::FrameScheduler`'s per-tick quota shape: the caller
/// supplies both an operation-count cap and a wall-clock time budget for this
/// pass, and the queue stops at whichever is exhausted first, leaving the
/// rest for the next drain.
#[derive(Default)]
pub struct AtlasOperationQueue {
    order: VecDeque<ImageHandle>,
    pending: HashMap<ImageHandle, QueuedOperation>,
}

impl AtlasOperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Enqueues a placement request. A still-pending operation for the same
    /// handle is cancelled and superseded: only the latest request for an
    /// image is meaningful.
    pub fn upsert(&mut self, handle: ImageHandle, width: u32, height: u32) -> SharedDeferred<(i32, UvRect)> {
        self.enqueue(handle, AtlasOp::Upsert { width, height })
    }

    pub fn remove(&mut self, handle: ImageHandle) -> SharedDeferred<(i32, UvRect)> {
        self.enqueue(handle, AtlasOp::Remove)
    }

    fn enqueue(&mut self, handle: ImageHandle, op: AtlasOp) -> SharedDeferred<(i32, UvRect)> {
        self.cancel_for_image(handle);
        self.order.push_back(handle);
        let deferred: SharedDeferred<(i32, UvRect)> = Rc::new(RefCell::new(AtlasDeferred::pending()));
        self.pending.insert(handle, QueuedOperation { op, deferred: Rc::clone(&deferred) });
        deferred
    }

    /// Cancels any still-pending operation for `handle`, resolving its
    /// deferred with `Cancelled` rather than leaving it unresolved forever.
    pub fn cancel_for_image(&mut self, handle: ImageHandle) {
        if let Some(queued) = self.pending.remove(&handle) {
            queued.deferred.borrow_mut().resolve(Err(AtlasOpError::Cancelled));
        }
    }

    /// Cancels every pending operation, as on a layer-wide `clear()`.
    pub fn clear(&mut self) {
        for (_, queued) in self.pending.drain() {
            queued.deferred.borrow_mut().resolve(Err(AtlasOpError::Cancelled));
        }
        self.order.clear();
    }

    /// Applies up to `max_operations` pending operations against `manager`,
    /// resolving each operation's deferred with the outcome. Stops early once
    /// `time_budget` has elapsed since the call started, even if operations
    /// remain and `max_operations` hasn't been reached; at least one
    /// operation is always applied so the queue can't starve under a very
    /// small budget. Returns the number actually applied; a return value
    /// below `max_operations` means either the queue drained completely this
    /// pass or the time budget ran out.
    pub fn drain(&mut self, manager: &mut AtlasManager, max_operations: usize, time_budget: Duration) -> usize {
        let deadline = Instant::now() + time_budget;
        let mut applied = 0;
        while applied < max_operations {
            let Some(handle) = self.order.pop_front() else { break };
            let Some(queued) = self.pending.remove(&handle) else { continue };
            let outcome = match queued.op {
                AtlasOp::Upsert { width, height } => {
                    manager.upsert(handle, width, height).map_err(AtlasOpError::from)
                }
                AtlasOp::Remove => {
                    manager.remove(handle);
                    Ok((-1, UvRect::UNPLACED))
                }
            };
            queued.deferred.borrow_mut().resolve(outcome);
            applied += 1;
            if Instant::now() >= deadline {
                break;
            }
        }
        applied
    }
}
