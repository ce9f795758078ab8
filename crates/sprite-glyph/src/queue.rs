use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use sprite_atlas::{AtlasOperationQueue, Bitmap, ImageRegistry};

use crate::token::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterizeError {
    Failed,
}

/// Host-provided text rasterizer; turning a spec into a bitmap is explicitly
/// out of scope here (out of scope per the overview: "font rasterisation to
/// a bitmap"). This queue only owns the scheduling, dedup, and registration
/// plumbing around that call.
pub trait GlyphRasterizer<Spec, B: Bitmap> {
    fn rasterize(&mut self, spec: &Spec) -> Result<B, RasterizeError>;
}

struct GlyphJob<Spec> {
    id: String,
    spec: Spec,
    token: CancelToken,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphDrainStats {
    pub processed: usize,
    pub registered: usize,
    pub skipped_cancelled: usize,
    pub skipped_already_registered: usize,
    pub failed: usize,
}

/// A FIFO of pending glyph-bitmap requests, deduplicated by id and
/// drained under a per-tick job count and time budget (grounded on
/// `tiles::lifecycle::BufferTileLifecycle`'s pending/drain split and
/// `frame_scheduler::FrameScheduler`'s per-tick quota).
pub struct GlyphQueue<Spec> {
    pending: VecDeque<GlyphJob<Spec>>,
    queued_ids: HashSet<String>,
    tokens: HashMap<String, CancelToken>,
}

impl<Spec> Default for GlyphQueue<Spec> {
    fn default() -> Self {
        Self { pending: VecDeque::new(), queued_ids: HashSet::new(), tokens: HashMap::new() }
    }
}

impl<Spec> GlyphQueue<Spec> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Enqueues a glyph request. Returns `None` (dedup short-circuit) if the
    /// same id is already queued; the caller should reuse the existing
    /// token via `token_for` instead.
    pub fn request(&mut self, id: impl Into<String>, spec: Spec) -> Option<CancelToken> {
        let id = id.into();
        if self.queued_ids.contains(&id) {
            return None;
        }
        let token = CancelToken::new();
        self.queued_ids.insert(id.clone());
        self.tokens.insert(id.clone(), token.clone());
        self.pending.push_back(GlyphJob { id, spec, token: token.clone() });
        Some(token)
    }

    pub fn token_for(&self, id: &str) -> Option<CancelToken> {
        self.tokens.get(id).cloned()
    }

    /// Cancels a queued job. No-op if the job has already been drained.
    pub fn cancel(&mut self, id: &str) -> bool {
        if let Some(token) = self.tokens.remove(id) {
            token.cancel();
            self.queued_ids.remove(id);
            true
        } else {
            false
        }
    }

    pub fn cancel_all(&mut self) {
        for token in self.tokens.values() {
            token.cancel();
        }
        self.tokens.clear();
        self.queued_ids.clear();
    }

    /// Drains up to `max_jobs`, rasterizing, registering, and enqueueing an
    /// atlas upsert for each surviving job. A cancelled job is dropped
    /// without rasterizing; a job whose id is already registered is dropped
    /// without re-rasterizing (dedup-by-id short-circuit). Stops early once
    /// `time_budget` has elapsed, even if `max_jobs` hasn't been reached yet;
    /// at least one job is always processed so the queue can't starve under a
    /// very small budget.
    pub fn drain<B: Bitmap>(
        &mut self,
        max_jobs: usize,
        time_budget: Duration,
        rasterizer: &mut dyn GlyphRasterizer<Spec, B>,
        registry: &mut ImageRegistry<B>,
        atlas_queue: &mut AtlasOperationQueue,
    ) -> GlyphDrainStats {
        let deadline = Instant::now() + time_budget;
        let mut stats = GlyphDrainStats::default();
        while stats.processed < max_jobs {
            let Some(job) = self.pending.pop_front() else { break };
            self.queued_ids.remove(&job.id);
            self.tokens.remove(&job.id);
            stats.processed += 1;

            if job.token.is_cancelled() {
                stats.skipped_cancelled += 1;
            } else if registry.contains(&job.id) {
                stats.skipped_already_registered += 1;
            } else {
                match rasterizer.rasterize(&job.spec) {
                    Ok(bitmap) => {
                        let width = bitmap.width();
                        let height = bitmap.height();
                        match registry.register(job.id.clone(), bitmap) {
                            Ok(handle) => {
                                atlas_queue.upsert(handle, width, height);
                                stats.registered += 1;
                            }
                            Err(_duplicate) => {
                                // Lost a race against a direct caller of the registry;
                                // the already-registered image wins, ours is discarded.
                                stats.skipped_already_registered += 1;
                            }
                        }
                    }
                    Err(RasterizeError::Failed) => {
                        log::warn!("glyph rasterization failed for id {}", job.id);
                        stats.failed += 1;
                    }
                }
            }

            if Instant::now() >= deadline {
                break;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TestBitmap {
        width: u32,
        height: u32,
        closed: bool,
    }

    impl Bitmap for TestBitmap {
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
        fn close(&mut self) {
            self.closed = true;
        }
    }

    struct EchoRasterizer;
    impl GlyphRasterizer<String, TestBitmap> for EchoRasterizer {
        fn rasterize(&mut self, _spec: &String) -> Result<TestBitmap, RasterizeError> {
            Ok(TestBitmap { width: 8, height: 8, closed: false })
        }
    }

    struct FailingRasterizer;
    impl GlyphRasterizer<String, TestBitmap> for FailingRasterizer {
        fn rasterize(&mut self, _spec: &String) -> Result<TestBitmap, RasterizeError> {
            Err(RasterizeError::Failed)
        }
    }

    #[test]
    fn duplicate_request_before_drain_is_deduped() {
        let mut queue: GlyphQueue<String> = GlyphQueue::new();
        assert!(queue.request("glyph:a", "a".to_string()).is_some());
        assert!(queue.request("glyph:a", "a".to_string()).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn drain_registers_and_enqueues_an_atlas_upsert() {
        let mut queue: GlyphQueue<String> = GlyphQueue::new();
        queue.request("glyph:a", "a".to_string());
        let mut registry: ImageRegistry<TestBitmap> = ImageRegistry::new();
        let mut atlas_queue = AtlasOperationQueue::new();
        let stats = queue.drain(10, Duration::from_millis(16), &mut EchoRasterizer, &mut registry, &mut atlas_queue);
        assert_eq!(stats.registered, 1);
        assert!(registry.contains("glyph:a"));
        assert_eq!(atlas_queue.len(), 1);
    }

    #[test]
    fn cancelled_job_is_skipped_without_rasterizing() {
        let mut queue: GlyphQueue<String> = GlyphQueue::new();
        queue.request("glyph:a", "a".to_string());
        queue.cancel("glyph:a");
        let mut registry: ImageRegistry<TestBitmap> = ImageRegistry::new();
        let mut atlas_queue = AtlasOperationQueue::new();
        let stats = queue.drain(10, Duration::from_millis(16), &mut EchoRasterizer, &mut registry, &mut atlas_queue);
        assert_eq!(stats.skipped_cancelled, 1);
        assert!(!registry.contains("glyph:a"));
    }

    #[test]
    fn drain_respects_the_per_tick_job_budget() {
        let mut queue: GlyphQueue<String> = GlyphQueue::new();
        for index in 0..5 {
            queue.request(format!("glyph:{index}"), "x".to_string());
        }
        let mut registry: ImageRegistry<TestBitmap> = ImageRegistry::new();
        let mut atlas_queue = AtlasOperationQueue::new();
        let stats = queue.drain(2, Duration::from_millis(16), &mut EchoRasterizer, &mut registry, &mut atlas_queue);
        assert_eq!(stats.processed, 2);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn drain_stops_early_once_the_time_budget_is_exhausted() {
        let mut queue: GlyphQueue<String> = GlyphQueue::new();
        for index in 0..5 {
            queue.request(format!("glyph:{index}"), "x".to_string());
        }
        let mut registry: ImageRegistry<TestBitmap> = ImageRegistry::new();
        let mut atlas_queue = AtlasOperationQueue::new();
        let stats = queue.drain(5, Duration::ZERO, &mut EchoRasterizer, &mut registry, &mut atlas_queue);
        assert!(stats.processed >= 1);
        assert!(stats.processed < 5);
    }

    #[test]
    fn failed_rasterization_leaves_nothing_registered() {
        let mut queue: GlyphQueue<String> = GlyphQueue::new();
        queue.request("glyph:a", "a".to_string());
        let mut registry: ImageRegistry<TestBitmap> = ImageRegistry::new();
        let mut atlas_queue = AtlasOperationQueue::new();
        let stats = queue.drain(10, Duration::from_millis(16), &mut FailingRasterizer, &mut registry, &mut atlas_queue);
        assert_eq!(stats.failed, 1);
        assert!(!registry.contains("glyph:a"));
    }
}
