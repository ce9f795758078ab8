use crate::error::AtlasOpError;

/// Hand-rolled single-resolution cell for an asynchronous atlas registration
/// pathway. No async runtime is involved: the host polls `poll()` on its own
/// schedule (typically once per drained frame) after an operation is
/// enqueued, exactly as it polls `FrameScheduler::schedule_frame`.
#[derive(Debug, Default)]
pub struct AtlasDeferred<T> {
    result: Option<Result<T, AtlasOpError>>,
}

impl<T> AtlasDeferred<T> {
    pub fn pending() -> Self {
        Self { result: None }
    }

    pub fn is_resolved(&self) -> bool {
        self.result.is_some()
    }

    /// Resolves the deferred. A second call is a no-op: the first outcome
    /// (success or cancellation) wins.
    pub fn resolve(&mut self, result: Result<T, AtlasOpError>) {
        if self.result.is_none() {
            self.result = Some(result);
        }
    }

    pub fn poll(&mut self) -> Option<Result<T, AtlasOpError>> {
        self.result.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_returns_none_until_resolved() {
        let mut deferred: AtlasDeferred<u32> = AtlasDeferred::pending();
        assert!(deferred.poll().is_none());
        deferred.resolve(Ok(7));
        assert_eq!(deferred.poll(), Some(Ok(7)));
    }

    #[test]
    fn second_resolve_is_ignored() {
        let mut deferred: AtlasDeferred<u32> = AtlasDeferred::pending();
        deferred.resolve(Ok(1));
        deferred.resolve(Err(AtlasOpError::Cancelled));
        assert_eq!(deferred.poll(), Some(Ok(1)));
    }

    #[test]
    fn poll_consumes_the_result() {
        let mut deferred: AtlasDeferred<u32> = AtlasDeferred::pending();
        deferred.resolve(Ok(3));
        assert!(deferred.poll().is_some());
        assert!(deferred.poll().is_none());
    }
}
