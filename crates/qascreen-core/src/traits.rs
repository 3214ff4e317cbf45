/// Non-blocking view of whether a supervised task has reached a terminal state.
///
/// The poll loop observes this between samples; observing it never consumes
/// the task's result.
pub trait CompletionSignal: Send + Sync {
    /// Returns `true` once the task has finished, successfully or not.
    fn is_done(&self) -> bool;
}

impl CompletionSignal for std::sync::atomic::AtomicBool {
    fn is_done(&self) -> bool {
        self.load(std::sync::atomic::Ordering::Acquire)
    }
}
