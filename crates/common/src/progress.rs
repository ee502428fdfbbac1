//! Generic progress callback trait and implementations.

use std::marker::PhantomData;

/// Progress callback, generic over the progress payload.
///
/// Returning `false` from `on_progress` asks the caller to cancel.
pub trait ProgressCallback<T>: Send + Sync {
    fn on_progress(&self, progress: &T) -> bool;
}

/// Callback that ignores updates and never cancels.
pub struct NoOpProgress;

impl<T> ProgressCallback<T> for NoOpProgress {
    fn on_progress(&self, _progress: &T) -> bool {
        true
    }
}

/// A progress callback that wraps a closure.
pub struct FnProgress<F, T> {
    callback: F,
    _marker: PhantomData<fn(&T)>,
}

impl<F, T> ProgressCallback<T> for FnProgress<F, T>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn on_progress(&self, progress: &T) -> bool {
        (self.callback)(progress)
    }
}

/// Create a progress callback from a closure.
///
/// # Arguments
/// * `f` - Closure that receives progress and returns whether to continue
pub fn progress_fn<F, T>(f: F) -> FnProgress<F, T>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    FnProgress {
        callback: f,
        _marker: PhantomData,
    }
}
