use tokio::runtime::Handle;

use crate::error::{StoreError, StoreResult};

/// Where the blocking file I/O behind `observe_*` calls runs.
///
/// The result is always delivered to whichever task awaits the returned
/// future. Once a job has been handed to a blocking thread it runs to
/// completion even if that future is dropped, so a committed write still
/// publishes its event.
#[derive(Clone, Debug, Default)]
pub enum IoScheduler {
    /// `spawn_blocking` on the runtime that polls the future.
    #[default]
    CurrentRuntime,
    /// `spawn_blocking` on a specific runtime, e.g. one reserved for I/O.
    Runtime(Handle),
    /// Run on the awaiting task itself. Useful in tests.
    Inline,
}

impl IoScheduler {
    pub(crate) async fn run<R, F>(&self, job: F) -> StoreResult<R>
    where
        F: FnOnce() -> StoreResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let task = match self {
            Self::Inline => return job(),
            Self::CurrentRuntime => Handle::try_current()
                .map_err(|e| StoreError::Worker(e.to_string()))?
                .spawn_blocking(job),
            Self::Runtime(handle) => handle.spawn_blocking(job),
        };
        task.await.map_err(|e| StoreError::Worker(e.to_string()))?
    }
}
