//! Blocking/async bridge
//!
//! The blocking cache facade is a thin layer over the async one; this
//! module provides the runtime it blocks on. When a tokio runtime is
//! already running at manager construction, its handle is reused;
//! otherwise the bridge owns a private multi-thread runtime.
//!
//! [`RuntimeBridge::block_for_timeout`] carries the await-with-timeout
//! contract: an expired wait resolves to `None` WITHOUT cancelling the
//! underlying operation. The task was spawned first and keeps running to
//! completion or failure in the background; fire-and-forget, not
//! cancellation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::{CacheError, Result};

enum Flavor {
    /// Reuse the runtime the manager was constructed inside.
    Ambient(Handle),
    /// Private runtime; its workers drive spawned tasks in the background.
    Owned(Runtime),
}

/// Bridge from blocking callers into async cache operations.
///
/// Cheap to clone; all clones share one runtime.
///
/// Blocking through an ambient handle must happen from a thread that is
/// not itself a runtime worker, the same constraint as any
/// `Handle::block_on`. Callers inside an async context should use the
/// async facade directly.
#[derive(Clone)]
pub struct RuntimeBridge {
    flavor: Arc<Flavor>,
}

impl RuntimeBridge {
    /// Pick up the ambient runtime, or start a private one.
    pub fn new() -> Result<Self> {
        let flavor = match Handle::try_current() {
            Ok(handle) => Flavor::Ambient(handle),
            Err(_) => Flavor::Owned(
                Builder::new_multi_thread()
                    .enable_all()
                    .thread_name("coffer-bridge")
                    .build()
                    .map_err(|err| {
                        CacheError::backend(format!("failed to start bridge runtime: {err}"))
                    })?,
            ),
        };
        Ok(Self { flavor: Arc::new(flavor) })
    }

    /// Block the current thread until `future` resolves.
    pub fn block_for<F: Future>(&self, future: F) -> F::Output {
        match self.flavor.as_ref() {
            Flavor::Ambient(handle) => handle.block_on(future),
            Flavor::Owned(runtime) => runtime.block_on(future),
        }
    }

    /// Block until `future` resolves or `timeout` elapses.
    ///
    /// Returns `None` on expiry (and if the task panicked). The spawned
    /// operation is NOT cancelled: it keeps running on the runtime and its
    /// effects (e.g. a populate-on-miss write) still land.
    pub fn block_for_timeout<F>(&self, future: F, timeout: Duration) -> Option<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let task = match self.flavor.as_ref() {
            Flavor::Ambient(handle) => handle.spawn(future),
            Flavor::Owned(runtime) => runtime.spawn(future),
        };
        self.block_for(async move {
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(value)) => Some(value),
                Ok(Err(join_error)) => {
                    tracing::error!(error = %join_error, "bridged operation failed");
                    None
                }
                Err(_elapsed) => None,
            }
        })
    }
}
