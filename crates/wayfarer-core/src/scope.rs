//! Mounted-view guard
//!
//! A view opens a [`ViewScope`] when it appears and drops it when it goes
//! away. Work started from the view holds a [`ScopeHandle`]; results that
//! arrive after the scope closed are discarded instead of applied.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Lifetime of one mounted view. Dropping it closes the scope.
#[derive(Debug, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    /// Handle for in-flight work started by this view
    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            token: self.token.clone(),
        }
    }

    /// Run `work`, returning `None` if the scope closes first
    pub async fn run<F: Future>(&self, work: F) -> Option<F::Output> {
        self.handle().run(work).await
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Cheap clone of a scope's liveness
#[derive(Debug, Clone)]
pub struct ScopeHandle {
    token: CancellationToken,
}

impl ScopeHandle {
    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Apply a late result only while the view is still mounted
    pub fn apply<T>(&self, value: T, apply: impl FnOnce(T)) -> bool {
        if !self.is_live() {
            trace!("Discarding result for closed view");
            return false;
        }
        apply(value);
        true
    }

    pub async fn run<F: Future>(&self, work: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            output = work => Some(output),
        }
    }

    /// Resolves when the scope closes
    pub async fn closed(&self) {
        self.token.cancelled().await
    }
}
