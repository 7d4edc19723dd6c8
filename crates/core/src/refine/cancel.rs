//! Cooperative cancellation for refinement runs.

use std::future::Future;

use tokio::sync::watch;

use crate::model::RefineError;

/// Create a linked handle/token pair
pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelToken { receiver })
}

#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

#[derive(Clone, Debug)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token nobody can cancel
    pub fn never() -> Self {
        let (_, token) = cancellation();
        token
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancelled; never resolves if the handle is dropped first
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        let cancelled = receiver.wait_for(|&cancelled| cancelled).await.is_ok();
        if !cancelled {
            std::future::pending::<()>().await;
        }
    }

    /// Run `future` unless cancellation comes first
    pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output, RefineError> {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(RefineError::Cancelled),
            output = future => Ok(output),
        }
    }
}
