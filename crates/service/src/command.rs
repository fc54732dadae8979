//! Utilities relating to "command worker" services.

use std::fmt;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::warn;

use crate::errors::ServiceError;

/// Handle to send inputs to a command worker service.
///
/// This is essentially just a wrapper over a MPSC sender, but with some
/// convenience functions for common patterns.  It's expected that an instance
/// of this type will be used inside of a handle type for the particular
/// service, like [`crate::SpiHandle`].
#[derive(Debug)]
pub struct CommandHandle<M> {
    tx: mpsc::Sender<M>,
}

// Derived `Clone` would require `M: Clone`.
impl<M> Clone for CommandHandle<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M> CommandHandle<M> {
    /// Constructs a new instance.
    pub(crate) fn new(tx: mpsc::Sender<M>) -> Self {
        Self { tx }
    }

    /// Returns the number of pending inputs that have not been processed yet as
    /// of the moment of calling.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Sends a message on the channel and returns immediately.
    pub async fn send(&self, m: M) -> Result<(), ServiceError> {
        self.tx
            .send(m)
            .await
            .map_err(|_| ServiceError::WorkerExited)
    }

    /// Sends a message on the channel and returns immediately.
    ///
    /// Must not be called from inside an async runtime.
    pub fn send_blocking(&self, m: M) -> Result<(), ServiceError> {
        self.tx
            .blocking_send(m)
            .map_err(|_| ServiceError::WorkerExited)
    }

    /// Accepts a message constructor accepting a callback sender, sends the
    /// message, and then waits for a response.
    pub async fn send_and_wait<R>(
        &self,
        mfn: impl FnOnce(CommandCompletionSender<R>) -> M,
    ) -> Result<R, ServiceError> {
        let (ret_tx, ret_rx) = oneshot::channel();
        self.send(mfn(CommandCompletionSender::new(ret_tx))).await?;
        ret_rx
            .await
            .map_err(|_| ServiceError::WorkerExitedWithoutResponse)
    }

    /// Accepts a message constructor accepting a callback sender, sends the
    /// message, and then waits for a response.
    ///
    /// Must not be called from inside an async runtime.
    pub fn send_and_wait_blocking<R>(
        &self,
        mfn: impl FnOnce(CommandCompletionSender<R>) -> M,
    ) -> Result<R, ServiceError> {
        let (ret_tx, ret_rx) = oneshot::channel();
        self.send_blocking(mfn(CommandCompletionSender::new(ret_tx)))?;
        ret_rx
            .blocking_recv()
            .map_err(|_| ServiceError::WorkerExitedWithoutResponse)
    }
}

/// A wrapper around a [`oneshot::Sender`] to allow it to be shared but only
/// completed once.
pub struct CommandCompletionSender<T> {
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> CommandCompletionSender<T> {
    /// Creates a new instance.
    pub fn new(sender: oneshot::Sender<T>) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Send the response.  Logs a warning if the sender has already been
    /// consumed.
    pub async fn send(&self, value: T) {
        let sender = self.sender.lock().await.take();
        complete(sender, value);
    }

    /// Send the response.  Logs a warning if the sender has already been
    /// consumed.
    pub fn send_blocking(&self, value: T) {
        let sender = self.sender.blocking_lock().take();
        complete(sender, value);
    }
}

fn complete<T>(sender: Option<oneshot::Sender<T>>, value: T) {
    match sender {
        // The caller may have stopped waiting, nothing to do then.
        Some(sender) => {
            let _ = sender.send(value);
        }
        None => warn!("attempted to complete an already completed command"),
    }
}

impl<T> fmt::Debug for CommandCompletionSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<completion>")
    }
}
