//! Async consumption and writer-side waiting.

use std::pin::pin;

use futures::Stream;
use legman_core::{LegmanError, Message, Phase, Record};

use crate::node::Legman;

impl Legman {
    /// Wait for the next readable record.
    ///
    /// Returns `Ok(None)` once the node has ended and everything it accepted has
    /// been read. Records buffered before a failure are still returned; after
    /// them the failure is reported as `Err`.
    ///
    /// # Errors
    /// The transform failure that stopped the node.
    pub async fn recv(&self) -> Result<Option<Record>, LegmanError> {
        loop {
            let mut notified = pin!(self.inner.readable.notified());
            notified.as_mut().enable();
            {
                let mut st = self.inner.lock();
                if let Some(record) = st.buffer.pop_front() {
                    drop(st);
                    self.inner.pump();
                    return Ok(Some(record));
                }
                match st.phase {
                    Phase::Failed => {
                        return Err(st
                            .error
                            .clone()
                            .unwrap_or_else(|| LegmanError::transform(self.id(), "failed")));
                    }
                    Phase::Ended if st.backlog.is_empty() => return Ok(None),
                    Phase::Open | Phase::Ending | Phase::Ended => {}
                }
            }
            notified.await;
        }
    }

    /// Readable side as a stream. A failure is yielded once, then the stream ends.
    pub fn records(&self) -> impl Stream<Item = Result<Record, LegmanError>> + Send + 'static {
        futures::stream::unfold(Some(self.clone()), |node| async move {
            let node = node?;
            match node.recv().await {
                Ok(Some(record)) => Some((Ok(record), Some(node))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    /// Resolve once the node no longer asks writers to wait, or can no longer
    /// accept writes at all.
    pub async fn drained(&self) {
        loop {
            let mut notified = pin!(self.inner.drained.notified());
            notified.as_mut().enable();
            {
                let st = self.inner.lock();
                if !st.need_drain || st.phase.is_terminal() {
                    return;
                }
            }
            notified.await;
        }
    }

    /// Write one message and wait for a drain when back-pressure is signaled.
    ///
    /// # Errors
    /// Same as [`Legman::write`].
    pub async fn send(&self, message: impl Into<Message>) -> Result<(), LegmanError> {
        if !self.write(message)? {
            self.drained().await;
        }
        Ok(())
    }
}
