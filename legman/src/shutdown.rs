//! Ending nodes: plain end, end with a final message, and raw stream finish.

use legman_core::{LegmanError, Message, Phase};

use crate::node::Legman;

impl Legman {
    /// End the node.
    ///
    /// Behavior and trade-offs:
    /// - Severs every outgoing pipe first, so nodes downstream are never ended by
    ///   this call. Ending an influx node leaves its base node open.
    /// - Later writes fail with `WriteAfterEnd`.
    /// - Messages already accepted still pass the transform and stay readable by
    ///   direct consumers until read. Once they are gone, `recv` yields `None`.
    /// - Idempotent. On a failed node it only severs the pipes.
    pub fn end(&self) {
        {
            let mut st = self.inner.lock();
            st.outputs.clear();
            st.awaiting.clear();
            st.close_when_drained = false;
            if st.phase != Phase::Failed {
                st.phase = Phase::Ended;
            }
        }
        tracing::debug!(node = %self.id(), "ended");
        self.inner.pump();
        self.inner.drained.notify_waiters();
    }

    /// End the writable side without severing pipes.
    ///
    /// This is the plain end-of-stream of the underlying primitive: once the
    /// remaining records have been delivered, every node still piped from this one
    /// receives `end()` as well.
    pub fn finish(&self) {
        {
            let mut st = self.inner.lock();
            st.close_when_drained = false;
            if !st.phase.is_terminal() {
                st.phase = Phase::Ended;
            }
        }
        tracing::debug!(node = %self.id(), "finished");
        self.inner.pump();
        self.inner.drained.notify_waiters();
    }

    /// Accept `message` as the last write and move the node to `Ending`.
    ///
    /// # Errors
    /// Same as [`Legman::write`].
    pub fn enqueue_final(&self, message: impl Into<Message>) -> Result<bool, LegmanError> {
        self.inner.accept(message.into(), None, true)
    }

    /// Close the node once its final message has passed the transform.
    ///
    /// On an open node this is [`Legman::end`]. On an ending node the close is
    /// deferred until the backlog is empty; the final record is then delivered to
    /// the pipes that exist at that moment (unless one of them is back-pressured),
    /// after which the pipes are severed without ending their destinations.
    pub fn close_after_drain(&self) {
        let phase = {
            let mut st = self.inner.lock();
            if st.phase == Phase::Ending {
                st.close_when_drained = true;
            }
            st.phase
        };
        match phase {
            Phase::Open => self.end(),
            Phase::Ending => self.inner.pump(),
            Phase::Ended | Phase::Failed => {}
        }
    }

    /// Write `message` as the final record, then close.
    ///
    /// The message is fully processed before the node closes, so an influx node
    /// ended this way still forwards it to its base node.
    ///
    /// # Errors
    /// Same as [`Legman::write`]; nothing is closed when the write is rejected.
    pub fn end_with(&self, message: impl Into<Message>) -> Result<(), LegmanError> {
        self.enqueue_final(message)?;
        self.close_after_drain();
        Ok(())
    }
}
