//! Single-shot completion signals carried by sentinel messages.
//!
//! A [Handle] is fulfilled at most once (signaling consumes it) and its [Waiter] is observed at
//! most once (waiting consumes it). If a [Handle] is dropped without being signaled, the paired
//! [Waiter] resolves to [Error::AgentFailed].

use crate::Error;
use futures::channel::oneshot;

/// Create a linked [Handle] and [Waiter] for the agent at `agent`.
pub fn channel(agent: usize) -> (Handle, Waiter) {
    let (sender, receiver) = oneshot::channel();
    (Handle { agent, sender }, Waiter { agent, receiver })
}

/// The fulfilling side of a completion signal.
#[derive(Debug)]
pub struct Handle {
    agent: usize,
    sender: oneshot::Sender<()>,
}

impl Handle {
    /// Index of the agent this handle was created for.
    pub fn agent(&self) -> usize {
        self.agent
    }

    /// Fulfill the signal.
    ///
    /// Returns [Error::Unobserved] if the [Waiter] was already dropped.
    pub fn signal(self) -> Result<(), Error> {
        let Self { agent, sender } = self;
        sender.send(()).map_err(|_| Error::Unobserved(agent))
    }
}

/// The observing side of a completion signal.
#[derive(Debug)]
pub struct Waiter {
    agent: usize,
    receiver: oneshot::Receiver<()>,
}

impl Waiter {
    /// Index of the agent expected to fulfill this signal.
    pub fn agent(&self) -> usize {
        self.agent
    }

    /// Suspend until the paired [Handle] is signaled, returning the agent index.
    pub async fn wait(self) -> Result<usize, Error> {
        let Self { agent, receiver } = self;
        receiver.await.map_err(|_| Error::AgentFailed(agent))?;
        Ok(agent)
    }
}
