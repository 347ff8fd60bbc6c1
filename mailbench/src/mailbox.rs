//! Unbounded, multi-producer, single-consumer mailboxes.
//!
//! Each agent owns exactly one [Inbox]. Any number of cloned [Mailbox] endpoints may enqueue into
//! it concurrently without ever blocking. Delivery is FIFO per mailbox, and nothing is guaranteed
//! across mailboxes.
//!
//! Two channel implementations are available (see [Backend]) so the same workload can be measured
//! on either.

use crate::{Error, Message};
use futures::{channel::mpsc as futures_mpsc, StreamExt};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tokio::sync::mpsc as tokio_mpsc;

/// Channel implementation backing a mailbox.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// `futures::channel::mpsc::unbounded`.
    #[default]
    Futures,
    /// `tokio::sync::mpsc::unbounded_channel`.
    Tokio,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Futures => f.write_str("futures"),
            Backend::Tokio => f.write_str("tokio"),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "futures" => Ok(Backend::Futures),
            "tokio" => Ok(Backend::Tokio),
            _ => Err(Error::InvalidConfig("backend must be one of: futures, tokio")),
        }
    }
}

/// Create the mailbox for the agent at `agent` on the given backend.
pub fn unbounded(agent: usize, backend: Backend) -> (Mailbox, Inbox) {
    let (sender, receiver) = match backend {
        Backend::Futures => {
            let (tx, rx) = futures_mpsc::unbounded();
            (Sender::Futures(tx), Receiver::Futures(rx))
        }
        Backend::Tokio => {
            let (tx, rx) = tokio_mpsc::unbounded_channel();
            (Sender::Tokio(tx), Receiver::Tokio(rx))
        }
    };
    (Mailbox { agent, sender }, Inbox { agent, receiver })
}

#[derive(Clone)]
enum Sender {
    Futures(futures_mpsc::UnboundedSender<Message>),
    Tokio(tokio_mpsc::UnboundedSender<Message>),
}

enum Receiver {
    Futures(futures_mpsc::UnboundedReceiver<Message>),
    Tokio(tokio_mpsc::UnboundedReceiver<Message>),
}

/// Producer endpoint of an agent's mailbox.
///
/// Cloning yields another producer for the same mailbox. Once every producer is dropped, the
/// owning agent drains what remains and stops.
#[derive(Clone)]
pub struct Mailbox {
    agent: usize,
    sender: Sender,
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

impl Mailbox {
    /// Index of the agent that consumes this mailbox.
    pub fn agent(&self) -> usize {
        self.agent
    }

    /// Append a message to the tail of the mailbox.
    ///
    /// Never blocks. Returns [Error::MailboxClosed] if the agent is no longer receiving.
    pub fn enqueue(&self, message: Message) -> Result<(), Error> {
        let sent = match &self.sender {
            Sender::Futures(tx) => tx.unbounded_send(message).is_ok(),
            Sender::Tokio(tx) => tx.send(message).is_ok(),
        };
        if !sent {
            return Err(Error::MailboxClosed(self.agent));
        }
        Ok(())
    }
}

/// Consumer endpoint of an agent's mailbox.
pub struct Inbox {
    agent: usize,
    receiver: Receiver,
}

impl fmt::Debug for Inbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inbox")
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

impl Inbox {
    /// Index of the agent that owns this inbox.
    pub fn agent(&self) -> usize {
        self.agent
    }

    /// Remove and return the head of the mailbox, suspending while it is empty.
    ///
    /// Returns `None` once the mailbox is empty and every [Mailbox] has been dropped.
    pub async fn dequeue(&mut self) -> Option<Message> {
        match &mut self.receiver {
            Receiver::Futures(rx) => rx.next().await,
            Receiver::Tokio(rx) => rx.recv().await,
        }
    }
}
