//! Distribute ordinary load across mailboxes, then seal each one with a sentinel.
//!
//! Destinations are drawn from a [StdRng] seeded with the number of ordinary messages, so the same
//! message count always yields the same sequence of destinations. Draws cover `0..agents-1`: the
//! last agent never receives ordinary load, only its sentinel. With a single agent that range is
//! empty, so it is clamped to `{0}` and every ordinary message goes to agent 0.

use crate::{
    completion::{self, Waiter},
    mailbox::Mailbox,
    Error, Message, Metrics,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, warn};

/// Seed used to route `messages` ordinary messages.
pub fn seed(messages: u64) -> u64 {
    messages
}

/// The deterministic sequence of destination indices for a run.
///
/// Yields `messages` indices in `0..agents-1`. When that range is empty (a single agent), every
/// index is 0. Yields nothing when there are no agents at all.
pub fn destinations(agents: usize, messages: u64) -> Destinations {
    let bound = agents.saturating_sub(1);
    let remaining = if agents == 0 { 0 } else { messages };
    Destinations {
        rng: StdRng::seed_from_u64(seed(messages)),
        bound,
        remaining,
    }
}

/// Iterator returned by [destinations].
pub struct Destinations {
    rng: StdRng,
    bound: usize,
    remaining: u64,
}

impl Iterator for Destinations {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if self.bound == 0 {
            return Some(0);
        }
        Some(self.rng.gen_range(0..self.bound))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, usize::try_from(self.remaining).ok())
    }
}

/// Producer for every agent's mailbox.
pub struct Router {
    mailboxes: Vec<Mailbox>,
    metrics: Metrics,
}

impl Router {
    /// Create a router over the mailboxes of already started agents.
    ///
    /// Mailboxes must be ordered by agent index.
    pub fn new(mailboxes: Vec<Mailbox>, metrics: Metrics) -> Result<Self, Error> {
        if mailboxes.is_empty() {
            return Err(Error::InvalidAgents);
        }
        debug_assert!(mailboxes
            .iter()
            .enumerate()
            .all(|(index, mailbox)| mailbox.agent() == index));
        Ok(Self { mailboxes, metrics })
    }

    /// Number of agents served by this router.
    pub fn agents(&self) -> usize {
        self.mailboxes.len()
    }

    /// Enqueue `messages` ordinary messages, returning how many were routed.
    pub fn route(&self, messages: u64) -> Result<u64, Error> {
        let agents = self.agents();
        if agents == 1 && messages > 0 {
            warn!(
                messages,
                "destination range empty with a single agent, clamping to agent 0"
            );
        }

        let mut routed = 0;
        for destination in destinations(agents, messages) {
            self.mailboxes[destination].enqueue(Message::Unit)?;
            routed += 1;
        }
        self.metrics.routed.inc_by(routed);
        debug!(agents, routed, "routed ordinary messages");
        Ok(routed)
    }

    /// Enqueue one sentinel per agent and release every mailbox.
    ///
    /// Returns the waiters for each agent's completion, ordered by agent index. Once the router is
    /// consumed, agents stop after draining their mailboxes.
    pub fn seal(self) -> Result<Vec<Waiter>, Error> {
        let mut waiters = Vec::with_capacity(self.mailboxes.len());
        for mailbox in &self.mailboxes {
            let (handle, waiter) = completion::channel(mailbox.agent());
            mailbox.enqueue(Message::Done(handle))?;
            waiters.push(waiter);
        }
        debug!(agents = waiters.len(), "sealed mailboxes");
        Ok(waiters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mailbox, Backend};
    use futures::FutureExt;

    fn drain(inbox: &mut mailbox::Inbox) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Some(Some(message)) = inbox.dequeue().now_or_never() {
            messages.push(message);
        }
        messages
    }

    #[test]
    fn test_destinations_reproducible() {
        let first: Vec<_> = destinations(8, 1_000).collect();
        let second: Vec<_> = destinations(8, 1_000).collect();
        assert_eq!(first.len(), 1_000);
        assert_eq!(first, second);
    }

    #[test]
    fn test_destinations_exclude_last_agent() {
        assert!(destinations(5, 10_000).all(|destination| destination < 4));
        assert!(destinations(2, 100).all(|destination| destination == 0));
    }

    #[test]
    fn test_destinations_clamped_for_single_agent() {
        assert_eq!(destinations(1, 1_000).count(), 1_000);
        assert!(destinations(1, 1_000).all(|destination| destination == 0));
        assert_eq!(destinations(1, 1_000).size_hint(), (1_000, Some(1_000)));
        assert_eq!(destinations(1, 0).count(), 0);
        assert_eq!(destinations(0, 1_000).count(), 0);
        assert_eq!(destinations(4, 0).count(), 0);
    }

    #[test]
    fn test_rejects_no_mailboxes() {
        assert!(matches!(
            Router::new(Vec::new(), Metrics::default()),
            Err(Error::InvalidAgents)
        ));
    }

    #[test]
    fn test_route_then_seal() {
        let metrics = Metrics::default();
        let (mailboxes, mut inboxes): (Vec<_>, Vec<_>) = (0..3)
            .map(|index| mailbox::unbounded(index, Backend::Futures))
            .unzip();
        let router = Router::new(mailboxes, metrics.clone()).unwrap();
        assert_eq!(router.route(300).unwrap(), 300);
        let waiters = router.seal().unwrap();
        assert_eq!(
            waiters.iter().map(Waiter::agent).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(metrics.routed.get(), 300);

        let mut expected = [0u64; 3];
        for destination in destinations(3, 300) {
            expected[destination] += 1;
        }
        for (index, inbox) in inboxes.iter_mut().enumerate() {
            let messages = drain(inbox);
            let (last, units) = messages.split_last().unwrap();
            assert!(last.is_done());
            assert!(units.iter().all(|message| !message.is_done()));
            assert_eq!(units.len() as u64, expected[index]);
        }
        assert_eq!(expected[2], 0);

        // Every producer was released by seal
        for inbox in inboxes.iter_mut() {
            assert!(matches!(inbox.dequeue().now_or_never(), Some(None)));
        }
    }

    #[test]
    fn test_single_agent_receives_all_load() {
        let (mailbox, mut inbox) = mailbox::unbounded(0, Backend::Tokio);
        let router = Router::new(vec![mailbox], Metrics::default()).unwrap();
        assert_eq!(router.route(1_000).unwrap(), 1_000);
        let waiters = router.seal().unwrap();
        assert_eq!(waiters.len(), 1);

        let messages = drain(&mut inbox);
        let (last, units) = messages.split_last().unwrap();
        assert!(last.is_done());
        assert_eq!(units.len(), 1_000);
        assert!(units.iter().all(|message| !message.is_done()));
    }

    #[test]
    fn test_route_to_closed_mailbox() {
        let (mailbox, inbox) = mailbox::unbounded(0, Backend::Futures);
        let (other, _other_inbox) = mailbox::unbounded(1, Backend::Futures);
        drop(inbox);
        let router = Router::new(vec![mailbox, other], Metrics::default()).unwrap();
        assert!(matches!(router.route(10), Err(Error::MailboxClosed(0))));
    }
}
