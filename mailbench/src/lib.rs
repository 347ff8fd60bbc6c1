//! Measure the throughput of actor mailboxes under a fire-and-forget flood.
//!
//! # Overview
//!
//! A run starts a fixed population of agents, each a single task draining its own unbounded
//! [mailbox::Mailbox]. A [router::Router] then floods those mailboxes with [Message::Unit] load,
//! choosing destinations with a generator seeded by the message count, and finally appends one
//! [Message::Done] sentinel per agent. Every sentinel carries a [completion::Handle] that the
//! agent fulfills when it reaches it, and the driver suspends in [coordinator::await_all] until
//! every handle has been fulfilled. The elapsed wall-clock time between the first routed message
//! and the last fulfilled handle is the measured quantity.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! let elapsed = mailbench::run_benchmark(4, 10_000).unwrap();
//! assert!(elapsed > Duration::ZERO);
//! ```
//!
//! # Status
//!
//! `mailbench` is a measurement tool. Any correctness failure (a lost message, an agent that exits
//! without signaling) aborts the run instead of producing a skewed timing.

use std::time::Duration;
use thiserror::Error;

pub mod agent;
pub mod benchmark;
pub mod completion;
pub mod config;
pub mod coordinator;
pub mod mailbox;
pub mod metrics;
pub mod router;
pub mod runner;

pub use benchmark::{Report, Suite, Summary};
pub use config::{Case, Config};
pub use mailbox::Backend;
pub use metrics::Metrics;
pub use runner::Runner;

/// A message delivered to an agent's mailbox.
#[derive(Debug)]
pub enum Message {
    /// Load with no payload. Interpreting it has no observable effect.
    Unit,

    /// The last message an agent receives from the router.
    ///
    /// The agent fulfills the carried handle when it dequeues this message.
    Done(completion::Handle),
}

impl Message {
    /// Returns true if this is a [Message::Done] sentinel.
    pub fn is_done(&self) -> bool {
        matches!(self, Message::Done(_))
    }
}

/// Errors that can occur when running a benchmark.
#[derive(Debug, Error)]
pub enum Error {
    #[error("agent count must be positive")]
    InvalidAgents,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("mailbox closed: agent={0}")]
    MailboxClosed(usize),
    #[error("agent exited without signaling: agent={0}")]
    AgentFailed(usize),
    #[error("agent panicked: agent={0}")]
    AgentPanicked(usize),
    #[error("completion unobserved: agent={0}")]
    Unobserved(usize),
    #[error("duplicate sentinel: agent={0}")]
    DuplicateSentinel(usize),
    #[error("message loss: routed={routed} processed={processed}")]
    MessageLoss { routed: u64, processed: u64 },
    #[error("timeout")]
    Timeout,
    #[error("runtime failed: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse failed: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// Run a single benchmark on a default runtime and return the elapsed time.
///
/// The clock starts when the first ordinary message is routed and stops once all `agents`
/// completion handles have been fulfilled.
///
/// Destinations are drawn from `0..agents-1`. When `agents == 1` that range is empty and every
/// ordinary message goes to agent 0.
pub fn run_benchmark(agents: usize, messages: u64) -> Result<Duration, Error> {
    if agents == 0 {
        return Err(Error::InvalidAgents);
    }
    let case = Case::new(agents, messages);
    Runner::default().start(async move {
        benchmark::run(&case, &Metrics::default())
            .await
            .map(|report| report.elapsed)
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_benchmark_rejects_zero_agents() {
        assert!(matches!(run_benchmark(0, 10), Err(Error::InvalidAgents)));
    }

    #[test]
    fn test_run_benchmark_completes() {
        for (agents, messages) in [(1, 0), (1, 50), (3, 0), (2, 100), (5, 10_000)] {
            let elapsed = run_benchmark(agents, messages).unwrap();
            assert!(elapsed >= Duration::ZERO);
        }
    }

    #[test]
    fn test_message_is_done() {
        let (handle, _waiter) = completion::channel(0);
        assert!(Message::Done(handle).is_done());
        assert!(!Message::Unit.is_done());
    }
}
