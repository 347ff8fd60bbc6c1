//! Sequential consumers of a single mailbox.
//!
//! An [Agent] dequeues one message at a time and never interleaves its own processing. It moves
//! from running to signaled when it interprets its [Message::Done] sentinel, and keeps draining
//! until every producer of its mailbox is gone.

use crate::{mailbox::Inbox, Error, Message, Metrics};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

/// What an agent observed over its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Index of the agent.
    pub index: usize,

    /// Number of [Message::Unit] messages processed.
    pub units: u64,

    /// Number of [Message::Unit] messages processed before the sentinel, if it was seen.
    pub units_at_signal: Option<u64>,
}

impl Report {
    /// Returns true if the agent fulfilled its completion handle.
    pub fn signaled(&self) -> bool {
        self.units_at_signal.is_some()
    }
}

/// A sequential processing loop over one [Inbox].
pub struct Agent {
    inbox: Inbox,
    metrics: Metrics,
    report: Report,
}

impl Agent {
    /// Create an agent that consumes the given inbox.
    pub fn new(inbox: Inbox, metrics: Metrics) -> Self {
        let report = Report {
            index: inbox.agent(),
            ..Default::default()
        };
        Self {
            inbox,
            metrics,
            report,
        }
    }

    /// Spawn the processing loop onto the current runtime.
    ///
    /// The inbox buffers anything enqueued before the task is first polled, so the agent is
    /// started as far as producers are concerned once this returns.
    pub fn start(self) -> JoinHandle<Result<Report, Error>> {
        tokio::spawn(self.run())
    }

    /// Process messages until the mailbox is closed and empty.
    pub async fn run(mut self) -> Result<Report, Error> {
        let index = self.report.index;
        debug!(agent = index, "started");
        while let Some(message) = self.inbox.dequeue().await {
            if let Err(err) = self.interpret(message) {
                error!(agent = index, ?err, "interpret failed");
                self.metrics.processed.inc_by(self.report.units);
                return Err(err);
            }
        }
        self.metrics.processed.inc_by(self.report.units);
        debug!(agent = index, units = self.report.units, "stopped");
        Ok(self.report)
    }

    fn interpret(&mut self, message: Message) -> Result<(), Error> {
        match message {
            Message::Unit => {
                self.report.units += 1;
            }
            Message::Done(handle) => {
                if self.report.signaled() {
                    return Err(Error::DuplicateSentinel(self.report.index));
                }
                handle.signal()?;
                self.report.units_at_signal = Some(self.report.units);
                self.metrics.signaled.inc();
                trace!(agent = self.report.index, units = self.report.units, "signaled");
            }
        }
        Ok(())
    }
}
