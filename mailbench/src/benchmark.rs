//! Run benchmark cases and summarize their timings.

use crate::{
    agent::{self, Agent},
    coordinator, mailbox,
    router::Router,
    Case, Config, Error, Metrics, Runner,
};
use std::{
    fmt,
    time::{Duration, Instant},
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Outcome of a single run.
#[derive(Clone, Debug)]
pub struct Report {
    /// Time from the first routed message until every agent signaled.
    pub elapsed: Duration,

    /// Number of ordinary messages the router enqueued.
    pub routed: u64,

    /// Per-agent observations, ordered by agent index.
    pub agents: Vec<agent::Report>,
}

impl Report {
    /// Number of ordinary messages dequeued across all agents.
    pub fn processed(&self) -> u64 {
        self.agents.iter().map(|report| report.units).sum()
    }

    /// Number of messages dequeued across all agents, sentinels included.
    pub fn total_processed(&self) -> u64 {
        self.processed() + self.agents.len() as u64
    }
}

/// Execute one case on the current runtime.
///
/// Every agent is started before any message is routed. Timing stops once all completion handles
/// are fulfilled, after which the agents are joined to verify that nothing was lost.
///
/// If routing or waiting fails, the agents are joined and the first agent error (or panic) is
/// returned in place of the error the driver observed.
pub async fn run(case: &Case, metrics: &Metrics) -> Result<Report, Error> {
    if case.agents == 0 {
        return Err(Error::InvalidAgents);
    }

    // Start agents
    let mut mailboxes = Vec::with_capacity(case.agents);
    let mut agents = Vec::with_capacity(case.agents);
    for index in 0..case.agents {
        let (mailbox, inbox) = mailbox::unbounded(index, case.backend);
        agents.push(Agent::new(inbox, metrics.clone()).start());
        mailboxes.push(mailbox);
    }
    let router = Router::new(mailboxes, metrics.clone())?;

    // Flood, seal, and wait
    let start = Instant::now();
    let outcome = async move {
        let routed = router.route(case.messages)?;
        let waiters = router.seal()?;
        match case.timeout {
            Some(timeout) => coordinator::await_all_timeout(waiters, timeout).await?,
            None => coordinator::await_all(waiters).await?,
        }
        Ok::<_, Error>(routed)
    }
    .await;
    let elapsed = start.elapsed();
    let routed = match outcome {
        Ok(routed) => routed,
        Err(err) => return Err(abort(agents, err).await),
    };

    // Join agents
    let mut reports = Vec::with_capacity(agents.len());
    for (index, agent) in agents.into_iter().enumerate() {
        let report = agent.await.map_err(|_| Error::AgentPanicked(index))??;
        if !report.signaled() {
            return Err(Error::AgentFailed(index));
        }
        reports.push(report);
    }
    let report = Report {
        elapsed,
        routed,
        agents: reports,
    };
    let processed = report.processed();
    if processed != routed {
        return Err(Error::MessageLoss { routed, processed });
    }

    metrics.runs.inc();
    debug!(
        agents = case.agents,
        messages = case.messages,
        ?elapsed,
        "run complete"
    );
    Ok(report)
}

/// Resolve the error for a failed run.
///
/// Every mailbox has been released by this point, so agents that are still alive drain and exit.
/// A timeout is returned as is since joining could block on the agent that never finished.
async fn abort(agents: Vec<JoinHandle<Result<agent::Report, Error>>>, err: Error) -> Error {
    if matches!(err, Error::Timeout) {
        return err;
    }
    for (index, agent) in agents.into_iter().enumerate() {
        match agent.await {
            Ok(Ok(_)) => {}
            Ok(Err(agent_err)) => return agent_err,
            Err(_) => return Error::AgentPanicked(index),
        }
    }
    err
}

/// Timings collected for one case.
#[derive(Clone, Debug)]
pub struct Summary {
    pub case: Case,
    pub routed: u64,
    pub samples: Vec<Duration>,
}

impl Summary {
    /// Mean of all samples.
    pub fn mean(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.samples.iter().sum();
        total / u32::try_from(self.samples.len()).unwrap_or(u32::MAX)
    }

    /// Fastest sample.
    pub fn min(&self) -> Duration {
        self.samples.iter().min().copied().unwrap_or_default()
    }

    /// Slowest sample.
    pub fn max(&self) -> Duration {
        self.samples.iter().max().copied().unwrap_or_default()
    }

    /// Population standard deviation of all samples.
    pub fn std_dev(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let mean = self.mean().as_secs_f64();
        let variance = self
            .samples
            .iter()
            .map(|sample| (sample.as_secs_f64() - mean).powi(2))
            .sum::<f64>()
            / self.samples.len() as f64;
        Duration::from_secs_f64(variance.sqrt())
    }

    /// Ordinary messages processed per second, based on the mean.
    pub fn throughput(&self) -> f64 {
        let mean = self.mean().as_secs_f64();
        if mean == 0.0 {
            return 0.0;
        }
        self.routed as f64 / mean
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "backend={} agents={} messages={} samples={} mean={:?} min={:?} max={:?} std_dev={:?} throughput={:.0}/s",
            self.case.backend,
            self.case.agents,
            self.case.messages,
            self.samples.len(),
            self.mean(),
            self.min(),
            self.max(),
            self.std_dev(),
            self.throughput(),
        )
    }
}

/// Every case of a [Config], with warmup and repeated measurement.
pub struct Suite {
    config: Config,
    metrics: Metrics,
}

impl Suite {
    /// Create a suite, rejecting invalid configurations before anything runs.
    pub fn new(config: Config, metrics: Metrics) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config, metrics })
    }

    /// Run every case on the current runtime.
    ///
    /// Warmup runs do not update the suite's metrics. The first failing run aborts the suite.
    pub async fn run(&self) -> Result<Vec<Summary>, Error> {
        let mut summaries = Vec::new();
        for case in self.config.cases() {
            let warmup = Metrics::default();
            for _ in 0..self.config.warmup {
                run(&case, &warmup).await.inspect_err(|err| {
                    error!(?err, agents = case.agents, messages = case.messages, "warmup aborted")
                })?;
            }

            let mut samples = Vec::with_capacity(self.config.iterations);
            let mut routed = 0;
            for _ in 0..self.config.iterations {
                let report = run(&case, &self.metrics).await.inspect_err(|err| {
                    error!(?err, agents = case.agents, messages = case.messages, "run aborted")
                })?;
                routed = report.routed;
                samples.push(report.elapsed);
            }

            let summary = Summary {
                case,
                routed,
                samples,
            };
            info!(
                backend = %summary.case.backend,
                agents = summary.case.agents,
                messages = summary.case.messages,
                mean = ?summary.mean(),
                throughput = summary.throughput(),
                "case complete"
            );
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// Run every case on a new runtime configured by the suite.
    pub fn start(self) -> Result<Vec<Summary>, Error> {
        let runner = Runner::new(self.config.runtime());
        runner.start(async move { self.run().await })?
    }
}
