use crate::{mailbox::Backend, runner, Error};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// A single benchmark run: how many agents, how much load, and on which mailbox backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Case {
    /// Number of agents (and mailboxes).
    pub agents: usize,

    /// Number of ordinary messages to route.
    pub messages: u64,

    /// Channel implementation backing every mailbox.
    pub backend: Backend,

    /// Bound on how long to wait for all agents to signal.
    ///
    /// Not part of the measured contract: it only keeps a broken run from hanging.
    pub timeout: Option<Duration>,
}

impl Case {
    /// Create a case on the default backend with no timeout.
    pub fn new(agents: usize, messages: u64) -> Self {
        Self {
            agents,
            messages,
            backend: Backend::default(),
            timeout: None,
        }
    }

    /// Set the mailbox backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Set the completion timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Configuration for a [crate::Suite].
///
/// Every combination of `agents` and `messages` is a case. Each case is run `warmup` times
/// without being recorded and then `iterations` times.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agents: Vec<usize>,
    pub messages: Vec<u64>,
    pub backend: Backend,
    pub worker_threads: usize,
    pub warmup: usize,
    pub iterations: usize,
    pub timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agents: vec![100],
            messages: vec![1_000_000],
            backend: Backend::default(),
            worker_threads: runner::Config::default().worker_threads,
            warmup: 1,
            iterations: 5,
            timeout_ms: None,
        }
    }
}

impl Config {
    /// Read a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse a YAML configuration. Missing fields take their default value.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Reject configurations that cannot produce a valid run.
    pub fn validate(&self) -> Result<(), Error> {
        if self.agents.is_empty() {
            return Err(Error::InvalidConfig("agents must not be empty"));
        }
        if self.agents.contains(&0) {
            return Err(Error::InvalidAgents);
        }
        if self.messages.is_empty() {
            return Err(Error::InvalidConfig("messages must not be empty"));
        }
        if self.iterations == 0 {
            return Err(Error::InvalidConfig("iterations must be positive"));
        }
        if self.worker_threads == 0 {
            return Err(Error::InvalidConfig("worker_threads must be positive"));
        }
        if self.timeout_ms == Some(0) {
            return Err(Error::InvalidConfig("timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Bound on how long each run may wait for its agents.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Configuration for the runtime the suite executes on.
    pub fn runtime(&self) -> runner::Config {
        runner::Config::new().with_worker_threads(self.worker_threads)
    }

    /// Every case described by this configuration, agents-major.
    pub fn cases(&self) -> impl Iterator<Item = Case> + '_ {
        self.agents.iter().flat_map(move |&agents| {
            self.messages.iter().map(move |&messages| Case {
                agents,
                messages,
                backend: self.backend,
                timeout: self.timeout(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial() {
        let cfg = Config::parse(
            r#"
agents: [1, 10]
messages: [0, 1000]
backend: tokio
timeout_ms: 5000
"#,
        )
        .unwrap();
        assert_eq!(cfg.agents, vec![1, 10]);
        assert_eq!(cfg.backend, Backend::Tokio);
        assert_eq!(cfg.iterations, Config::default().iterations);
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(5)));
        cfg.validate().unwrap();

        let cases: Vec<_> = cfg.cases().collect();
        assert_eq!(cases.len(), 4);
        assert_eq!(
            cases[1],
            Case::new(1, 1000)
                .with_backend(Backend::Tokio)
                .with_timeout(Duration::from_secs(5))
        );
        assert_eq!((cases[2].agents, cases[2].messages), (10, 0));
    }

    #[test]
    fn test_parse_rejects_unknown_backend() {
        assert!(matches!(
            Config::parse("backend: crossbeam"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validate() {
        Config::default().validate().unwrap();

        let cfg = Config {
            agents: vec![4, 0],
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidAgents)));

        for cfg in [
            Config {
                agents: Vec::new(),
                ..Default::default()
            },
            Config {
                messages: Vec::new(),
                ..Default::default()
            },
            Config {
                iterations: 0,
                ..Default::default()
            },
            Config {
                worker_threads: 0,
                ..Default::default()
            },
            Config {
                timeout_ms: Some(0),
                ..Default::default()
            },
        ] {
            assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/mailbench.yaml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
