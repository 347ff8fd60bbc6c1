//! Drive benchmarks on a multi-threaded [tokio] runtime.

use crate::Error;
use std::future::Future;
use tokio::runtime::Builder;

/// Configuration for the [Runner].
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of worker threads agents are scheduled on.
    pub worker_threads: usize,
}

impl Config {
    /// Returns a new [Config] with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        let worker_threads = std::thread::available_parallelism()
            .map(|threads| threads.get())
            .unwrap_or(2);
        Self { worker_threads }
    }
}

/// Builds a fresh runtime for each call to [Runner::start].
pub struct Runner {
    cfg: Config,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Runner {
    /// Initialize a new runner with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Run `future` to completion on a new runtime.
    ///
    /// The runtime (and any agent still parked on it) is torn down before returning.
    pub fn start<F>(self, future: F) -> Result<F::Output, Error>
    where
        F: Future,
    {
        if self.cfg.worker_threads == 0 {
            return Err(Error::InvalidConfig("worker_threads must be positive"));
        }
        let runtime = Builder::new_multi_thread()
            .worker_threads(self.cfg.worker_threads)
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;
        Ok(runtime.block_on(future))
    }
}

impl From<Config> for Runner {
    fn from(cfg: Config) -> Self {
        Self::new(cfg)
    }
}
