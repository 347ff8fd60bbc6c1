//! Wait for every agent to fulfill its completion handle.

use crate::{completion::Waiter, Error};
use futures::future::try_join_all;
use std::time::Duration;
use tracing::debug;

/// Suspend until every waiter has been signaled, in any order.
///
/// Fails with [Error::AgentFailed] as soon as any handle is dropped without being signaled.
pub async fn await_all(waiters: Vec<Waiter>) -> Result<(), Error> {
    let signaled = try_join_all(waiters.into_iter().map(Waiter::wait)).await?;
    debug!(agents = signaled.len(), "all agents signaled");
    Ok(())
}

/// Like [await_all], but gives up with [Error::Timeout] after `timeout`.
pub async fn await_all_timeout(waiters: Vec<Waiter>, timeout: Duration) -> Result<(), Error> {
    tokio::time::timeout(timeout, await_all(waiters))
        .await
        .map_err(|_| Error::Timeout)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion;
    use futures::FutureExt;

    #[test]
    fn test_returns_only_after_all_signaled() {
        let (handles, waiters): (Vec<_>, Vec<_>) = (0..4).map(completion::channel).unzip();
        let mut all = Box::pin(await_all(waiters));

        // Signal out of order
        let mut handles = handles.into_iter().rev();
        for handle in handles.by_ref().take(3) {
            handle.signal().unwrap();
            assert!((&mut all).now_or_never().is_none());
        }
        handles.next().unwrap().signal().unwrap();
        assert!(all.now_or_never().unwrap().is_ok());
    }

    #[test]
    fn test_empty_set_is_ready() {
        assert!(await_all(Vec::new()).now_or_never().unwrap().is_ok());
    }

    #[test]
    fn test_fails_fast_on_dropped_handle() {
        let (mut handles, waiters): (Vec<_>, Vec<_>) = (0..3).map(completion::channel).unzip();
        drop(handles.remove(1));
        let result = await_all(waiters).now_or_never().unwrap();
        assert!(matches!(result, Err(Error::AgentFailed(1))));
    }

    #[test]
    fn test_timeout() {
        let runtime = tokio::runtime::Runtime::new().expect("runtime should build");
        runtime.block_on(async move {
            let (_handle, waiter) = completion::channel(0);
            let result = await_all_timeout(vec![waiter], Duration::from_millis(10)).await;
            assert!(matches!(result, Err(Error::Timeout)));

            let (handle, waiter) = completion::channel(0);
            handle.signal().unwrap();
            assert!(await_all_timeout(vec![waiter], Duration::from_secs(5))
                .await
                .is_ok());
        });
    }
}
