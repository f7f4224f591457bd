//! Concurrent execution of independent collection actions.

use anyhow::anyhow;
use futures::future::{self, BoxFuture};
use log::debug;

use crate::error::AggregateError;

/// A deferred unit of collection work.
pub type Action = BoxFuture<'static, anyhow::Result<()>>;

/// Run every action on its own task and wait for all of them.
///
/// No failure cancels or skips another action. The result is an error iff at
/// least one action failed, and then it carries every failure.
pub async fn aggregate_concurrent(actions: Vec<Action>) -> Result<(), AggregateError> {
    debug!("Running {} action(s) concurrently", actions.len());

    let handles: Vec<_> = actions.into_iter().map(tokio::spawn).collect();
    let errors = future::join_all(handles)
        .await
        .into_iter()
        .filter_map(|joined| match joined {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(join_err) => Some(anyhow!("collection action did not complete: {}", join_err)),
        });

    match AggregateError::from_errors(errors) {
        Some(agg) => Err(agg),
        None => Ok(()),
    }
}
