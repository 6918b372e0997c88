//! Fire-and-forget outbound calls.
//!
//! All order-flow actions (cancel, modify, send) are one-way RPCs with no
//! local rollback; failures are logged with any server metadata at the
//! point of occurrence and never propagate into entity state.

use std::future::Future;
use tms_remote::{log_remote_failure, RemoteResult};

/// Run an RPC future on the runtime, logging any failure under `context`.
pub fn fire_and_forget<F>(context: &'static str, call: F)
where
    F: Future<Output = RemoteResult<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = call.await {
            log_remote_failure(context, &err);
        }
    });
}
