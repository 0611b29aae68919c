//! Background lease renewal.
//!
//! Leases on files opened for writing expire unless the client renews them.
//! The renewer sleeps for the configured interval, issues `renewLease`, and
//! repeats until cancelled. Failures are logged and counted, never surfaced
//! to callers.

use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};

use libhdfsproto::hdfs::RenewLeaseRequestProto;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, warn};

use super::Shared;
use crate::protocol::RenewLease;

/// How long [`LeaseRenewer::stop`] waits for the task before aborting it.
const STOP_GRACE_PERIOD: Duration = Duration::from_millis(100);

/// Counts of background renewal outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeaseStats {
    pub renewals: u64,
    pub failures: u64,
}

/// Handle to a running renewal task.
pub(super) struct LeaseRenewer {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl LeaseRenewer {
    pub(super) fn spawn(shared: Arc<Shared>, interval: Duration) -> Self {
        let (cancel, cancel_rx) = oneshot::channel();
        let handle = tokio::spawn(run(shared, interval, cancel_rx));
        Self { cancel, handle }
    }

    /// Signal the task and detach from it.
    pub(super) fn cancel(self) {
        let _ = self.cancel.send(());
    }

    /// Signal the task and wait for it to exit, aborting it if it does not
    /// within the grace period.
    pub(super) async fn stop(self) {
        let Self { cancel, handle } = self;
        let _ = cancel.send(());
        tokio::pin!(handle);
        tokio::select! {
            _ = &mut handle => {}
            _ = tokio::time::sleep(STOP_GRACE_PERIOD) => {
                warn!("lease renewer did not stop in time, aborting");
                handle.abort();
                let _ = (&mut handle).await;
            }
        }
    }
}

async fn run(shared: Arc<Shared>, interval: Duration, mut cancel: oneshot::Receiver<()>) {
    let request = RenewLeaseRequestProto {
        client_name: shared.config.client_name.clone(),
    };
    debug!(peer = %shared.peer, ?interval, "lease renewer started");
    loop {
        // A dropped sender counts as cancellation too.
        tokio::select! {
            biased;
            _ = &mut cancel => break,
            () = tokio::time::sleep(interval) => {}
        }
        let outcome = tokio::select! {
            biased;
            _ = &mut cancel => break,
            outcome = shared.invoke::<RenewLease>(&request) => outcome,
        };
        match outcome {
            Ok(_) => {
                let renewals = shared.renewals.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(peer = %shared.peer, renewals, "lease renewed");
            }
            Err(e) => {
                let failures = shared.renewal_failures.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(peer = %shared.peer, failures, error = %e, "lease renewal failed");
            }
        }
    }
    debug!(peer = %shared.peer, "lease renewer stopped");
}
