//! Accept loop for the server runtime.

use log::warn;
use tokio::{
    net::TcpListener,
    select,
    time::{Duration, sleep},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::backoff::BackoffConfig;
use crate::{handler::MessageHandler, server::connection::spawn_connection_task};

#[derive(Debug)]
pub(in crate::server) struct AcceptLoopOptions {
    pub shutdown: CancellationToken,
    pub tracker: TaskTracker,
    pub backoff: BackoffConfig,
}

/// Accepts incoming connections and spawns a task for each.
///
/// Failures to accept trigger an exponential back-off governed by
/// `options.backoff`; a successful accept resets the delay. The loop ends
/// when `options.shutdown` is cancelled. Connection tasks are tracked by
/// `options.tracker` and observe the same shutdown token.
pub(in crate::server) async fn accept_loop(
    listener: TcpListener,
    handler: MessageHandler,
    options: AcceptLoopOptions,
) {
    let AcceptLoopOptions {
        shutdown,
        tracker,
        backoff,
    } = options;
    let backoff = backoff.normalized();
    let mut delay = backoff.initial_delay;
    while let Some(next_delay) =
        accept_iteration(&listener, &handler, &shutdown, &tracker, &backoff, delay).await
    {
        delay = next_delay;
    }
}

async fn accept_iteration(
    listener: &TcpListener,
    handler: &MessageHandler,
    shutdown: &CancellationToken,
    tracker: &TaskTracker,
    backoff: &BackoffConfig,
    delay: Duration,
) -> Option<Duration> {
    select! {
        biased;

        () = shutdown.cancelled() => None,
        res = listener.accept() => Some(match res {
            Ok((stream, peer_addr)) => {
                spawn_connection_task(stream, peer_addr, handler.clone(), shutdown, tracker);
                backoff.initial_delay
            }
            Err(e) => {
                let local_addr = listener.local_addr().ok();
                warn!("accept error: error={e:?}, local_addr={local_addr:?}");
                sleep(delay).await;
                backoff.next_delay(delay)
            }
        }),
    }
}
