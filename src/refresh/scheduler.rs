//! The refresh thread loop.

use std::time::{Duration, Instant};

use flume::{Receiver, Selector};
use tracing::{debug, info};

use crate::token::Token;

use super::worker::Refresh;

/// What woke the refresh thread up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Tick,
    Trigger,
    Shutdown,
}

pub(crate) struct Scheduler {
    pub(crate) refresh: Refresh,
    pub(crate) auto_refresh: bool,
    pub(crate) refresh_period: Duration,
    pub(crate) trigger: Receiver<()>,
    pub(crate) shutdown: Token,
}

impl Scheduler {
    /// Run until the shutdown token is cancelled, or the [crate::Refresher] is dropped.
    ///
    /// This is the only caller of [Refresh::do_refresh], so refreshes never overlap.
    pub(crate) fn run(self) {
        let mut next_tick = None;

        if self.auto_refresh {
            next_tick = Some(Instant::now() + self.refresh_period);
            self.do_refresh();
        }

        loop {
            match self.wait(next_tick) {
                Wake::Shutdown => break,
                Wake::Tick => {
                    next_tick = next_tick
                        .map(|tick| next_tick_after(tick, self.refresh_period, Instant::now()));
                }
                Wake::Trigger => {
                    info!(
                        size = self.refresh.routing_table().size(),
                        "Triggering a routing table refresh"
                    );
                }
            }

            if self.shutdown.is_done() {
                break;
            }

            self.do_refresh();
        }

        debug!("dht-refresh thread was shutdown");
    }

    fn do_refresh(&self) {
        let report = self.refresh.do_refresh(&self.shutdown);

        debug!(
            walked_buckets = ?report.walked_buckets,
            failures = report.failures,
            interrupted = report.interrupted,
            size = self.refresh.routing_table().size(),
            "Routing table refresh done"
        );
    }

    /// Block until exactly one of: the next tick, a trigger, or shutdown.
    fn wait(&self, next_tick: Option<Instant>) -> Wake {
        if self.shutdown.is_done() {
            return Wake::Shutdown;
        }

        let selector = Selector::new()
            .recv(self.shutdown.cancelled(), |_| Wake::Shutdown)
            .recv(&self.trigger, |message| match message {
                Ok(()) => Wake::Trigger,
                // Refresher was dropped.
                Err(_) => Wake::Shutdown,
            });

        match next_tick {
            Some(deadline) => selector.wait_deadline(deadline).unwrap_or(Wake::Tick),
            None => selector.wait(),
        }
    }
}

/// Schedule the tick after `scheduled`, keeping the cadence unless a refresh
/// overran it, in which case at most one tick fires right away.
fn next_tick_after(scheduled: Instant, period: Duration, now: Instant) -> Instant {
    let next = scheduled + period;

    if next > now {
        next
    } else {
        now + period
    }
}
