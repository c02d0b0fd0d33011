//! Self walk and stale bucket random walks, run sequentially on the refresh thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::common::{Id, RoutingTable};
use crate::lookup::{LookupError, PeerLookup};
use crate::token::{Token, TokenError};

use super::config::Config;

/// Random targets can't be scoped to buckets deeper than this anyways.
pub const MAX_REFRESH_BUCKETS: usize = 16;

/// Status of a single refresh, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Indices of the buckets a random walk was started for, in order.
    pub walked_buckets: Vec<usize>,
    /// Number of lookups (self walk included) that failed with an unexpected error.
    pub failures: usize,
    /// Whether the refresh was cut short because its token was cancelled.
    pub interrupted: bool,
}

pub(crate) struct Refresh {
    routing_table: Arc<dyn RoutingTable>,
    lookup: Arc<dyn PeerLookup>,
    refresh_period: Duration,
    query_timeout: Duration,
}

impl Refresh {
    pub(crate) fn new(
        config: &Config,
        routing_table: Arc<dyn RoutingTable>,
        lookup: Arc<dyn PeerLookup>,
    ) -> Self {
        Refresh {
            routing_table,
            lookup,
            refresh_period: config.refresh_period,
            query_timeout: config.query_timeout,
        }
    }

    pub(crate) fn routing_table(&self) -> &dyn RoutingTable {
        self.routing_table.as_ref()
    }

    /// Walk toward our own Id, then walk every stale bucket.
    pub(crate) fn do_refresh(&self, token: &Token) -> RefreshReport {
        let mut report = RefreshReport::default();

        if !self.self_walk(token) {
            report.failures += 1;
        }

        self.refresh_buckets(token, &mut report);

        report
    }

    /// Look up our own Id to attract the closest peers into the routing table.
    ///
    /// Returns `false` if the lookup failed with an unexpected error.
    pub(crate) fn self_walk(&self, token: &Token) -> bool {
        let query_token = token.with_timeout(self.query_timeout);
        let id = self.routing_table.local_id();

        match self.lookup.find_peer(&query_token, id) {
            // We are not expected to find ourselves.
            Ok(_) | Err(LookupError::NotFound) => true,
            Err(error) if token.is_done() => {
                debug!(?error, "Self walk interrupted");
                true
            }
            Err(error) => {
                warn!(?error, "Failed to query self during routing table refresh");
                false
            }
        }
    }

    pub(crate) fn refresh_buckets(&self, token: &Token, report: &mut RefreshReport) {
        self.refresh_buckets_at(Instant::now(), token, report)
    }

    /// Random walk every bucket (up to [MAX_REFRESH_BUCKETS]) that wasn't refreshed
    /// within the refresh period before `now`.
    fn refresh_buckets_at(&self, now: Instant, token: &Token, report: &mut RefreshReport) {
        let mut buckets = self.routing_table.buckets();
        buckets.truncate(MAX_REFRESH_BUCKETS);

        for (index, bucket) in buckets.iter().enumerate() {
            if !bucket.is_stale(now, self.refresh_period) {
                continue;
            }

            if token.is_done() {
                report.interrupted = true;
                return;
            }

            let target = self.routing_table.random_id_in_bucket(index);
            report.walked_buckets.push(index);

            match self.walk(index, target, token) {
                Ok(()) => {}
                Err(error) if token.is_done() => {
                    debug!(bucket = index, ?error, "Bucket refresh interrupted");
                    report.interrupted = true;
                    return;
                }
                Err(error) => {
                    warn!(bucket = index, ?error, "Failed to do a random walk on bucket");
                    report.failures += 1;
                }
            }
        }
    }

    fn walk(&self, index: usize, target: Id, token: &Token) -> Result<(), LookupError> {
        info!(
            bucket = index,
            %target,
            size = self.routing_table.size(),
            "Starting refreshing bucket"
        );

        let query_token = token.with_timeout(self.query_timeout);
        let result = self.lookup.find_peer(&query_token, target);

        info!(
            bucket = index,
            %target,
            size = self.routing_table.size(),
            "Finished refreshing bucket"
        );

        match result {
            // Random targets are not expected to exist.
            Ok(_) | Err(LookupError::NotFound) => Ok(()),
            // The walk went as far as the timeout allowed.
            Err(LookupError::DeadlineExceeded)
                if query_token.error() == Some(TokenError::DeadlineExceeded)
                    && !token.is_done() =>
            {
                debug!(bucket = index, "Bucket walk reached its query timeout");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}
