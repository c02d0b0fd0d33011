//! Routing table refresher: the background thread that keeps the routing table
//! populated, and the handle used to trigger it.

mod bootstrap;
pub mod config;
mod scheduler;
mod worker;

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flume::Sender;
use tracing::debug;

use crate::common::RoutingTable;
use crate::lookup::PeerLookup;
use crate::token::{Canceller, Token};
use crate::Result;

use scheduler::Scheduler;
use worker::Refresh;

pub use bootstrap::{parse_bootstrap_nodes, SeedAddr, DEFAULT_BOOTSTRAP_NODES};
pub use config::Config;
pub use worker::{RefreshReport, MAX_REFRESH_BUCKETS};

/// Handle to the routing table refresh thread.
///
/// Dropping the handle cancels the thread (and any lookup in progress) without
/// waiting for it, use [Refresher::shutdown] to wait.
pub struct Refresher {
    trigger: Sender<()>,
    canceller: Canceller,
    handle: Option<JoinHandle<()>>,
    routing_table: Arc<dyn RoutingTable>,
    min_routing_table_threshold: usize,
    bootstrap_nodes: Box<[SeedAddr]>,
}

impl Refresher {
    /// Validate the config and spawn the refresh thread.
    ///
    /// If [Config::auto_refresh] is enabled, the first refresh starts right away.
    pub fn new<R, L>(config: Config, routing_table: R, lookup: L) -> Result<Self>
    where
        R: RoutingTable + 'static,
        L: PeerLookup + 'static,
    {
        let bootstrap_nodes = match &config.bootstrap {
            Some(bootstrap) => parse_bootstrap_nodes(bootstrap.as_slice())?,
            None => parse_bootstrap_nodes(&DEFAULT_BOOTSTRAP_NODES)?,
        };

        let routing_table: Arc<dyn RoutingTable> = Arc::new(routing_table);

        let (trigger, trigger_receiver) = flume::bounded(1);
        let (canceller, shutdown) = Token::new();

        let scheduler = Scheduler {
            refresh: Refresh::new(&config, routing_table.clone(), Arc::new(lookup)),
            auto_refresh: config.auto_refresh,
            refresh_period: config.refresh_period,
            trigger: trigger_receiver,
            shutdown,
        };

        let handle = thread::Builder::new()
            .name("dht-refresh".to_string())
            .spawn(move || scheduler.run())?;

        debug!(
            auto_refresh = config.auto_refresh,
            refresh_period = ?config.refresh_period,
            query_timeout = ?config.query_timeout,
            "Started routing table refresher"
        );

        Ok(Refresher {
            trigger,
            canceller,
            handle: Some(handle),
            routing_table,
            min_routing_table_threshold: config.min_routing_table_threshold,
            bootstrap_nodes,
        })
    }

    // === Getters ===

    /// Bootstrap seeds, parsed from [Config::bootstrap].
    pub fn bootstrap_nodes(&self) -> &[SeedAddr] {
        &self.bootstrap_nodes
    }

    // === Public Methods ===

    /// Ask the node to get into a bootstrapped state.
    ///
    /// Only requests a refresh, and returns without waiting for it.
    pub fn bootstrap(&self) {
        self.refresh_routing_table()
    }

    /// Request a routing table refresh.
    ///
    /// Never blocks. If a refresh is already pending, this is a noop, so
    /// many requests before the refresh thread wakes up result in one refresh.
    pub fn refresh_routing_table(&self) {
        // Full means a refresh is already pending, disconnected means shutdown.
        let _ = self.trigger.try_send(());
    }

    /// Call when a new peer was added to the routing table, to request a refresh
    /// if the table is still below [Config::min_routing_table_threshold].
    pub fn peer_added(&self) {
        if self.routing_table.size() < self.min_routing_table_threshold {
            self.refresh_routing_table();
        }
    }

    /// Cancel the refresh thread and wait for it to finish.
    pub fn shutdown(mut self) {
        self.canceller.cancel();

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Debug for Refresher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refresher")
            .field("pending", &!self.trigger.is_empty())
            .field("min_routing_table_threshold", &self.min_routing_table_threshold)
            .field("bootstrap_nodes", &self.bootstrap_nodes)
            .finish_non_exhaustive()
    }
}
