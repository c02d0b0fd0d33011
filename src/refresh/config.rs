use std::time::Duration;

/// Default staleness threshold per bucket, and interval between periodic refreshes.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(60 * 60); // 1 hour
/// Default bound on a single self walk or bucket walk.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);
/// Default minimum number of peers in the routing table, below which a newly
/// seen peer triggers a refresh.
pub const DEFAULT_MIN_ROUTING_TABLE_THRESHOLD: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
/// Refresher configurations
pub struct Config {
    /// A bucket that was not refreshed for longer than this period is stale,
    /// and gets a random walk on the next refresh.
    ///
    /// This is also the interval between refreshes if [Config::auto_refresh] is enabled.
    ///
    /// Defaults to [DEFAULT_REFRESH_PERIOD]
    pub refresh_period: Duration,
    /// Maximum duration of each lookup (the self walk and every bucket walk).
    ///
    /// Defaults to [DEFAULT_QUERY_TIMEOUT]
    pub query_timeout: Duration,
    /// Refresh once on start and then every [Config::refresh_period].
    ///
    /// If disabled, refreshes only happen on [crate::Refresher::refresh_routing_table]
    /// or [crate::Refresher::bootstrap].
    ///
    /// Defaults to `true`
    pub auto_refresh: bool,
    /// Minimum number of peers in the routing table, used by
    /// [crate::Refresher::peer_added] to decide whether to request a refresh.
    ///
    /// Defaults to [DEFAULT_MIN_ROUTING_TABLE_THRESHOLD]
    pub min_routing_table_threshold: usize,
    /// Bootstrap seeds as `host:port` strings.
    ///
    /// Defaults to None, where [crate::DEFAULT_BOOTSTRAP_NODES] will be used.
    pub bootstrap: Option<Vec<String>>,
}

impl Config {
    pub fn with_refresh_period(mut self, refresh_period: Duration) -> Self {
        self.refresh_period = refresh_period;
        self
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    pub fn with_auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }

    pub fn with_min_routing_table_threshold(mut self, threshold: usize) -> Self {
        self.min_routing_table_threshold = threshold;
        self
    }

    pub fn with_bootstrap<S: ToString>(mut self, bootstrap: &[S]) -> Self {
        self.bootstrap = Some(bootstrap.iter().map(|s| s.to_string()).collect());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_period: DEFAULT_REFRESH_PERIOD,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            auto_refresh: true,
            min_routing_table_threshold: DEFAULT_MIN_ROUTING_TABLE_THRESHOLD,
            bootstrap: None,
        }
    }
}
