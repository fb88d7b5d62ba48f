//! # Global runtime configuration.
//!
//! Provides [`Config`], the settings shared by the bus, the dispatcher and the
//! runtime.
//!
//! Config is used in three ways:
//! 1. **Runtime creation**: `Runtime::builder(config)`
//! 2. **Dispatcher creation**: `Dispatcher::new(&config, ..)`
//! 3. **Routing**: bounce ceiling and verb strictness are copied into every
//!    [`RouteCtx`](crate::RouteCtx)
//!
//! ## Sentinel values
//! - `max_bounces = 0` → unlimited (bounces are never dropped)
//! - `bus_capacity = 0` → clamped to 1
//! - `grace = 0s` → workers are not waited for

use std::path::PathBuf;
use std::time::Duration;

/// Global configuration for the runtime.
///
/// ## Field semantics
/// - `bus_capacity`: envelope queue slots (min 1)
/// - `poll_interval`: longest the dispatcher waits for an envelope before
///   re-checking its terminal condition
/// - `max_bounces`: bounce ceiling (`0` = unlimited)
/// - `strict_verbs`: bounce unknown verbs instead of ignoring them
/// - `grace`: time workers get to stop after the dispatcher exits
/// - `telemetry_capacity`: telemetry broadcast ring buffer (min 1)
/// - `worker_restart_delay`: pause before a failed worker loop is re-entered
/// - `component_table`: table file read at boot and on `RELOAD`
/// - `dispatcher_name`: registry name of the root router
///
/// All fields are public. Prefer the helper accessors over sentinel checks.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of envelopes the bus holds before `enqueue` fails.
    pub bus_capacity: usize,

    /// Upper bound on one dispatcher wait.
    ///
    /// The dispatcher wakes as soon as an envelope arrives; this only bounds
    /// how long an idle loop goes without checking whether it may terminate.
    pub poll_interval: Duration,

    /// Largest `error_count` an envelope may carry and still be bounced.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = an envelope that already bounced `n` times is dropped
    pub max_bounces: u32,

    /// Bounce unknown verbs addressed to an existing router.
    pub strict_verbs: bool,

    /// Maximum time to wait for workers after the dispatcher has terminated.
    ///
    /// When exceeded, the runtime returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the telemetry broadcast channel.
    pub telemetry_capacity: usize,

    /// Delay before a worker loop that failed with a retryable error runs again.
    pub worker_restart_delay: Duration,

    /// Location of the component table.
    pub component_table: PathBuf,

    /// Name the root router is registered under.
    pub dispatcher_name: String,
}

impl Config {
    /// Returns the bounce ceiling as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` bounces per envelope
    #[inline]
    pub fn bounce_limit(&self) -> Option<u32> {
        if self.max_bounces == 0 {
            None
        } else {
            Some(self.max_bounces)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a telemetry capacity clamped to a minimum of 1.
    #[inline]
    pub fn telemetry_capacity_clamped(&self) -> usize {
        self.telemetry_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 9999`
    /// - `poll_interval = 10ms`
    /// - `max_bounces = 8`
    /// - `strict_verbs = false`
    /// - `grace = 5s`
    /// - `telemetry_capacity = 1024`
    /// - `worker_restart_delay = 1s`
    /// - `component_table = resources/componentList.txt`
    /// - `dispatcher_name = "Dispatcher"`
    fn default() -> Self {
        Self {
            bus_capacity: 9999,
            poll_interval: Duration::from_millis(10),
            max_bounces: 8,
            strict_verbs: false,
            grace: Duration::from_secs(5),
            telemetry_capacity: 1024,
            worker_restart_delay: Duration::from_secs(1),
            component_table: PathBuf::from("resources/componentList.txt"),
            dispatcher_name: "Dispatcher".to_string(),
        }
    }
}
