//! pingboard - host reachability monitor.
//!
//! Polls a fixed set of hosts, keeps the last few probe results per host
//! and serves the aggregated state as JSON next to a small dashboard.

pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod monitor;
pub mod prober;
pub mod registry;
pub mod server;

pub use config::MonitorConfig;
pub use error::{ConfigError, ProbeError, ServerError};
pub use metrics::{snapshot, HostSnapshot, MetricsSnapshot};
pub use model::{HostRecord, ProbeResult, Status, HISTORY_LIMIT};
pub use monitor::{Monitor, MonitorSettings};
pub use prober::{IcmpProber, PingStats, Prober};
pub use registry::HostRegistry;
