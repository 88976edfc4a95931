pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod metrics;
pub mod poller;
pub mod profile;
pub mod wait;

#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use error::ProbeError;
pub use poller::{poll_until, PollResult, PollSettings};

// Query daemon metric names
pub const METRIC_SESSIONS_EXPIRED: &str = "impala-server.num-sessions-expired";
pub const METRIC_CONNECTIONS_IN_USE_PREFIX: &str = "impala.thrift-server.";
pub const METRIC_CONNECTIONS_IN_USE_SUFFIX: &str = "-frontend.connections-in-use";

// Catalog event processor keys
pub const EVENT_LAST_SYNCED_ID: &str = "last-synced-event-id";
pub const EVENT_PROCESSOR_STATUS: &str = "status";
pub const EVENT_PROCESSOR_ACTIVE: &str = "ACTIVE";

// Status page paths
pub const DEFAULT_METRICS_PATH: &str = "/jsonmetrics?json";
pub const EVENTS_PATH: &str = "/events?json";
pub const EVENTS_METRICS_FIELD: &str = "event_processor_metrics";
