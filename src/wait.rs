//! Waits on cluster state, all expressed through [`poll_until`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ProbeError;
use crate::metrics::{EventProcessorScraper, MetricScraper};
use crate::poller::{poll_until, PollResult, PollSettings};
use crate::{METRIC_CONNECTIONS_IN_USE_PREFIX, METRIC_CONNECTIONS_IN_USE_SUFFIX};

/// Events produced by one insert through the metastore.
pub const DEFAULT_EVENT_DELTA: i64 = 2;

/// Time for a synced catalog update to reach the query daemons.
pub const DEFAULT_EVENT_SETTLE: Duration = Duration::from_secs(2);

/// Client protocols served by a query daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientProtocol {
    Beeswax,
    HiveServer2,
}

impl ClientProtocol {
    pub const ALL: [ClientProtocol; 2] = [ClientProtocol::Beeswax, ClientProtocol::HiveServer2];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientProtocol::Beeswax => "beeswax",
            ClientProtocol::HiveServer2 => "hiveserver2",
        }
    }
}

impl fmt::Display for ClientProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beeswax" => Ok(ClientProtocol::Beeswax),
            "hiveserver2" | "hs2" => Ok(ClientProtocol::HiveServer2),
            other => Err(format!("unknown client protocol: {other}")),
        }
    }
}

/// Name of the open-connections gauge for a protocol's frontend.
pub fn connections_in_use_metric(protocol: ClientProtocol) -> String {
    format!(
        "{}{}{}",
        METRIC_CONNECTIONS_IN_USE_PREFIX,
        protocol.as_str(),
        METRIC_CONNECTIONS_IN_USE_SUFFIX
    )
}

pub async fn wait_for_metric_value(
    scraper: &MetricScraper,
    name: &str,
    expected: i64,
    settings: PollSettings,
) -> Result<PollResult<i64>, ProbeError> {
    log::debug!("Waiting for {name} == {expected}");
    poll_until(settings, || scraper.get_metric_i64(name), |v| *v == expected).await
}

pub async fn wait_for_metric_at_least(
    scraper: &MetricScraper,
    name: &str,
    target: i64,
    settings: PollSettings,
) -> Result<PollResult<i64>, ProbeError> {
    log::debug!("Waiting for {name} >= {target}");
    poll_until(settings, || scraper.get_metric_i64(name), |v| *v >= target).await
}

/// Checks that `name` stays at `baseline` for the whole of `settings.timeout`.
///
/// Succeeds only when the window passes without change; stops at the first
/// differing value and reports it.
pub async fn expect_metric_steady(
    scraper: &MetricScraper,
    name: &str,
    baseline: i64,
    settings: PollSettings,
) -> Result<PollResult<i64>, ProbeError> {
    let changed = poll_until(settings, || scraper.get_metric_i64(name), |v| *v != baseline).await?;
    if changed.succeeded {
        log::warn!(
            "{name} changed from {baseline} to {} after {:?}",
            changed.value,
            changed.elapsed
        );
    }
    Ok(PollResult {
        succeeded: !changed.succeeded,
        ..changed
    })
}

/// Waits until the catalog has synced at least `min_delta` events past
/// `previous_event_id`.
///
/// Returns as soon as the event id advances. Use
/// [`wait_for_event_propagation`] when daemons must also have picked up the
/// resulting catalog update.
pub async fn wait_for_event_processing(
    events: &EventProcessorScraper,
    previous_event_id: i64,
    min_delta: i64,
    settings: PollSettings,
) -> Result<PollResult<i64>, ProbeError> {
    log::debug!("Waiting for event id to pass {previous_event_id} by {min_delta}");
    poll_until(
        settings,
        || events.last_synced_event_id(),
        |id| id.saturating_sub(previous_event_id) >= min_delta,
    )
    .await
}

/// Like [`wait_for_event_processing`], then sleeps `settle` once the events
/// are synced so the catalog update can reach the query daemons. No status
/// page reports that propagation. The settle time is not included in
/// `elapsed`, and no delay is added on timeout.
pub async fn wait_for_event_propagation(
    events: &EventProcessorScraper,
    previous_event_id: i64,
    min_delta: i64,
    settings: PollSettings,
    settle: Duration,
) -> Result<PollResult<i64>, ProbeError> {
    let result = wait_for_event_processing(events, previous_event_id, min_delta, settings).await?;
    if result.succeeded && !settle.is_zero() {
        log::debug!("Events synced, settling for {settle:?}");
        tokio::time::sleep(settle).await;
    }
    Ok(result)
}

pub async fn wait_for_event_processor_status(
    events: &EventProcessorScraper,
    status: &str,
    settings: PollSettings,
) -> Result<PollResult<String>, ProbeError> {
    poll_until(settings, || events.status(), |s| s == status).await
}
