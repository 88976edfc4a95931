//! Poll-until-condition-or-timeout primitive.
//!
//! Every wait on asynchronous cluster state (session expiry, catalog event
//! processing, connection lifecycle) goes through [`poll_until`]. A timeout is
//! an ordinary outcome reported through [`PollResult`]; only a failing fetch
//! aborts the loop.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ProbeError;

/// Deadline and retry cadence for one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    timeout: Duration,
    interval: Duration,
}

impl PollSettings {
    /// Both durations must be non-zero.
    pub fn new(timeout: Duration, interval: Duration) -> Result<Self, ProbeError> {
        if timeout.is_zero() {
            return Err(ProbeError::InvalidPollSettings(
                "timeout must be greater than 0".to_string(),
            ));
        }
        if interval.is_zero() {
            return Err(ProbeError::InvalidPollSettings(
                "interval must be greater than 0".to_string(),
            ));
        }
        if interval > timeout {
            log::warn!(
                "Poll interval {interval:?} exceeds timeout {timeout:?}; at most two attempts will run"
            );
        }
        Ok(Self { timeout, interval })
    }

    pub fn from_millis(timeout_ms: u64, interval_ms: u64) -> Result<Self, ProbeError> {
        Self::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(interval_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Same cadence, different deadline.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, ProbeError> {
        Self::new(timeout, self.interval)
    }
}

/// Outcome of a poll loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollResult<T> {
    pub succeeded: bool,
    /// Value seen by the last fetch, whether or not it satisfied the predicate.
    pub value: T,
    pub elapsed: Duration,
    pub attempts: u32,
}

impl<T> PollResult<T> {
    pub fn is_success(&self) -> bool {
        self.succeeded
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Turns a timeout into [`ProbeError::Timeout`] for callers that treat it as fatal.
    pub fn into_result(self, what: &str) -> Result<T, ProbeError> {
        if self.succeeded {
            Ok(self.value)
        } else {
            Err(ProbeError::Timeout {
                what: what.to_string(),
                elapsed: self.elapsed,
            })
        }
    }
}

/// Repeatedly fetches a value until `predicate` accepts it or `settings.timeout`
/// has elapsed since the first attempt.
///
/// The loop runs on the caller's task and sleeps `settings.interval` between
/// attempts. A fetch error is returned as-is and ends the loop; it is never
/// treated as "not ready yet". No per-call timeout is applied to `fetch`, so a
/// slow fetch can push `elapsed` past the nominal deadline.
pub async fn poll_until<T, E, F, Fut, P>(
    settings: PollSettings,
    mut fetch: F,
    predicate: P,
) -> Result<PollResult<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        let value = fetch().await?;
        attempts += 1;
        let elapsed = start.elapsed();

        if predicate(&value) {
            if attempts > 1 {
                log::info!("Condition satisfied after {attempts} attempts ({elapsed:?})");
            }
            return Ok(PollResult {
                succeeded: true,
                value,
                elapsed,
                attempts,
            });
        }

        if elapsed >= settings.timeout {
            log::warn!(
                "Condition not satisfied within {:?} ({attempts} attempts)",
                settings.timeout
            );
            return Ok(PollResult {
                succeeded: false,
                value,
                elapsed,
                attempts,
            });
        }

        log::debug!("Attempt {attempts} not satisfied after {elapsed:?}, retrying");
        tokio::time::sleep(settings.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_harness::ScriptedSource;

    fn settings(timeout_ms: u64, interval_ms: u64) -> PollSettings {
        PollSettings::from_millis(timeout_ms, interval_ms).unwrap()
    }

    #[test]
    fn test_settings_reject_zero_durations() {
        assert!(matches!(
            PollSettings::from_millis(0, 100),
            Err(ProbeError::InvalidPollSettings(_))
        ));
        assert!(matches!(
            PollSettings::from_millis(1000, 0),
            Err(ProbeError::InvalidPollSettings(_))
        ));
        assert!(PollSettings::from_millis(1000, 100).is_ok());
    }

    #[test]
    fn test_with_timeout_keeps_interval() {
        let base = settings(1000, 50);
        let longer = base.with_timeout(Duration::from_secs(20)).unwrap();
        assert_eq!(longer.interval(), Duration::from_millis(50));
        assert_eq!(longer.timeout(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success() {
        let source = ScriptedSource::new().then_value(7i64, 1);

        let result = poll_until(settings(10_000, 100), || source.fetch(), |v| *v == 7)
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.value, 7);
        assert_eq!(result.attempts, 1);
        assert!(result.elapsed < Duration::from_millis(100));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_k_fetches() {
        // baseline for the first 15 calls, then baseline + 2
        let baseline = 40i64;
        let source = ScriptedSource::new()
            .then_value(baseline, 15)
            .then_value(baseline + 2, 1);

        let result = poll_until(
            settings(10_000, 100),
            || source.fetch(),
            |v| *v >= baseline + 2,
        )
        .await
        .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.value, baseline + 2);
        assert_eq!(result.attempts, 16);
        assert!(result.elapsed >= Duration::from_millis(1500));
        assert!(result.elapsed < Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_last_value() {
        let source = ScriptedSource::new().then_value("PAUSED".to_string(), 1);

        let result = poll_until(
            settings(1000, 100),
            || source.fetch(),
            |s| s == "ACTIVE",
        )
        .await
        .unwrap();

        assert!(!result.succeeded);
        assert_eq!(result.value, "PAUSED");
        assert!(result.elapsed >= Duration::from_millis(1000));
        assert!(result.elapsed < Duration::from_millis(1500));
        assert_eq!(result.attempts, source.calls() as u32);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_aborts_immediately() {
        let source = ScriptedSource::new()
            .then_value(1i64, 2)
            .then_failure("connection refused")
            .then_value(100, 1);

        let result = poll_until(settings(10_000, 100), || source.fetch(), |v| *v >= 100).await;

        assert!(matches!(result, Err(ProbeError::ConnectionError(_))));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_larger_than_timeout() {
        let source = ScriptedSource::new().then_value(0i64, 1);

        let result = poll_until(settings(100, 500), || source.fetch(), |v| *v > 0)
            .await
            .unwrap();

        assert!(!result.succeeded);
        assert_eq!(result.attempts, 2);
    }

    #[test]
    fn test_into_result() {
        let ok = PollResult {
            succeeded: true,
            value: 3,
            elapsed: Duration::from_millis(5),
            attempts: 1,
        };
        assert_eq!(ok.into_result("sessions to expire").unwrap(), 3);

        let timed_out = PollResult {
            succeeded: false,
            value: 2,
            elapsed: Duration::from_secs(20),
            attempts: 200,
        };
        let err = timed_out.into_result("sessions to expire").unwrap_err();
        assert!(err.to_string().contains("sessions to expire"));
    }
}
