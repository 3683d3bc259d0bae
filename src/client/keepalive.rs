// ABOUTME: SMPP keep-alive for long-running transmitter sessions
// ABOUTME: Periodic enquire_link with configurable timing; repeated failures close the session

use crate::client::error::SmppError;
use crate::client::session::{Session, halted};
use crate::pdu::Pdu;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

/// Configuration for SMPP keep-alive functionality
///
/// Controls the behavior of periodic enquire_link PDUs sent to maintain
/// session health during long-running connections. The SMSC should respond
/// with enquire_link_resp within `timeout`.
///
/// # Example
///
/// ```rust
/// use smpp_transmitter::client::KeepAliveConfig;
/// use std::time::Duration;
///
/// // Custom configuration
/// let config = KeepAliveConfig::new(Duration::from_secs(60))
///     .with_timeout(Duration::from_secs(15))
///     .with_max_failures(5);
/// assert!(config.enabled);
///
/// // Disabled keep-alive
/// let config = KeepAliveConfig::disabled();
/// assert!(!config.enabled);
/// ```
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    /// Interval between enquire_link PDUs (default: 30 seconds)
    pub interval: Duration,

    /// Timeout for enquire_link responses (default: 10 seconds)
    ///
    /// Should be significantly less than the interval.
    pub timeout: Duration,

    /// Consecutive failures before the session is closed (default: 3)
    pub max_failures: u32,

    /// Whether keep-alive runs at all
    pub enabled: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            max_failures: 3,
            enabled: true,
        }
    }
}

impl KeepAliveConfig {
    /// Enabled keep-alive with a custom interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Counts consecutive enquire_link failures.
#[derive(Debug)]
struct FailureCounter {
    consecutive: u32,
    max: u32,
}

impl FailureCounter {
    fn new(max: u32) -> Self {
        Self {
            consecutive: 0,
            max: max.max(1),
        }
    }

    fn success(&mut self) {
        if self.consecutive > 0 {
            debug!(
                failures = self.consecutive,
                "keep-alive recovered after failures"
            );
        }
        self.consecutive = 0;
    }

    /// Records a failure; true once the limit is reached.
    fn failure(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= self.max
    }
}

/// Keep-alive task body. Runs until the session halts or the failure limit
/// is reached, in which case the session is closed as a transport failure.
pub(crate) async fn run(
    session: Arc<Session>,
    config: KeepAliveConfig,
    mut halt: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures = FailureCounter::new(config.max_failures);

    loop {
        tokio::select! {
            _ = halted(&mut halt) => return,
            _ = ticker.tick() => {}
        }

        match session.request(Pdu::enquire_link, config.timeout).await {
            Ok(_) => failures.success(),
            Err(SmppError::SessionClosed) => return,
            Err(e) => {
                warn!(
                    consecutive = failures.consecutive + 1,
                    max = failures.max,
                    "keep-alive enquire_link failed: {e}"
                );
                if failures.failure() {
                    error!("keep-alive failure limit reached, closing session");
                    session.teardown(false, || SmppError::ConnectionClosed).await;
                    return;
                }
            }
        }
    }
}
