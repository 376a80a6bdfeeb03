//! Per-connection traffic metrics.
//!
//! Rates are accounted over one-second windows advanced by caller-supplied
//! time; totals run for the life of the connection. Loss at this layer
//! means datagrams that had to be resent, the only loss signal visible to
//! a sender.

use std::fmt;
use std::time::{Duration, Instant};

/// Length of one accounting window.
const METRICS_WINDOW: Duration = Duration::from_secs(1);

/// Counters for a single one-second accounting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecondCounters {
    /// Payload bytes sent for the first time
    pub bytes_sent: u64,
    /// Payload bytes received
    pub bytes_received: u64,
    /// Payload bytes retransmitted
    pub bytes_resent: u64,
    /// Datagrams sent for the first time
    pub datagrams_sent: u64,
    /// Datagrams retransmitted
    pub datagrams_resent: u64,
}

/// Lifetime counters for a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningTotals {
    /// Payload bytes sent for the first time
    pub bytes_sent: u64,
    /// Payload bytes received
    pub bytes_received: u64,
    /// Payload bytes retransmitted
    pub bytes_resent: u64,
    /// Payload bytes acknowledged by the peer
    pub bytes_acked: u64,
    /// Datagrams sent for the first time
    pub datagrams_sent: u64,
    /// Datagrams received
    pub datagrams_received: u64,
    /// Datagrams retransmitted
    pub datagrams_resent: u64,
}

/// Rolling traffic metrics for one connection.
///
/// `Display` prints a compact per-second summary; the alternate form
/// (`{:#}`) adds lifetime totals.
#[derive(Debug, Clone)]
pub struct ConnectionMetrics {
    started_at: Instant,
    window_start: Instant,
    /// Window currently being filled.
    current: SecondCounters,
    /// Most recently completed window.
    last_second: SecondCounters,
    totals: RunningTotals,
}

impl ConnectionMetrics {
    /// Creates metrics for a connection established at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            window_start: now,
            current: SecondCounters::default(),
            last_second: SecondCounters::default(),
            totals: RunningTotals::default(),
        }
    }

    /// Records a first-time datagram send.
    pub fn record_sent(&mut self, now: Instant, bytes: u32) {
        self.roll(now);
        self.current.bytes_sent += u64::from(bytes);
        self.current.datagrams_sent += 1;
        self.totals.bytes_sent += u64::from(bytes);
        self.totals.datagrams_sent += 1;
    }

    /// Records a received datagram.
    pub fn record_received(&mut self, now: Instant, bytes: u32) {
        self.roll(now);
        self.current.bytes_received += u64::from(bytes);
        self.totals.bytes_received += u64::from(bytes);
        self.totals.datagrams_received += 1;
    }

    /// Records a retransmission.
    pub fn record_resent(&mut self, now: Instant, bytes: u32) {
        self.roll(now);
        self.current.bytes_resent += u64::from(bytes);
        self.current.datagrams_resent += 1;
        self.totals.bytes_resent += u64::from(bytes);
        self.totals.datagrams_resent += 1;
    }

    /// Records payload the peer has acknowledged.
    pub fn record_acked(&mut self, now: Instant, bytes: u32) {
        self.roll(now);
        self.totals.bytes_acked += u64::from(bytes);
    }

    /// Advances the accounting window if at least a second has passed,
    /// snapshotting the completed window. Call with the tick time before
    /// reading rates without recording anything.
    pub fn roll(&mut self, now: Instant) {
        let gap = now.duration_since(self.window_start);
        if gap >= METRICS_WINDOW * 2 {
            // Idle long enough that the previous window is empty too.
            self.last_second = SecondCounters::default();
            self.current = SecondCounters::default();
            self.window_start = now;
        } else if gap >= METRICS_WINDOW {
            self.last_second = self.current;
            self.current = SecondCounters::default();
            self.window_start += METRICS_WINDOW;
        }
    }

    /// Counters for the last completed one-second window.
    pub fn per_second(&self) -> SecondCounters {
        self.last_second
    }

    /// Lifetime counters.
    pub fn totals(&self) -> RunningTotals {
        self.totals
    }

    /// Fraction of datagrams resent over the last completed window.
    pub fn loss_last_second(&self) -> f32 {
        if self.last_second.datagrams_sent == 0 {
            return 0.0;
        }
        self.last_second.datagrams_resent as f32 / self.last_second.datagrams_sent as f32
    }

    /// Fraction of datagrams resent over the connection's lifetime.
    pub fn loss_total(&self) -> f32 {
        if self.totals.datagrams_sent == 0 {
            return 0.0;
        }
        self.totals.datagrams_resent as f32 / self.totals.datagrams_sent as f32
    }

    /// Time since the connection was established.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.duration_since(self.started_at)
    }

    /// Clears all counters, treating `now` as the new establishment time.
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }
}

impl fmt::Display for ConnectionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bytes per second sent      {}", self.last_second.bytes_sent)?;
        writeln!(
            f,
            "Bytes per second received  {}",
            self.last_second.bytes_received
        )?;
        write!(
            f,
            "Current packetloss         {:.1}%",
            self.loss_last_second() * 100.0
        )?;
        if f.alternate() {
            writeln!(f)?;
            writeln!(
                f,
                "Bytes per second resent    {}",
                self.last_second.bytes_resent
            )?;
            writeln!(f, "Total bytes sent           {}", self.totals.bytes_sent)?;
            writeln!(
                f,
                "Total bytes received       {}",
                self.totals.bytes_received
            )?;
            writeln!(f, "Total bytes resent         {}", self.totals.bytes_resent)?;
            writeln!(f, "Total bytes acked          {}", self.totals.bytes_acked)?;
            write!(
                f,
                "Average packetloss         {:.1}%",
                self.loss_total() * 100.0
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_accumulate_immediately() {
        let now = Instant::now();
        let mut metrics = ConnectionMetrics::new(now);
        metrics.record_sent(now, 1_000);
        metrics.record_received(now, 500);
        metrics.record_resent(now, 1_000);
        metrics.record_acked(now, 900);

        let totals = metrics.totals();
        assert_eq!(totals.bytes_sent, 1_000);
        assert_eq!(totals.bytes_received, 500);
        assert_eq!(totals.bytes_resent, 1_000);
        assert_eq!(totals.bytes_acked, 900);
        assert_eq!(totals.datagrams_sent, 1);
        assert_eq!(totals.datagrams_received, 1);
        assert_eq!(totals.datagrams_resent, 1);
    }

    #[test]
    fn test_window_completes_after_one_second() {
        let now = Instant::now();
        let mut metrics = ConnectionMetrics::new(now);
        metrics.record_sent(now, 1_492);
        // Nothing completed yet.
        assert_eq!(metrics.per_second(), SecondCounters::default());

        metrics.roll(now + Duration::from_secs(1));
        assert_eq!(metrics.per_second().bytes_sent, 1_492);
        assert_eq!(metrics.per_second().datagrams_sent, 1);
    }

    #[test]
    fn test_long_idle_clears_the_completed_window() {
        let now = Instant::now();
        let mut metrics = ConnectionMetrics::new(now);
        metrics.record_sent(now, 1_492);
        metrics.roll(now + Duration::from_secs(5));
        assert_eq!(metrics.per_second(), SecondCounters::default());
        // Totals survive idling.
        assert_eq!(metrics.totals().bytes_sent, 1_492);
    }

    #[test]
    fn test_loss_ratios() {
        let now = Instant::now();
        let mut metrics = ConnectionMetrics::new(now);
        for _ in 0..10 {
            metrics.record_sent(now, 1_492);
        }
        metrics.record_resent(now, 1_492);
        metrics.roll(now + Duration::from_secs(1));

        assert!((metrics.loss_last_second() - 0.1).abs() < 1e-6);
        assert!((metrics.loss_total() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_loss_is_zero_without_traffic() {
        let metrics = ConnectionMetrics::new(Instant::now());
        assert_eq!(metrics.loss_last_second(), 0.0);
        assert_eq!(metrics.loss_total(), 0.0);
    }

    #[test]
    fn test_elapsed_and_reset() {
        let now = Instant::now();
        let mut metrics = ConnectionMetrics::new(now);
        let later = now + Duration::from_secs(3);
        assert_eq!(metrics.elapsed(later), Duration::from_secs(3));

        metrics.record_sent(now, 100);
        metrics.reset(later);
        assert_eq!(metrics.totals(), RunningTotals::default());
        assert_eq!(metrics.elapsed(later), Duration::ZERO);
    }

    #[test]
    fn test_display_forms() {
        let now = Instant::now();
        let mut metrics = ConnectionMetrics::new(now);
        metrics.record_sent(now, 1_492);
        metrics.roll(now + Duration::from_secs(1));

        let compact = format!("{metrics}");
        assert!(compact.contains("Bytes per second sent"));
        assert!(!compact.contains("Total bytes sent"));

        let verbose = format!("{metrics:#}");
        assert!(verbose.contains("Total bytes sent"));
        assert!(verbose.contains("1492"));
        assert!(verbose.contains("Average packetloss"));
    }
}
