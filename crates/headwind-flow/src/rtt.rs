//! Round-trip time estimation and retransmission timeouts.

use std::time::Duration;

use headwind_core::constants::DEFAULT_RTT_GAIN;

/// Weight of the smoothed round trip in the retransmission timeout.
pub const RTO_SRTT_WEIGHT: f64 = 2.0;
/// Weight of the deviation term in the retransmission timeout.
pub const RTO_DEVIATION_WEIGHT: f64 = 4.0;
/// Fixed slack added to every computed retransmission timeout, so that a
/// resend never fires inside the remote peer's ACK-bundling delay.
pub const RTO_ADDITIONAL_VARIANCE: Duration = Duration::from_millis(30);
/// Ceiling for the retransmission timeout, and the value used before any
/// round trip has been observed.
pub const MAX_RTO: Duration = Duration::from_secs(2);

/// Estimator for round-trip time and the resend timeout derived from it.
///
/// Keeps an exponentially weighted mean and mean absolute deviation in the
/// Jacobson/Karels style, with a deliberately small gain (5% by default):
/// on links with jittery delivery, stability is worth more than
/// responsiveness. All estimates are `None` until the first sample.
#[derive(Debug, Clone, Copy)]
pub struct RttEstimator {
    gain: f64,
    /// Most recent raw sample, microseconds.
    last: Option<f64>,
    /// Smoothed mean, microseconds.
    smoothed: Option<f64>,
    /// Smoothed mean absolute deviation, microseconds.
    deviation: Option<f64>,
}

impl RttEstimator {
    /// Creates an estimator with the given per-sample gain.
    pub fn new(gain: f64) -> Self {
        Self {
            gain,
            last: None,
            smoothed: None,
            deviation: None,
        }
    }

    /// Feeds one round-trip sample from an acknowledged datagram.
    ///
    /// The first sample seeds both the mean and the deviation; later
    /// samples move each by `gain` of its error.
    pub fn on_sample(&mut self, sample: Duration) {
        let rtt = as_micros_f64(sample);
        self.last = Some(rtt);
        match (self.smoothed, self.deviation) {
            (Some(smoothed), Some(deviation)) => {
                let difference = rtt - smoothed;
                self.smoothed = Some(smoothed + self.gain * difference);
                self.deviation = Some(deviation + self.gain * (difference.abs() - deviation));
            }
            _ => {
                self.smoothed = Some(rtt);
                self.deviation = Some(rtt);
            }
        }
    }

    /// Most recent raw round-trip sample.
    pub fn last_rtt(&self) -> Option<Duration> {
        self.last.map(from_micros_f64)
    }

    /// Exponentially smoothed round trip.
    pub fn smoothed_rtt(&self) -> Option<Duration> {
        self.smoothed.map(from_micros_f64)
    }

    /// Smoothed mean absolute deviation of the round trip.
    pub fn deviation(&self) -> Option<Duration> {
        self.deviation.map(from_micros_f64)
    }

    /// Timeout after which an unacknowledged datagram should be presumed
    /// lost and resent.
    ///
    /// Computed as `2 * srtt + 4 * deviation` plus a fixed slack, capped
    /// at [`MAX_RTO`]. Before the first sample the cap itself is returned.
    /// `times_sent` is accepted for the caller's bookkeeping but does not
    /// scale the timeout; per-retry backoff belongs to the reliability
    /// layer above.
    pub fn retransmission_timeout(&self, _times_sent: u8) -> Duration {
        match (self.smoothed, self.deviation) {
            (Some(smoothed), Some(deviation)) => {
                let threshold = RTO_SRTT_WEIGHT * smoothed
                    + RTO_DEVIATION_WEIGHT * deviation
                    + as_micros_f64(RTO_ADDITIONAL_VARIANCE);
                if threshold > as_micros_f64(MAX_RTO) {
                    MAX_RTO
                } else {
                    from_micros_f64(threshold)
                }
            }
            _ => MAX_RTO,
        }
    }
}

impl Default for RttEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_RTT_GAIN)
    }
}

fn as_micros_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1e6
}

fn from_micros_f64(micros: f64) -> Duration {
    Duration::from_secs_f64(micros / 1e6)
}
