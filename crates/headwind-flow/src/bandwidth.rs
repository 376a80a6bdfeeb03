use std::time::{Duration, Instant};

use headwind_core::config::Config;

/// Length of the accounting window for configured rate caps.
const ALLOWANCE_WINDOW: Duration = Duration::from_secs(1);

/// Operator-configured byte rate caps, accounted per direction over a
/// rolling one-second window.
///
/// This sits outside the congestion window: the transport takes the
/// smaller of the window budget and [`permitted_outgoing`] when deciding
/// how much to put on the wire. A cap of 0 means unlimited. Like the rest
/// of the engine, time comes in from the caller on every call.
///
/// [`permitted_outgoing`]: BandwidthAllowance::permitted_outgoing
#[derive(Debug, Clone)]
pub struct BandwidthAllowance {
    /// Outgoing cap in bytes per second (0 = unlimited)
    outgoing_limit: u32,
    /// Incoming cap in bytes per second (0 = unlimited)
    incoming_limit: u32,
    /// Bytes sent in the current window
    sent_this_window: u32,
    /// Bytes received in the current window
    received_this_window: u32,
    /// Start of the current window
    window_start: Instant,
}

impl BandwidthAllowance {
    /// Creates an allowance with the given per-second caps.
    pub fn new(outgoing_limit: u32, incoming_limit: u32, now: Instant) -> Self {
        Self {
            outgoing_limit,
            incoming_limit,
            sent_this_window: 0,
            received_this_window: 0,
            window_start: now,
        }
    }

    /// Creates an allowance from the connection configuration.
    pub fn from_config(config: &Config, now: Instant) -> Self {
        Self::new(
            config.outgoing_bandwidth_limit,
            config.incoming_bandwidth_limit,
            now,
        )
    }

    /// Updates the outgoing cap in bytes per second (0 = unlimited).
    pub fn set_outgoing_limit(&mut self, bytes_per_second: u32) {
        self.outgoing_limit = bytes_per_second;
    }

    /// Updates the incoming cap in bytes per second (0 = unlimited).
    pub fn set_incoming_limit(&mut self, bytes_per_second: u32) {
        self.incoming_limit = bytes_per_second;
    }

    /// Bytes still permitted to go out in the current window.
    pub fn permitted_outgoing(&mut self, now: Instant) -> u32 {
        self.roll_window(now);
        if self.outgoing_limit == 0 {
            return u32::MAX;
        }
        self.outgoing_limit.saturating_sub(self.sent_this_window)
    }

    /// Bytes still permitted to be accepted in the current window.
    pub fn permitted_incoming(&mut self, now: Instant) -> u32 {
        self.roll_window(now);
        if self.incoming_limit == 0 {
            return u32::MAX;
        }
        self.incoming_limit
            .saturating_sub(self.received_this_window)
    }

    /// Records bytes put on the wire.
    pub fn record_sent(&mut self, now: Instant, bytes: u32) {
        self.roll_window(now);
        self.sent_this_window = self.sent_this_window.saturating_add(bytes);
    }

    /// Records bytes taken off the wire.
    pub fn record_received(&mut self, now: Instant, bytes: u32) {
        self.roll_window(now);
        self.received_this_window = self.received_this_window.saturating_add(bytes);
    }

    /// Fraction of the outgoing cap used this window. 0.0 when unlimited;
    /// may exceed 1.0 when callers overshoot the cap.
    pub fn outgoing_utilization(&self) -> f32 {
        if self.outgoing_limit == 0 {
            return 0.0;
        }
        self.sent_this_window as f32 / self.outgoing_limit as f32
    }

    /// Fraction of the incoming cap used this window. 0.0 when unlimited.
    pub fn incoming_utilization(&self) -> f32 {
        if self.incoming_limit == 0 {
            return 0.0;
        }
        self.received_this_window as f32 / self.incoming_limit as f32
    }

    fn roll_window(&mut self, now: Instant) {
        if now.duration_since(self.window_start) >= ALLOWANCE_WINDOW {
            self.sent_this_window = 0;
            self.received_this_window = 0;
            self.window_start = now;
        }
    }
}
