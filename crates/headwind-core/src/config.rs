//! Connection configuration.

use std::time::Duration;

use crate::constants::{DEFAULT_MTU, DEFAULT_RTT_GAIN, DEFAULT_SYN_INTERVAL};

/// Tunable options for a connection's congestion engine.
///
/// The defaults are the values the protocol has shipped with for years;
/// most deployments only ever touch `max_datagram_payload` (after path-MTU
/// discovery) and the bandwidth limits.
#[derive(Clone, Debug)]
pub struct Config {
    /// Largest datagram payload in bytes, UDP header share included.
    /// Must not exceed [`MAXIMUM_MTU_SIZE`](crate::constants::MAXIMUM_MTU_SIZE).
    pub max_datagram_payload: u32,
    /// How long outgoing ACKs may be bundled before they must be flushed.
    /// Also feeds the estimate of the remote peer's resend timer.
    pub syn_interval: Duration,
    /// Gain in `0.0..1.0` applied to each round-trip sample when updating
    /// the smoothed estimates. Smaller values favor stability over
    /// responsiveness.
    pub rtt_gain: f64,
    /// Outgoing bandwidth cap in bytes per second (0 = unlimited).
    pub outgoing_bandwidth_limit: u32,
    /// Incoming bandwidth cap in bytes per second (0 = unlimited).
    pub incoming_bandwidth_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_datagram_payload: DEFAULT_MTU,
            syn_interval: DEFAULT_SYN_INTERVAL,
            rtt_gain: DEFAULT_RTT_GAIN,
            outgoing_bandwidth_limit: 0,   // Unlimited
            incoming_bandwidth_limit: 0,   // Unlimited
        }
    }
}
