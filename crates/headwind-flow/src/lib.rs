#![warn(missing_docs)]

//! Per-connection congestion control and sequence tracking for reliable
//! UDP transports.
//!
//! One [`CongestionControl`] lives inside each connection. It decides how
//! many bytes the connection may send and resend on every tick, estimates
//! round-trip time from ACKs, schedules ACK bundling, and classifies
//! incoming sequence numbers as in-order, duplicated, or gapped. The
//! engine is passive: the owning transport calls it on every protocol
//! event with the current time, and it never blocks, allocates, or reads
//! a clock.
//!
//! Layers, leaf first:
//!
//! - [`sequence`]: wraparound-safe ordering of datagram sequence numbers.
//! - [`rtt`]: round-trip estimation and retransmission timeouts.
//! - [`congestion`]: the slow-start / congestion-avoidance window machine.
//! - [`bandwidth`]: operator-configured byte rate caps.
//! - [`metrics`]: per-connection rate and loss accounting.

/// Operator-configured bandwidth caps.
pub mod bandwidth;
/// The congestion window state machine and its control surface.
pub mod congestion;
/// Per-connection traffic metrics.
pub mod metrics;
/// Round-trip time estimation and retransmission timeouts.
pub mod rtt;
/// Wraparound-safe sequence number ordering.
pub mod sequence;

pub use bandwidth::BandwidthAllowance;
pub use congestion::{BytesPerMicrosecond, CongestionControl, RateReport, WindowPhase};
pub use metrics::{ConnectionMetrics, RunningTotals, SecondCounters};
pub use rtt::RttEstimator;
pub use sequence::{sequence_greater_than, sequence_less_than, SequenceNumber};
