#![warn(missing_docs)]

//! Headwind is a per-connection congestion control and sequence tracking
//! engine for reliable UDP transports.
//!
//! The engine is deliberately passive. It opens no sockets, spawns no
//! threads, and never reads a clock: the owning transport feeds it every
//! protocol event together with the current time, and reads back send
//! budgets, resend timeouts, and ACK-flush decisions. That makes the whole
//! engine single-threaded, constant-time per call, and trivially
//! deterministic under test.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//!
//! use headwind::{Config, CongestionControl};
//!
//! let now = Instant::now();
//! let mut control = CongestionControl::new(&Config::default(), now).unwrap();
//!
//! // A fresh window admits one MTU of data.
//! assert_eq!(control.transmission_bandwidth(0, true), control.mtu());
//!
//! // One acknowledged round trip in continuous-send mode grows it.
//! let seq = control.take_next_sequence_number();
//! let before = control.congestion_window();
//! control.on_ack(now, Duration::from_millis(50), None, 1492, true, seq);
//! assert!(control.congestion_window() > before);
//! ```

pub use headwind_core::{constants, Config, FlowError};
pub use headwind_flow::{
    bandwidth::BandwidthAllowance,
    congestion::{BytesPerMicrosecond, CongestionControl, RateReport, WindowPhase},
    metrics::{ConnectionMetrics, RunningTotals, SecondCounters},
    rtt::RttEstimator,
    sequence::{sequence_greater_than, sequence_less_than, SequenceNumber},
};

/// Convenience re-exports of the items most transports need.
pub mod prelude {
    pub use crate::{
        BandwidthAllowance, Config, CongestionControl, ConnectionMetrics, FlowError, RateReport,
        RttEstimator, SequenceNumber, WindowPhase,
    };
}
