#![warn(missing_docs)]

//! headwind-core: foundational types for the congestion engine.
//!
//! This crate provides the minimal set of pieces shared across the
//! workspace:
//! - Configuration types
//! - Error handling
//! - Protocol constants
//!
//! The engine itself lives in `headwind-flow`; the public facade is the
//! `headwind` crate.

/// Protocol constants shared across layers.
pub mod constants {
    use std::time::Duration;

    /// Largest datagram payload the engine accepts as an MTU, in bytes.
    ///
    /// Derived from ethernet_mtu - pppoe_header_size
    ///       1492 = 1500         - 8
    ///
    /// Paths with more headroom than this exist, but paths that traverse
    /// DSL-style encapsulation do not, and a cap above this silently
    /// breaks them.
    pub const MAXIMUM_MTU_SIZE: u32 = 1492;
    /// Default datagram payload cap used when none is configured.
    pub const DEFAULT_MTU: u32 = 1492;
    /// Ceiling applied to reported sequence gaps. Anything between this
    /// and [`SEQUENCE_GAP_REJECTION`] is reported as exactly this many
    /// skipped datagrams; timeout-based resend recovers the rest.
    pub const SEQUENCE_GAP_CLAMP: u32 = 1000;
    /// Sequence gaps larger than this are rejected outright as stray or
    /// corrupt traffic.
    pub const SEQUENCE_GAP_REJECTION: u32 = 50_000;
    /// Default delay for which outgoing ACKs may be bundled before they
    /// must be flushed. Also feeds the estimate of how long the remote
    /// peer waits before retransmitting.
    pub const DEFAULT_SYN_INTERVAL: Duration = Duration::from_millis(10);
    /// Default gain for the round-trip-time moving averages.
    pub const DEFAULT_RTT_GAIN: f64 = 0.05;
}

/// Configuration options for the congestion engine.
pub mod config;
/// Error types.
pub mod error;

pub use config::Config;
pub use error::FlowError;
