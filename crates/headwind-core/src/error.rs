//! Error types.

use thiserror::Error;

/// Errors reported by the congestion engine.
///
/// The taxonomy is deliberately narrow. The engine performs no I/O and no
/// allocation, and "no sample yet" states are expressed as `Option`s
/// rather than errors; only contract violations and implausible input
/// surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// A configured or updated datagram payload cap exceeds the global
    /// maximum MTU.
    #[error("datagram payload of {requested} bytes exceeds the {maximum} byte MTU ceiling")]
    MtuExceedsMaximum {
        /// The payload cap that was asked for.
        requested: u32,
        /// The ceiling it collided with.
        maximum: u32,
    },

    /// An incoming sequence number implied a gap too large to be real
    /// traffic. The datagram should be dropped and recovery left to
    /// timeout-based resend.
    #[error("sequence gap of {skipped} datagrams is implausible")]
    ImplausibleSequenceGap {
        /// The apparent number of skipped datagrams.
        skipped: u32,
    },
}
