use std::time::{Duration, Instant};

use headwind_core::{
    config::Config,
    constants::{MAXIMUM_MTU_SIZE, SEQUENCE_GAP_CLAMP, SEQUENCE_GAP_REJECTION},
    error::FlowError,
};
use tracing::{debug, trace};

use crate::{
    rtt::RttEstimator,
    sequence::{sequence_greater_than, SequenceNumber},
};

/// A transfer rate in bytes per microsecond, as carried by bandwidth-probe
/// rate reports.
pub type BytesPerMicrosecond = f64;

/// Link rate estimates a peer may attach to an ACK when bandwidth-probe
/// packet pairs are in use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateReport {
    /// Estimated bottleneck bandwidth.
    pub bandwidth: BytesPerMicrosecond,
    /// Rate at which acknowledged data arrived at the peer.
    pub ack_rate: BytesPerMicrosecond,
}

/// The two growth regimes of the congestion window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// The window grows by one MTU per ACK; path capacity is still
    /// unknown, or a backoff has pulled the window back under the
    /// threshold.
    SlowStart,
    /// The window grows by roughly one MTU per window's worth of ACKs.
    CongestionAvoidance,
}

/// Per-connection congestion control and sequence tracking.
///
/// One instance lives inside each connection and is driven entirely by the
/// owning transport: time comes in as an argument on every call, nothing
/// blocks, and every operation is constant-time. The controller decides
/// how many bytes may be sent and resent each tick, schedules ACK
/// flushing, estimates round-trip time, and classifies incoming sequence
/// numbers as in-order, duplicated, or gapped.
///
/// ACK-driven growth and backoff follow the classic AIMD shape, with one
/// deliberate asymmetry: resend bandwidth is never throttled, because
/// withholding a retransmission only makes the hole it fills older.
#[derive(Debug, Clone)]
pub struct CongestionControl {
    /// Configuration snapshot taken at construction
    config: Config,
    /// Current datagram payload cap in bytes
    mtu: u32,
    /// Congestion window: bytes permitted in flight
    cwnd: f64,
    /// Slow-start threshold; `None` until a backoff establishes one
    ssthresh: Option<f64>,
    /// Round-trip estimator fed by every ACK
    rtt: RttEstimator,
    /// Arrival time of the oldest datagram still owed an ACK
    oldest_unsent_ack: Option<Instant>,
    /// Sequence number the next outgoing datagram will carry
    next_sequence_number: SequenceNumber,
    /// Sequence number at which the current congestion-control block ends
    next_block_boundary: SequenceNumber,
    /// Whether a backoff has already been applied in this block
    backoff_this_block: bool,
    /// Whether a speed-up has already been applied in this block; reserved
    /// for the packet-pair probe path
    #[allow(dead_code)]
    speed_up_this_block: bool,
    /// Next sequence number expected from the remote peer
    expected_sequence_number: SequenceNumber,
    /// Whether the connection currently has a steady stream of outgoing
    /// data, as reported by the caller
    continuous_send: bool,
}

impl CongestionControl {
    /// Creates a controller for a newly established connection.
    ///
    /// `now` is the transport's current tick time; the controller never
    /// reads a clock of its own. Fails if the configured payload cap
    /// exceeds [`MAXIMUM_MTU_SIZE`].
    pub fn new(config: &Config, now: Instant) -> Result<Self, FlowError> {
        check_mtu(config.max_datagram_payload)?;
        let mut control = Self {
            config: config.clone(),
            mtu: config.max_datagram_payload,
            cwnd: 0.0,
            ssthresh: None,
            rtt: RttEstimator::new(config.rtt_gain),
            oldest_unsent_ack: None,
            next_sequence_number: 0,
            next_block_boundary: 0,
            backoff_this_block: false,
            speed_up_this_block: false,
            expected_sequence_number: 0,
            continuous_send: false,
        };
        control.reset(now);
        Ok(control)
    }

    /// Returns the controller to its just-connected state, restoring the
    /// configured payload cap and discarding all estimates and counters.
    pub fn reset(&mut self, _now: Instant) {
        self.mtu = self.config.max_datagram_payload;
        self.cwnd = f64::from(self.mtu);
        self.ssthresh = None;
        self.rtt = RttEstimator::new(self.config.rtt_gain);
        self.oldest_unsent_ack = None;
        self.next_sequence_number = 0;
        self.next_block_boundary = 0;
        self.backoff_this_block = false;
        self.speed_up_this_block = false;
        self.expected_sequence_number = 0;
        self.continuous_send = false;
    }

    /// Current datagram payload cap in bytes.
    pub fn mtu(&self) -> u32 {
        self.mtu
    }

    /// Updates the payload cap, typically after path-MTU discovery.
    ///
    /// Window state is not revalidated; the window re-learns the path at
    /// the new size through the normal growth and backoff signals.
    pub fn set_mtu(&mut self, bytes: u32) -> Result<(), FlowError> {
        check_mtu(bytes)?;
        self.mtu = bytes;
        Ok(())
    }

    /// Sequence number the next outgoing datagram will carry.
    pub fn next_sequence_number(&self) -> SequenceNumber {
        self.next_sequence_number
    }

    /// Assigns the sequence number for an outgoing datagram, advancing the
    /// counter with wraparound.
    pub fn take_next_sequence_number(&mut self) -> SequenceNumber {
        let assigned = self.next_sequence_number;
        self.next_sequence_number = self.next_sequence_number.wrapping_add(1);
        assigned
    }

    /// New bytes permitted on the wire this tick: whatever room the
    /// congestion window still has beyond the data already in flight.
    ///
    /// Also records whether the caller considers the outgoing stream
    /// continuous; growth and backoff only apply while it is.
    pub fn transmission_bandwidth(
        &mut self,
        unacknowledged_bytes: u32,
        is_continuous_send: bool,
    ) -> u32 {
        self.continuous_send = is_continuous_send;
        if f64::from(unacknowledged_bytes) <= self.cwnd {
            (self.cwnd - f64::from(unacknowledged_bytes)) as u32
        } else {
            0
        }
    }

    /// Resend bytes permitted on the wire this tick.
    ///
    /// Always the full amount asked for. Retransmissions repair holes the
    /// receiver is already stalled on, so they go ahead of the window
    /// rather than through it.
    pub fn retransmission_bandwidth(&self, unacknowledged_bytes: u32) -> u32 {
        unacknowledged_bytes
    }

    /// Whether bundled ACKs should be flushed this tick.
    ///
    /// Until a round trip has been observed there is no basis for guessing
    /// how soon the remote peer retransmits, so ACKs go out immediately.
    /// Afterwards they are held at most one SYN interval past the oldest
    /// unacknowledged arrival.
    pub fn should_send_acks(&self, now: Instant, _estimated_time_to_next_tick: Duration) -> bool {
        if self.remote_ack_timeout().is_none() {
            return true;
        }
        match self.oldest_unsent_ack {
            Some(oldest) => now >= oldest + self.config.syn_interval,
            None => true,
        }
    }

    /// Estimate of how long the remote peer waits before retransmitting
    /// to us, `None` until a round trip has been observed.
    pub fn remote_ack_timeout(&self) -> Option<Duration> {
        self.rtt
            .last_rtt()
            .map(|last| last + self.config.syn_interval)
    }

    /// Timeout after which an unacknowledged datagram should be resent.
    /// See [`RttEstimator::retransmission_timeout`].
    pub fn retransmission_timeout(&self, times_sent: u8) -> Duration {
        self.rtt.retransmission_timeout(times_sent)
    }

    /// Classifies an arriving datagram's sequence number and starts the
    /// owed-ACK timer.
    ///
    /// Returns the number of datagrams skipped ahead of this one: 0 for
    /// in-order arrivals and for duplicates or stragglers from behind the
    /// expected number, the gap size (clamped to [`SEQUENCE_GAP_CLAMP`])
    /// when the number is ahead. Gaps beyond [`SEQUENCE_GAP_REJECTION`]
    /// are rejected without advancing the expected number; stray and
    /// corrupt traffic produces such jumps, and NAKing tens of thousands
    /// of datagrams would only amplify the damage. The owed-ACK timer
    /// starts even for rejected datagrams.
    pub fn on_packet_received(
        &mut self,
        sequence_number: SequenceNumber,
        _is_continuous_send: bool,
        now: Instant,
        _size_bytes: u32,
    ) -> Result<u32, FlowError> {
        if self.oldest_unsent_ack.is_none() {
            self.oldest_unsent_ack = Some(now);
        }

        if sequence_number == self.expected_sequence_number {
            self.expected_sequence_number = sequence_number.wrapping_add(1);
            return Ok(0);
        }

        if sequence_greater_than(sequence_number, self.expected_sequence_number) {
            let mut skipped = sequence_number.wrapping_sub(self.expected_sequence_number);
            if skipped > SEQUENCE_GAP_CLAMP {
                if skipped > SEQUENCE_GAP_REJECTION {
                    return Err(FlowError::ImplausibleSequenceGap { skipped });
                }
                // Past the clamp, the remainder is left to timeout resend.
                skipped = SEQUENCE_GAP_CLAMP;
            }
            self.expected_sequence_number = sequence_number.wrapping_add(1);
            return Ok(skipped);
        }

        // Behind the expected number: a duplicate or a late straggler.
        Ok(0)
    }

    /// Reacts to one of our datagrams being retransmitted.
    ///
    /// The first resend in a block, while the window is above two MTUs,
    /// drops the window to a single MTU and sets the threshold at half the
    /// old window (never below one MTU). The window is reset rather than
    /// halved: avoidance growth is too slow to climb back from a
    /// half-window start before the next loss.
    pub fn on_resend(&mut self, _now: Instant, _next_action_time: Instant) {
        if !self.continuous_send
            || self.backoff_this_block
            || self.cwnd <= f64::from(self.mtu) * 2.0
        {
            return;
        }

        let mtu = f64::from(self.mtu);
        let threshold = (self.cwnd / 2.0).max(mtu);
        self.ssthresh = Some(threshold);
        self.cwnd = mtu;

        // At most one backoff per block.
        self.next_block_boundary = self.next_sequence_number;
        self.backoff_this_block = true;

        debug!(
            "resend backoff: cwnd reset to {:.0}, ssthresh={:.0}",
            self.cwnd, threshold
        );
    }

    /// Reacts to a negative acknowledgement from the remote peer.
    ///
    /// Softer than a resend-triggered backoff: a threshold is set at half
    /// the current window, moving growth onto the avoidance curve, but the
    /// window itself is left alone.
    pub fn on_nak(&mut self, _now: Instant, _sequence_number: SequenceNumber) {
        if self.continuous_send && !self.backoff_this_block {
            let threshold = self.cwnd / 2.0;
            self.ssthresh = Some(threshold);
            debug!("NAK: ssthresh={:.0}, window untouched", threshold);
        }
    }

    /// Processes an acknowledgement carrying a round-trip sample.
    ///
    /// The estimator is updated unconditionally; window growth applies
    /// only while the caller reports a continuous outgoing stream. In slow
    /// start the window grows one MTU per ACK, easing onto the avoidance
    /// curve when it crosses the threshold; in congestion avoidance it
    /// grows `mtu^2 / cwnd` once per block.
    pub fn on_ack(
        &mut self,
        _now: Instant,
        round_trip: Duration,
        _rate_report: Option<RateReport>,
        _total_bytes_acked: u64,
        is_continuous_send: bool,
        sequence_number: SequenceNumber,
    ) {
        self.rtt.on_sample(round_trip);
        self.continuous_send = is_continuous_send;
        if !is_continuous_send {
            return;
        }

        // An ACK from beyond the block boundary opens a new block: the
        // backoff and speed-up guards re-arm, and the boundary moves to
        // the newest outgoing sequence number.
        let new_block = sequence_greater_than(sequence_number, self.next_block_boundary);
        if new_block {
            self.backoff_this_block = false;
            self.speed_up_this_block = false;
            self.next_block_boundary = self.next_sequence_number;
        }

        let mtu = f64::from(self.mtu);
        match self.phase() {
            WindowPhase::SlowStart => {
                self.cwnd += mtu;
                if let Some(threshold) = self.ssthresh {
                    if self.cwnd > threshold {
                        // Ease onto the avoidance curve instead of
                        // clamping flat at the threshold.
                        self.cwnd = threshold + mtu * mtu / self.cwnd;
                    }
                }
                trace!("slow start: cwnd={:.0}", self.cwnd);
            }
            WindowPhase::CongestionAvoidance if new_block => {
                self.cwnd += mtu * mtu / self.cwnd;
                trace!("congestion avoidance: cwnd={:.0}", self.cwnd);
            }
            WindowPhase::CongestionAvoidance => {}
        }
    }

    /// Duplicate ACKs carry no signal here; fast retransmit is not part
    /// of this design.
    pub fn on_duplicate_ack(&mut self, _now: Instant, _sequence_number: SequenceNumber) {}

    /// Notes that a bundled ACK went out, clearing the owed-ACK timer.
    pub fn on_sent_ack(&mut self, _now: Instant, _bytes: u32) {
        self.oldest_unsent_ack = None;
    }

    /// Notes that datagram payload went out. Instrumentation point; does
    /// not affect the window.
    pub fn on_sent_bytes(&mut self, _now: Instant, _bytes: u32) {}

    /// Notes that a NAK went out. Instrumentation point.
    pub fn on_sent_nak(&mut self, _now: Instant, _bytes: u32) {}

    /// Reserved for bandwidth-probe packet pairs; currently inert.
    pub fn on_packet_pair(
        &mut self,
        _sequence_number: SequenceNumber,
        _size_bytes: u32,
        _now: Instant,
    ) {
    }

    /// Per-tick hook. Nothing is currently time-driven, but transports
    /// should keep the call in place.
    pub fn update(&mut self, _now: Instant, _has_data_to_send_or_resend: bool) {}

    /// Rate report to attach to an outgoing ACK when probe data exists.
    /// Always `None` for the sliding-window controller.
    pub fn ack_rate_report(&self) -> Option<RateReport> {
        None
    }

    /// Receive-side delivery rate estimate.
    // TODO: derive from arrival timestamps once the packet-pair probe
    // path records them.
    pub fn local_receive_rate(&self, _now: Instant) -> Option<BytesPerMicrosecond> {
        None
    }

    /// Absolute outgoing rate cap implied by congestion control. The
    /// sliding window derives none; pacing falls out of the window itself.
    pub fn bytes_per_second_limit(&self) -> Option<u64> {
        None
    }

    /// Most recent raw round-trip sample.
    pub fn last_rtt(&self) -> Option<Duration> {
        self.rtt.last_rtt()
    }

    /// The round-trip estimator, for telemetry.
    pub fn rtt(&self) -> &RttEstimator {
        &self.rtt
    }

    /// Current congestion window in bytes.
    pub fn congestion_window(&self) -> f64 {
        self.cwnd
    }

    /// Current slow-start threshold, once a backoff has established one.
    pub fn slow_start_threshold(&self) -> Option<f64> {
        self.ssthresh
    }

    /// Which growth regime the window is in. Slow start holds while no
    /// threshold is set or while the window sits at or below it.
    pub fn phase(&self) -> WindowPhase {
        match self.ssthresh {
            Some(threshold) if self.cwnd > threshold => WindowPhase::CongestionAvoidance,
            _ => WindowPhase::SlowStart,
        }
    }
}

fn check_mtu(bytes: u32) -> Result<(), FlowError> {
    if bytes > MAXIMUM_MTU_SIZE {
        return Err(FlowError::MtuExceedsMaximum {
            requested: bytes,
            maximum: MAXIMUM_MTU_SIZE,
        });
    }
    Ok(())
}
