//! Wraparound-safe ordering of datagram sequence numbers.

/// Sequence number carried by every outgoing datagram. Assigned
/// monotonically and wraps modulo 2^32.
pub type SequenceNumber = u32;

/// Half the sequence ring. Numbers further apart than this have no
/// meaningful order.
const HALF_SPAN: SequenceNumber = SequenceNumber::MAX / 2;

/// Compares sequence numbers with wrapping arithmetic: true when `a` is
/// ahead of `b` on the ring.
pub fn sequence_greater_than(a: SequenceNumber, b: SequenceNumber) -> bool {
    a != b && b.wrapping_sub(a) > HALF_SPAN
}

/// Compares sequence numbers with wrapping arithmetic: true when `a` is
/// behind `b` on the ring.
pub fn sequence_less_than(a: SequenceNumber, b: SequenceNumber) -> bool {
    a != b && b.wrapping_sub(a) < HALF_SPAN
}
