//! End-to-end scenarios driving the congestion engine the way a transport
//! would: sequence numbers assigned per send, events fed back with a
//! synthetic clock, budgets read every tick.

use std::time::{Duration, Instant};

use headwind_core::config::Config;
use headwind_flow::{BandwidthAllowance, CongestionControl, ConnectionMetrics, WindowPhase};

const MTU: u32 = 1492;
const RTT: Duration = Duration::from_micros(50_000);

fn establish(now: Instant) -> CongestionControl {
    CongestionControl::new(&Config::default(), now).expect("default config is valid")
}

#[test]
fn window_grows_one_mtu_per_acked_round_trip() {
    let now = Instant::now();
    let mut control = establish(now);
    assert_eq!(control.congestion_window(), f64::from(MTU));

    for _ in 0..3 {
        let seq = control.take_next_sequence_number();
        control.on_ack(now, RTT, None, u64::from(MTU), true, seq);
    }

    assert_eq!(control.congestion_window(), f64::from(MTU) * 4.0);
    assert_eq!(control.slow_start_threshold(), None);
    assert_eq!(control.phase(), WindowPhase::SlowStart);
}

#[test]
fn slow_start_growth_is_strictly_monotonic() {
    let now = Instant::now();
    let mut control = establish(now);

    let mut previous = control.congestion_window();
    for _ in 0..20 {
        let seq = control.take_next_sequence_number();
        control.on_ack(now, RTT, None, u64::from(MTU), true, seq);
        let window = control.congestion_window();
        assert_eq!(window, previous + f64::from(MTU));
        previous = window;
    }
}

#[test]
fn ack_flushing_follows_the_syn_interval() {
    let start = Instant::now();
    let mut control = establish(start);

    // Before any round trip is known, ACKs flush on every tick.
    control.on_packet_received(0, true, start, 512).unwrap();
    assert!(control.should_send_acks(start, Duration::ZERO));
    control.on_sent_ack(start, 32);

    // One acknowledged send teaches the controller the round trip.
    let seq = control.take_next_sequence_number();
    control.on_ack(start + RTT, RTT, None, 512, true, seq);
    assert_eq!(control.remote_ack_timeout(), Some(RTT + Duration::from_millis(10)));

    // Now arrivals are batched for one SYN interval.
    let arrival = start + RTT + Duration::from_millis(5);
    control.on_packet_received(1, true, arrival, 512).unwrap();
    assert!(!control.should_send_acks(arrival, Duration::ZERO));
    assert!(!control.should_send_acks(arrival + Duration::from_millis(9), Duration::ZERO));
    assert!(control.should_send_acks(arrival + Duration::from_millis(10), Duration::ZERO));

    // Flushing re-arms the cycle for the next arrival.
    control.on_sent_ack(arrival + Duration::from_millis(10), 32);
    assert!(control.should_send_acks(arrival + Duration::from_millis(11), Duration::ZERO));
}

#[test]
fn loss_episode_recovers_through_avoidance() {
    let now = Instant::now();
    let mut control = establish(now);

    // Climb in slow start.
    for _ in 0..6 {
        let seq = control.take_next_sequence_number();
        control.on_ack(now, RTT, None, u64::from(MTU), true, seq);
    }
    assert_eq!(control.congestion_window(), f64::from(MTU) * 7.0);

    // The reliability layer resends something: hard backoff.
    let timeout = control.retransmission_timeout(1);
    control.on_resend(now, now + timeout);
    assert_eq!(control.congestion_window(), f64::from(MTU));
    assert_eq!(control.slow_start_threshold(), Some(f64::from(MTU) * 3.5));
    assert_eq!(control.phase(), WindowPhase::SlowStart);

    // Regrow. Slow start carries the window back up to the threshold and
    // eases over it.
    for _ in 0..3 {
        let seq = control.take_next_sequence_number();
        control.on_ack(now, RTT, None, u64::from(MTU), true, seq);
    }
    assert_eq!(control.phase(), WindowPhase::CongestionAvoidance);
    let eased = control.congestion_window();
    assert!(eased > f64::from(MTU) * 3.5);
    assert!(eased < f64::from(MTU) * 4.0);

    // From here growth is once per block and much smaller than an MTU.
    let seq = control.take_next_sequence_number();
    control.on_ack(now, RTT, None, u64::from(MTU), true, seq);
    let grown = control.congestion_window();
    assert!(grown > eased);
    assert!(grown - eased < f64::from(MTU));
}

#[test]
fn operator_cap_composes_with_the_window_budget() {
    let now = Instant::now();
    let config = Config {
        outgoing_bandwidth_limit: 2_000,
        ..Config::default()
    };
    let mut control = CongestionControl::new(&config, now).unwrap();
    let mut allowance = BandwidthAllowance::from_config(&config, now);

    // Fresh connection: the window is the tighter bound.
    let budget = control
        .transmission_bandwidth(0, true)
        .min(allowance.permitted_outgoing(now));
    assert_eq!(budget, MTU);

    // After most of the cap is spent, the cap takes over.
    allowance.record_sent(now, 1_600);
    let budget = control
        .transmission_bandwidth(0, true)
        .min(allowance.permitted_outgoing(now));
    assert_eq!(budget, 400);

    // The next second refills the cap; the window is unchanged by it.
    let later = now + Duration::from_secs(1);
    assert_eq!(allowance.permitted_outgoing(later), 2_000);
    assert_eq!(control.transmission_bandwidth(0, true), MTU);
}

#[test]
fn retransmission_budget_ignores_the_window() {
    let now = Instant::now();
    let mut control = establish(now);
    // The window holds one MTU, yet ten MTUs of resends pass through.
    assert_eq!(control.transmission_bandwidth(MTU * 10, true), 0);
    assert_eq!(control.retransmission_bandwidth(MTU * 10), MTU * 10);
}

#[test]
fn metrics_track_a_bursty_second() {
    let start = Instant::now();
    let mut metrics = ConnectionMetrics::new(start);

    for i in 0..10_u64 {
        metrics.record_sent(start + Duration::from_millis(i * 50), MTU);
    }
    metrics.record_resent(start + Duration::from_millis(600), MTU);
    metrics.record_received(start + Duration::from_millis(700), 512);
    metrics.record_acked(start + Duration::from_millis(750), MTU * 9);

    let later = start + Duration::from_secs(1);
    metrics.roll(later);

    let window = metrics.per_second();
    assert_eq!(window.bytes_sent, u64::from(MTU) * 10);
    assert_eq!(window.datagrams_sent, 10);
    assert_eq!(window.bytes_resent, u64::from(MTU));
    assert_eq!(metrics.totals().bytes_received, 512);
    assert_eq!(metrics.totals().bytes_acked, u64::from(MTU) * 9);
    assert!((metrics.loss_last_second() - 0.1).abs() < 1e-6);
    assert_eq!(metrics.elapsed(later), Duration::from_secs(1));
}
