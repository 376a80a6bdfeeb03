//! Drives the congestion engine over a simulated lossy link.
//!
//! No sockets are involved. A synthetic clock advances in fixed ticks, the
//! "link" delays each ACK by its round trip and drops a configurable
//! fraction of datagrams, and lost datagrams come back through the resend
//! path once their timeout expires.
//!
//! ```text
//! cargo run -p headwind --example simulated_link
//! cargo run -p headwind --example simulated_link -- 0.05 3000
//! ```
//!
//! The first argument is the loss rate, the second the number of ticks.

use std::env;
use std::time::{Duration, Instant};

use headwind::{Config, CongestionControl, ConnectionMetrics, WindowPhase};
use tracing::info;

const TICK: Duration = Duration::from_millis(10);
const LINK_RTT: Duration = Duration::from_millis(80);

#[derive(Clone, Copy)]
struct InFlight {
    sequence_number: u32,
    bytes: u32,
    sent_at: Instant,
    /// When the ACK would arrive, were the datagram delivered.
    ack_at: Instant,
    lost: bool,
    times_sent: u8,
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = env::args().skip(1);
    let loss_rate: f64 = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0.02);
    let ticks: u32 = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(2000);

    let config = Config::default();
    let start = Instant::now();
    let mut control = CongestionControl::new(&config, start).expect("default config is valid");
    let mut metrics = ConnectionMetrics::new(start);

    let mtu = control.mtu();
    let mut in_flight: Vec<InFlight> = Vec::new();
    let mut unacked_bytes: u32 = 0;
    let mut now = start;

    info!("simulating {} ticks at {:.1}% loss", ticks, loss_rate * 100.0);

    for tick in 0..ticks {
        now += TICK;
        control.update(now, !in_flight.is_empty());

        // ACKs that the link has finished carrying.
        let mut acked: Vec<InFlight> = Vec::new();
        in_flight.retain(|datagram| {
            if !datagram.lost && datagram.ack_at <= now {
                acked.push(*datagram);
                false
            } else {
                true
            }
        });
        for datagram in acked {
            let round_trip = now.duration_since(datagram.sent_at);
            control.on_ack(
                now,
                round_trip,
                None,
                u64::from(datagram.bytes),
                true,
                datagram.sequence_number,
            );
            metrics.record_acked(now, datagram.bytes);
            unacked_bytes = unacked_bytes.saturating_sub(datagram.bytes);
        }

        // Lost datagrams whose resend timeout has expired go out again.
        for datagram in in_flight.iter_mut() {
            let timeout = control.retransmission_timeout(datagram.times_sent);
            if datagram.lost && now >= datagram.sent_at + timeout {
                control.on_resend(now, now + timeout);
                datagram.sent_at = now;
                datagram.ack_at = now + LINK_RTT;
                datagram.lost = rand::random::<f64>() < loss_rate;
                datagram.times_sent = datagram.times_sent.saturating_add(1);
                metrics.record_resent(now, datagram.bytes);
            }
        }

        // Fill whatever room the window has left.
        let mut budget = control.transmission_bandwidth(unacked_bytes, true);
        while budget >= mtu {
            let sequence_number = control.take_next_sequence_number();
            in_flight.push(InFlight {
                sequence_number,
                bytes: mtu,
                sent_at: now,
                ack_at: now + LINK_RTT,
                lost: rand::random::<f64>() < loss_rate,
                times_sent: 1,
            });
            control.on_sent_bytes(now, mtu);
            metrics.record_sent(now, mtu);
            unacked_bytes += mtu;
            budget -= mtu;
        }

        if tick % 100 == 0 {
            metrics.roll(now);
            info!(
                "t={:>5}ms cwnd={:>6.0} phase={:?} in_flight={} srtt={:?}",
                now.duration_since(start).as_millis(),
                control.congestion_window(),
                control.phase(),
                in_flight.len(),
                control.rtt().smoothed_rtt().unwrap_or_default(),
            );
        }
    }

    metrics.roll(now);
    println!("{metrics:#}");
    println!(
        "final window {:.0} bytes, {:?}",
        control.congestion_window(),
        control.phase()
    );
    if control.phase() == WindowPhase::CongestionAvoidance {
        println!(
            "threshold {:.0} bytes",
            control.slow_start_threshold().unwrap_or_default()
        );
    }
}
