//! Reachability probing.
//!
//! The monitor only sees the [`Prober`] trait. [`IcmpProber`] is the
//! production implementation on top of `ping-rs`; tests plug in fakes.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

pub use crate::error::ProbeError;

const PING_DATA: [u8; 24] = [
    0x70, 0x69, 0x6e, 0x67, 0x62, 0x6f, 0x61, 0x72, 0x64, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05,
    0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
];

/// Raw statistics from one probe exchange.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingStats {
    pub latency_ms: f64,
    /// 0 to 100. 100 means no echo came back.
    pub packet_loss_pct: f64,
}

#[async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Run one probe exchange against `host`.
    ///
    /// Partial or total loss is a successful probe. An error means probing
    /// could not happen at all (unresolvable host, socket failure).
    async fn ping(&self, host: &str) -> Result<PingStats, ProbeError>;
}

/// ICMP echo prober.
#[derive(Debug, Clone)]
pub struct IcmpProber {
    count: u32,
    timeout: Duration,
}

impl IcmpProber {
    pub fn new(count: u32, timeout: Duration) -> Self {
        Self {
            count: count.max(1),
            timeout,
        }
    }
}

impl Default for IcmpProber {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn ping(&self, host: &str) -> Result<PingStats, ProbeError> {
        let ip = resolve_host(host).await?;
        let count = self.count;
        let timeout = self.timeout;

        let rtts = tokio::task::spawn_blocking(move || echo_round(&ip, count, timeout)).await??;
        Ok(summarize(&rtts, count))
    }
}

/// Send `count` echo requests, returning the round-trip time of every reply.
fn echo_round(ip: &IpAddr, count: u32, timeout: Duration) -> Result<Vec<u32>, ProbeError> {
    let options = ping_rs::PingOptions {
        ttl: 128,
        dont_fragment: true,
    };
    let mut rtts = Vec::with_capacity(count as usize);
    for _ in 0..count {
        match ping_rs::send_ping(ip, timeout, &PING_DATA, Some(&options)) {
            Ok(reply) => rtts.push(reply.rtt),
            Err(ping_rs::PingError::TimedOut) => {}
            Err(e) => return Err(ProbeError::Transport(format!("{:?}", e))),
        }
    }
    Ok(rtts)
}

fn summarize(rtts: &[u32], sent: u32) -> PingStats {
    if rtts.is_empty() || sent == 0 {
        return PingStats {
            latency_ms: 0.0,
            packet_loss_pct: 100.0,
        };
    }
    let received = rtts.len() as f64;
    let latency_ms = rtts.iter().map(|&rtt| rtt as f64).sum::<f64>() / received;
    let packet_loss_pct = (sent as f64 - received) / sent as f64 * 100.0;
    PingStats {
        latency_ms,
        packet_loss_pct,
    }
}

async fn resolve_host(host: &str) -> Result<IpAddr, ProbeError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let mut addrs = tokio::net::lookup_host(format!("{host}:0"))
        .await
        .map_err(|source| ProbeError::Resolve {
            host: host.to_string(),
            source,
        })?;
    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ProbeError::NoAddress(host.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_all_replies() {
        let stats = summarize(&[10, 20, 30], 3);
        assert_eq!(stats.latency_ms, 20.0);
        assert_eq!(stats.packet_loss_pct, 0.0);
    }

    #[test]
    fn summarize_partial_loss() {
        let stats = summarize(&[12], 4);
        assert_eq!(stats.latency_ms, 12.0);
        assert_eq!(stats.packet_loss_pct, 75.0);
    }

    #[test]
    fn summarize_total_loss() {
        let stats = summarize(&[], 3);
        assert_eq!(stats.latency_ms, 0.0);
        assert_eq!(stats.packet_loss_pct, 100.0);
    }

    #[test]
    fn count_is_at_least_one() {
        let prober = IcmpProber::new(0, Duration::from_millis(100));
        assert_eq!(prober.count, 1);
    }

    #[tokio::test]
    async fn resolve_literal_ip() {
        let ip = resolve_host("127.0.0.1").await.unwrap();
        assert_eq!(ip, "127.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn resolve_invalid_name_fails() {
        let err = resolve_host("no such host.invalid").await.unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Resolve { .. } | ProbeError::NoAddress(_)
        ));
    }
}
