//! Metrics endpoint driven by a live monitor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pingboard::{HostRegistry, Monitor, MonitorSettings, PingStats, ProbeError, Prober};
use serde_json::Value;

struct LossyProber;

#[async_trait]
impl Prober for LossyProber {
    async fn ping(&self, host: &str) -> Result<PingStats, ProbeError> {
        match host {
            "good" => Ok(PingStats {
                latency_ms: 12.0,
                packet_loss_pct: 0.0,
            }),
            "lossy" => Ok(PingStats {
                latency_ms: 30.0,
                packet_loss_pct: 50.0,
            }),
            _ => Err(ProbeError::Transport("unreachable".into())),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn metrics_reflect_polled_state() {
    let registry = Arc::new(HostRegistry::new(["good", "lossy", "gone", "offline"]).unwrap());
    let routes = pingboard::server::routes(Arc::clone(&registry));

    let settings = MonitorSettings {
        interval: Duration::from_secs(2),
        verbose: true,
    };
    let mut monitor = Monitor::new(Arc::clone(&registry), Arc::new(LossyProber), settings);
    monitor.start();

    let res = warp::test::request().path("/metrics").reply(&routes).await;
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    for host in ["good", "lossy", "gone"] {
        assert_eq!(body[host]["Status"], "unknown");
    }

    tokio::time::sleep(Duration::from_millis(4500)).await;
    monitor.stop().await;

    let res = warp::test::request().path("/metrics").reply(&routes).await;
    assert_eq!(res.status(), 200);
    let body: Value = serde_json::from_slice(res.body()).unwrap();

    assert_eq!(body["good"]["Status"], "up");
    assert_eq!(body["good"]["AvgLatency"], 12.0);
    assert_eq!(body["good"]["History"].as_array().unwrap().len(), 2);

    assert_eq!(body["lossy"]["Status"], "degraded");
    assert_eq!(body["lossy"]["AvgPacketLoss"], 50.0);

    assert_eq!(body["gone"]["Status"], "down");
    assert_eq!(body["gone"]["History"][0]["Latency"], 0.0);
    assert_eq!(body["gone"]["History"][0]["PacketLoss"], 100.0);

    assert_eq!(body["offline"]["Status"], "down");

    let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 4);
}
