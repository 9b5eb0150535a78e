//! Read side of the registry, shaped for the JSON endpoint.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{ProbeResult, Status};
use crate::registry::HostRegistry;

/// Aggregated view of one host at the moment it was read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostSnapshot {
    pub status: Status,
    pub avg_latency: f64,
    pub avg_packet_loss: f64,
    pub history: Vec<ProbeResult>,
}

/// Host name to snapshot, sorted by name.
pub type MetricsSnapshot = BTreeMap<String, HostSnapshot>;

/// Copy out the current state of every host.
///
/// Each host is read under its own lock, so a reader never sees a record
/// between an append and the eviction that follows it.
pub async fn snapshot(registry: &HostRegistry) -> MetricsSnapshot {
    let mut out = MetricsSnapshot::new();
    for (name, record) in registry.iter() {
        let record = record.lock().await;
        out.insert(
            name.to_string(),
            HostSnapshot {
                status: record.latest().status,
                avg_latency: record.average_latency(),
                avg_packet_loss: record.average_packet_loss(),
                history: record.history(),
            },
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unprobed_hosts_are_unknown() {
        let registry = HostRegistry::new(["10.0.0.1", "example.com"]).unwrap();
        let snap = snapshot(&registry).await;

        assert_eq!(snap.len(), 2);
        let host = &snap["example.com"];
        assert_eq!(host.status, Status::Unknown);
        assert_eq!(host.avg_latency, 0.0);
        assert_eq!(host.avg_packet_loss, 0.0);
        assert!(host.history.is_empty());
    }

    #[tokio::test]
    async fn snapshot_reflects_history() {
        let registry = HostRegistry::new(["a"]).unwrap();
        {
            let record = registry.get("a").unwrap();
            let mut record = record.lock().await;
            record.add_result(ProbeResult {
                latency: 4.0,
                packet_loss: 0.0,
                status: Status::Up,
                timestamp: 1,
            });
            record.add_result(ProbeResult {
                latency: 0.0,
                packet_loss: 100.0,
                status: Status::Down,
                timestamp: 2,
            });
        }

        let snap = snapshot(&registry).await;
        let host = &snap["a"];
        assert_eq!(host.status, Status::Down);
        assert_eq!(host.avg_latency, 2.0);
        assert_eq!(host.avg_packet_loss, 50.0);
        assert_eq!(host.history.len(), 2);
        assert_eq!(host.history[0].timestamp, 1);
    }

    #[tokio::test]
    async fn json_shape() {
        let registry = HostRegistry::new(["a"]).unwrap();
        let json = serde_json::to_value(snapshot(&registry).await).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "a": {"Status": "unknown", "AvgLatency": 0.0, "AvgPacketLoss": 0.0, "History": []}
            })
        );
    }
}
