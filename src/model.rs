use serde::Serialize;
use std::collections::VecDeque;

use crate::prober::{PingStats, ProbeError};

/// Number of probe results kept per host.
pub const HISTORY_LIMIT: usize = 10;

/// Loss at or above this percentage marks a host as down.
pub const DOWN_LOSS_PCT: f64 = 80.0;

/// Loss at or above this percentage marks a host as degraded.
pub const DEGRADED_LOSS_PCT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Up,
    Degraded,
    Down,
    Unknown,
}

impl Status {
    /// Health state for a probe outcome. Only loss and failure matter.
    pub fn classify(failed: bool, packet_loss_pct: f64) -> Self {
        if failed || packet_loss_pct >= DOWN_LOSS_PCT {
            Status::Down
        } else if packet_loss_pct >= DEGRADED_LOSS_PCT {
            Status::Degraded
        } else {
            Status::Up
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Up => "up",
            Status::Degraded => "degraded",
            Status::Down => "down",
            Status::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified probe, as stored in a host's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProbeResult {
    pub latency: f64,
    pub packet_loss: f64,
    pub status: Status,
    pub timestamp: i64,
}

impl ProbeResult {
    /// Apply the classification policy to a raw prober outcome.
    ///
    /// A failed probe is recorded as total loss. Whenever loss is total the
    /// latency reading is discarded and stored as zero.
    pub fn from_outcome(outcome: &Result<PingStats, ProbeError>, timestamp: i64) -> Self {
        let (latency, packet_loss) = match outcome {
            Ok(stats) => (stats.latency_ms, stats.packet_loss_pct.clamp(0.0, 100.0)),
            Err(_) => (0.0, 100.0),
        };
        let status = Status::classify(outcome.is_err(), packet_loss);
        let latency = if outcome.is_err() || packet_loss >= 100.0 {
            0.0
        } else {
            latency
        };

        Self {
            latency,
            packet_loss,
            status,
            timestamp,
        }
    }

    /// Placeholder returned for a host that has not been probed yet.
    pub fn unknown() -> Self {
        Self {
            latency: 0.0,
            packet_loss: 0.0,
            status: Status::Unknown,
            timestamp: 0,
        }
    }
}

/// Bounded probe history for a single host.
#[derive(Debug, Clone)]
pub struct HostRecord {
    name: String,
    history: VecDeque<ProbeResult>,
}

impl HostRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            history: VecDeque::with_capacity(HISTORY_LIMIT + 1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a result, evicting the oldest one once the window is full.
    pub fn add_result(&mut self, result: ProbeResult) {
        self.history.push_back(result);
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }

    pub fn latest(&self) -> ProbeResult {
        self.history
            .back()
            .copied()
            .unwrap_or_else(ProbeResult::unknown)
    }

    pub fn average_latency(&self) -> f64 {
        self.mean(|r| r.latency)
    }

    pub fn average_packet_loss(&self) -> f64 {
        self.mean(|r| r.packet_loss)
    }

    /// Oldest first.
    pub fn history(&self) -> Vec<ProbeResult> {
        self.history.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    fn mean(&self, field: impl Fn(&ProbeResult) -> f64) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().map(field).sum::<f64>() / self.history.len() as f64
    }
}
