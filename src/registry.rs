use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::ConfigError;
use crate::model::HostRecord;

pub type SharedRecord = Arc<Mutex<HostRecord>>;

/// Fixed set of monitored hosts, built once at startup.
///
/// Each record sits behind its own lock so a poller appending to one host
/// never blocks readers of another.
#[derive(Debug)]
pub struct HostRegistry {
    hosts: BTreeMap<String, SharedRecord>,
}

impl HostRegistry {
    /// Build a registry with an empty record per host. Duplicate names
    /// share one record.
    pub fn new<I, S>(hosts: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hosts: BTreeMap<String, SharedRecord> = hosts
            .into_iter()
            .map(|name| {
                let name: String = name.into();
                let record = Arc::new(Mutex::new(HostRecord::new(name.clone())));
                (name, record)
            })
            .collect();

        if hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        Ok(Self { hosts })
    }

    pub fn get(&self, host: &str) -> Option<SharedRecord> {
        self.hosts.get(host).cloned()
    }

    /// Host names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedRecord)> {
        self.hosts.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProbeResult, Status};

    #[test]
    fn empty_host_list_is_rejected() {
        let err = HostRegistry::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ConfigError::NoHosts));
    }

    #[test]
    fn duplicates_collapse() {
        let registry = HostRegistry::new(["b", "a", "b"]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn records_are_independent() {
        let registry = HostRegistry::new(["a", "b"]).unwrap();
        let a = registry.get("a").unwrap();
        a.lock().await.add_result(ProbeResult {
            latency: 1.0,
            packet_loss: 0.0,
            status: Status::Up,
            timestamp: 1,
        });

        assert_eq!(a.lock().await.len(), 1);
        assert!(registry.get("b").unwrap().lock().await.is_empty());
        assert!(registry.get("c").is_none());
        assert_eq!(a.lock().await.name(), "a");
    }
}
