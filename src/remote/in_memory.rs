//! InMemoryMarkerRepository - Vec-backed remote store for tests and development.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use super::{MarkerRecord, MarkerRepository, RemoteError};
use crate::geo::LatLng;
use crate::marker::MarkerId;

/// One call received by the store, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    List,
    Create(Option<MarkerId>),
    Update(MarkerId, LatLng),
    Delete(MarkerId),
}

#[derive(Debug, Default)]
struct Faults {
    offline: bool,
    fail_next: usize,
}

/// In-memory remote store.
///
/// Store-assigned keys are `doc-{n}`. Clone-friendly via Arc: clones share
/// the same records, call log and fault settings, so a test can keep a
/// handle while the session owns another.
#[derive(Clone)]
pub struct InMemoryMarkerRepository {
    records: Arc<RwLock<Vec<MarkerRecord>>>,
    calls: Arc<Mutex<Vec<RemoteCall>>>,
    faults: Arc<Mutex<Faults>>,
    seq: Arc<AtomicU64>,
    latency: Option<Duration>,
}

impl Default for InMemoryMarkerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMarkerRepository {
    pub fn new() -> Self {
        InMemoryMarkerRepository {
            records: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            faults: Arc::new(Mutex::new(Faults::default())),
            seq: Arc::new(AtomicU64::new(1)),
            latency: None,
        }
    }

    /// Pre-populate the store (e.g. to test startup load).
    pub fn with_records(records: Vec<MarkerRecord>) -> Self {
        let repo = Self::new();
        if let Ok(mut stored) = repo.records.write() {
            *stored = records;
        }
        repo
    }

    /// Delay every call by `latency` before it is served.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// While offline every call fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.offline = offline;
        }
    }

    /// Fail the next `n` calls with a transport error.
    pub fn fail_next(&self, n: usize) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.fail_next = n;
        }
    }

    pub fn records(&self) -> Vec<MarkerRecord> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &MarkerId) -> Option<MarkerRecord> {
        self.records
            .read()
            .ok()
            .and_then(|records| records.iter().find(|r| &r.id == id).cloned())
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    async fn begin(&self, call: RemoteCall) -> Result<(), RemoteError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.calls
            .lock()
            .map_err(|_| RemoteError::LockPoisoned("call log"))?
            .push(call);

        let mut faults = self
            .faults
            .lock()
            .map_err(|_| RemoteError::LockPoisoned("faults"))?;
        if faults.offline {
            return Err(RemoteError::Transport("store offline".into()));
        }
        if faults.fail_next > 0 {
            faults.fail_next -= 1;
            return Err(RemoteError::Transport("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MarkerRepository for InMemoryMarkerRepository {
    async fn list(&self) -> Result<Vec<MarkerRecord>, RemoteError> {
        self.begin(RemoteCall::List).await?;
        let records = self
            .records
            .read()
            .map_err(|_| RemoteError::LockPoisoned("read"))?;
        Ok(records.clone())
    }

    async fn create(&self, id: Option<&MarkerId>, at: LatLng) -> Result<MarkerId, RemoteError> {
        self.begin(RemoteCall::Create(id.cloned())).await?;
        let id = match id {
            Some(id) => id.clone(),
            None => MarkerId::new(format!("doc-{}", self.seq.fetch_add(1, Ordering::Relaxed))),
        };

        let mut records = self
            .records
            .write()
            .map_err(|_| RemoteError::LockPoisoned("write"))?;
        let record = MarkerRecord::new(id.clone(), at);
        match records.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(id)
    }

    async fn update(&self, id: &MarkerId, at: LatLng) -> Result<(), RemoteError> {
        self.begin(RemoteCall::Update(id.clone(), at)).await?;
        let mut records = self
            .records
            .write()
            .map_err(|_| RemoteError::LockPoisoned("write"))?;
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.clone()))?;
        record.lat = at.lat;
        record.lng = at.lng;
        Ok(())
    }

    async fn delete(&self, id: &MarkerId) -> Result<(), RemoteError> {
        self.begin(RemoteCall::Delete(id.clone())).await?;
        let mut records = self
            .records
            .write()
            .map_err(|_| RemoteError::LockPoisoned("write"))?;
        let index = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.clone()))?;
        records.remove(index);
        Ok(())
    }
}
