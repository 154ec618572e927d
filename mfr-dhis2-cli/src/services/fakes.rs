//! In-memory stand-ins for DHIS2 and the failed queue, used by service tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::failed_queue::{FailedQueue, FailedQueueEntry};
use crate::api::{ApiError, DataStoreApi, OrgUnitApi};
use crate::models::{OrgUnit, OrgUnitParent, OrgUnitPayload};

pub fn status_error(status: u16) -> ApiError {
    ApiError::Status {
        url: "http://fake-dhis2/api".to_string(),
        status,
        body: String::new(),
        attempts: 1,
    }
}

pub fn transport_error() -> ApiError {
    ApiError::Transport {
        url: "http://fake-dhis2/api".to_string(),
        message: "connection refused".to_string(),
        attempts: 10,
    }
}

/// A call made against [`FakeOrgUnitApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetById(String),
    GetByCode(String),
    FindByName(String),
    Create { code: String, parent_id: String },
    Update(String),
}

#[derive(Default)]
struct OrgUnitState {
    org_units: Vec<OrgUnit>,
    calls: Vec<Call>,
    created: u32,
}

#[derive(Default)]
pub struct FakeOrgUnitApi {
    state: Mutex<OrgUnitState>,
    fail_lookups: bool,
    fail_create_codes: HashSet<String>,
    fail_updates: bool,
}

impl FakeOrgUnitApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org_unit(self, id: &str, code: Option<&str>, name: &str, parent: Option<&str>) -> Self {
        self.state.lock().unwrap().org_units.push(OrgUnit {
            id: id.to_string(),
            code: code.map(str::to_string),
            name: name.to_string(),
            short_name: None,
            parent: parent.map(OrgUnitParent::new),
        });
        self
    }

    /// Every lookup fails with a transport error
    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Creating an org unit with this code is rejected with HTTP 409
    pub fn failing_create(mut self, code: &str) -> Self {
        self.fail_create_codes.insert(code.to_string());
        self
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn creates(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Create { .. }))
            .collect()
    }

    pub fn updates(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Update(_)))
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn lookup_guard(&self) -> Result<(), ApiError> {
        if self.fail_lookups {
            Err(transport_error())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrgUnitApi for FakeOrgUnitApi {
    async fn get_by_id(&self, id: &str) -> Result<Option<OrgUnit>, ApiError> {
        self.record(Call::GetById(id.to_string()));
        self.lookup_guard()?;
        let state = self.state.lock().unwrap();
        Ok(state.org_units.iter().find(|o| o.id == id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<OrgUnit>, ApiError> {
        self.record(Call::GetByCode(code.to_string()));
        self.lookup_guard()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .org_units
            .iter()
            .find(|o| o.code.as_deref() == Some(code))
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<OrgUnit>, ApiError> {
        self.record(Call::FindByName(name.to_string()));
        self.lookup_guard()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .org_units
            .iter()
            .filter(|o| o.name == name)
            .cloned()
            .collect())
    }

    async fn create(&self, payload: &OrgUnitPayload, parent_id: &str) -> Result<String, ApiError> {
        self.record(Call::Create {
            code: payload.code.clone(),
            parent_id: parent_id.to_string(),
        });
        if self.fail_create_codes.contains(&payload.code) {
            return Err(status_error(409));
        }

        let mut state = self.state.lock().unwrap();
        state.created += 1;
        let id = format!("ouNew{}", state.created);
        state.org_units.push(OrgUnit {
            id: id.clone(),
            code: Some(payload.code.clone()),
            name: payload.name.clone(),
            short_name: Some(payload.short_name.clone()),
            parent: Some(OrgUnitParent::new(parent_id)),
        });
        Ok(id)
    }

    async fn update(&self, id: &str, payload: &OrgUnitPayload) -> Result<String, ApiError> {
        self.record(Call::Update(id.to_string()));
        if self.fail_updates {
            return Err(status_error(500));
        }

        let mut state = self.state.lock().unwrap();
        let Some(org_unit) = state.org_units.iter_mut().find(|o| o.id == id) else {
            return Err(status_error(404));
        };
        org_unit.name = payload.name.clone();
        org_unit.code = Some(payload.code.clone());
        Ok(id.to_string())
    }
}

/// A write made against [`FakeDataStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Put(String),
    Post(String),
}

#[derive(Default)]
pub struct FakeDataStore {
    entries: Mutex<HashMap<(String, String), Value>>,
    writes: Mutex<Vec<StoreWrite>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl FakeDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, namespace: &str, key: &str, value: Value) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert((namespace.to_string(), key.to_string()), value);
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn writes(&self) -> Vec<StoreWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn entry(&self, namespace: &str, key: &str) -> Option<Value> {
        self.entries
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }

    fn write(&self, namespace: &str, key: &str, value: &Value, write: StoreWrite) -> Result<(), ApiError> {
        self.writes.lock().unwrap().push(write);
        if self.fail_writes {
            return Err(transport_error());
        }
        self.entries
            .lock()
            .unwrap()
            .insert((namespace.to_string(), key.to_string()), value.clone());
        Ok(())
    }
}

#[async_trait]
impl DataStoreApi for FakeDataStore {
    async fn get_entry(&self, namespace: &str, key: &str) -> Result<Option<Value>, ApiError> {
        if self.fail_reads {
            return Err(status_error(500));
        }
        Ok(self.entry(namespace, key))
    }

    async fn put_entry(&self, namespace: &str, key: &str, value: &Value) -> Result<(), ApiError> {
        self.write(namespace, key, value, StoreWrite::Put(key.to_string()))
    }

    async fn post_entry(&self, namespace: &str, key: &str, value: &Value) -> Result<(), ApiError> {
        self.write(namespace, key, value, StoreWrite::Post(key.to_string()))
    }
}

#[derive(Default)]
pub struct MemoryQueue {
    entries: Mutex<Vec<FailedQueueEntry>>,
    broken: bool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue whose every enqueue fails
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<FailedQueueEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn facility_ids(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.facility_id).collect()
    }
}

#[async_trait]
impl FailedQueue for MemoryQueue {
    async fn enqueue(&self, entry: FailedQueueEntry) -> anyhow::Result<()> {
        if self.broken {
            anyhow::bail!("queue unavailable");
        }
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}
