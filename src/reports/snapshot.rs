//! In-memory snapshot of the four upstream collections.
//!
//! The backend of record owns the data; the engine holds a read-only
//! snapshot that is replaced wholesale on every refresh, never patched
//! field by field. A failed fetch for one entity falls back to an empty
//! collection so a partial report can still be computed.

use super::domain::{Employee, Followup, Interaction, Lead};
use super::normalize::{
    normalize_employee, normalize_followup, normalize_interaction, normalize_lead,
    unwrap_collection,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream returned status {0}")]
    Status(u16),
}

/// Boundary to the REST collaborator. Implementations fetch one raw
/// collection per call; the shape (envelope or bare array) is not under
/// this engine's control.
pub trait SnapshotSource {
    fn fetch_leads(&self) -> Result<Value, FetchError>;
    fn fetch_interactions(&self) -> Result<Value, FetchError>;
    fn fetch_followups(&self) -> Result<Value, FetchError>;
    fn fetch_employees(&self) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub leads: Vec<Lead>,
    pub interactions: Vec<Interaction>,
    pub followups: Vec<Followup>,
    pub employees: Vec<Employee>,
}

impl Snapshot {
    /// Build a snapshot from already-fetched raw payloads.
    pub fn from_raw(
        leads: &Value,
        interactions: &Value,
        followups: &Value,
        employees: &Value,
    ) -> Self {
        Self {
            leads: unwrap_collection(leads).iter().map(normalize_lead).collect(),
            interactions: unwrap_collection(interactions)
                .iter()
                .map(normalize_interaction)
                .collect(),
            followups: unwrap_collection(followups)
                .iter()
                .map(normalize_followup)
                .collect(),
            employees: unwrap_collection(employees)
                .iter()
                .map(normalize_employee)
                .collect(),
        }
    }

    /// Refresh from the collaborator. Each entity that fails to fetch is
    /// logged and replaced by an empty collection; the report degrades
    /// to partial rather than aborting.
    pub fn load<S: SnapshotSource>(source: &S) -> Self {
        Self::from_raw(
            &fetched_or_empty("leads", source.fetch_leads()),
            &fetched_or_empty("interactions", source.fetch_interactions()),
            &fetched_or_empty("followups", source.fetch_followups()),
            &fetched_or_empty("employees", source.fetch_employees()),
        )
    }

    /// Employee directory keyed by id, used for executive resolution.
    pub fn directory(&self) -> HashMap<String, Employee> {
        self.employees
            .iter()
            .filter(|employee| !employee.id.is_empty())
            .map(|employee| (employee.id.clone(), employee.clone()))
            .collect()
    }
}

fn fetched_or_empty(entity: &str, result: Result<Value, FetchError>) -> Value {
    match result {
        Ok(value) => value,
        Err(error) => {
            warn!(entity, %error, "fetch failed; continuing with an empty collection");
            Value::Array(Vec::new())
        }
    }
}

/// Subscription channel for the cross-component "activity saved"
/// notification. The persistence collaborator broadcasts after it saves
/// a new interaction or followup; subscribers re-fetch their snapshot.
/// Fire-and-forget: delivery order across concurrent refreshes is
/// last-write-wins.
#[derive(Default)]
pub struct ChangeBus {
    subscribers: Mutex<Vec<Box<dyn Fn() + Send + Sync>>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(Box::new(callback));
        }
    }

    pub fn notify(&self) {
        if let Ok(subscribers) = self.subscribers.lock() {
            for subscriber in subscribers.iter() {
                subscriber();
            }
        }
    }
}
