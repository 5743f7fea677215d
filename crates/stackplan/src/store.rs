//! Run-scoped output store
//!
//! Outputs are keyed `"<resource_name>.<attribute>"`. A store lives for exactly one deployment
//! run and only grows during it. Concurrent runs must each use their own store.
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct OutputStore {
    deployed: IndexSet<String>,
    outputs: IndexMap<String, Value>,
}

impl OutputStore {
    pub fn key(resource: &str, attribute: &str) -> String {
        format!("{resource}.{attribute}")
    }

    /// Marks a resource as created (or looked up) in this run
    pub fn mark_deployed(&mut self, resource: &str) {
        self.deployed.insert(resource.to_string());
    }

    pub fn is_deployed(&self, resource: &str) -> bool {
        self.deployed.contains(resource)
    }

    /// Names of deployed resources, in deployment order
    pub fn deployed(&self) -> impl Iterator<Item = &str> {
        self.deployed.iter().map(String::as_str)
    }

    pub fn record(&mut self, resource: &str, attribute: &str, value: Value) {
        let key = Self::key(resource, attribute);
        tracing::trace!(%key, ?value, "recording output");
        if self.outputs.insert(key, value).is_some() {
            tracing::warn!(resource, attribute, "output recorded twice, keeping the latest");
        }
    }

    pub fn get(&self, resource: &str, attribute: &str) -> Option<&Value> {
        self.outputs.get(&Self::key(resource, attribute))
    }

    /// All outputs as `(key, value)`, in recording order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.outputs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
