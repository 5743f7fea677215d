//! Provisioning backend contract
//!
//! The engine never talks to a cloud provider itself. A [Backend] creates or looks up one named
//! resource at a time and exposes the outputs of what it created.
use crate::node::DeployOptions;
use crate::value::{Properties, Value};

pub trait Backend {
    /// Whatever the backend hands back for a created or looked-up resource
    type Handle: std::fmt::Debug;

    fn create(
        &mut self,
        type_id: &str,
        name: &str,
        properties: &Properties,
        options: &DeployOptions,
    ) -> Result<Self::Handle, BackendError>;

    fn lookup(&mut self, type_id: &str, id: &str) -> Result<Self::Handle, BackendError>;

    /// Output `attribute` of a created resource, if the resource has one
    fn read_output(&self, handle: &Self::Handle, attribute: &str) -> Option<Value>;
}

/// The backend rejected a call
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A call received by [PreviewBackend]
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum PreviewCall {
    Create {
        #[serde(rename = "type")]
        type_id: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
        properties: Properties,
    },
    Lookup {
        #[serde(rename = "type")]
        type_id: String,
        id: String,
    },
}

/// Backend that creates nothing and records what it was asked to do
///
/// Every output reads as `(known after apply: <name>.<attribute>)`.
#[derive(Debug, Default)]
pub struct PreviewBackend {
    calls: Vec<PreviewCall>,
}

#[derive(Debug, Clone)]
pub struct PreviewHandle {
    name: String,
}

impl PreviewBackend {
    pub fn calls(&self) -> &[PreviewCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<PreviewCall> {
        self.calls
    }
}

impl Backend for PreviewBackend {
    type Handle = PreviewHandle;

    fn create(
        &mut self,
        type_id: &str,
        name: &str,
        properties: &Properties,
        options: &DeployOptions,
    ) -> Result<Self::Handle, BackendError> {
        self.calls.push(PreviewCall::Create {
            type_id: type_id.to_string(),
            name: name.to_string(),
            provider: options.provider.clone(),
            properties: properties.clone(),
        });

        Ok(PreviewHandle {
            name: name.to_string(),
        })
    }

    fn lookup(&mut self, type_id: &str, id: &str) -> Result<Self::Handle, BackendError> {
        self.calls.push(PreviewCall::Lookup {
            type_id: type_id.to_string(),
            id: id.to_string(),
        });

        Ok(PreviewHandle {
            name: format!("{type_id}:{id}"),
        })
    }

    fn read_output(&self, handle: &Self::Handle, attribute: &str) -> Option<Value> {
        Some(Value::String(format!(
            "(known after apply: {}.{attribute})",
            handle.name
        )))
    }
}
