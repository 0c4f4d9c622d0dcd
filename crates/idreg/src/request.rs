//! Inbound and outbound shapes at the transport boundary.
//!
//! Whatever carries requests (HTTP handler, CLI, queue consumer) parses the
//! body into a [`RegisterRequest`], which enforces the registry's
//! preconditions, and renders the result as an [`IdentifierResponse`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use idreg_core::{Metadata, PublicId, RegistryRecord};

/// Reasons a request body is rejected before it reaches the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The body is not valid JSON.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// `namespace` or `entity_type` is missing, empty, or not a string.
    #[error("namespace and entity_type are required")]
    MissingIdentity,

    /// `metadata` is present but not an object.
    #[error("metadata must be an object")]
    MetadataNotObject,
}

/// A validated get-or-create request.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterRequest {
    namespace: String,
    entity_type: String,
    metadata: Metadata,
}

impl RegisterRequest {
    /// Build a request, rejecting an empty namespace or entity type.
    pub fn new(
        namespace: impl Into<String>,
        entity_type: impl Into<String>,
        metadata: Metadata,
    ) -> Result<Self, RequestError> {
        let namespace = namespace.into();
        let entity_type = entity_type.into();
        if namespace.is_empty() || entity_type.is_empty() {
            return Err(RequestError::MissingIdentity);
        }
        Ok(Self {
            namespace,
            entity_type,
            metadata,
        })
    }

    /// Parse a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| RequestError::MalformedBody(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Validate a decoded JSON body.
    ///
    /// A missing or null `metadata` means "no metadata".
    pub fn from_json(body: &Value) -> Result<Self, RequestError> {
        let Value::Object(fields) = body else {
            return Err(RequestError::MissingIdentity);
        };

        let text_field = |name: &str| match fields.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };
        let (Some(namespace), Some(entity_type)) =
            (text_field("namespace"), text_field("entity_type"))
        else {
            return Err(RequestError::MissingIdentity);
        };

        let metadata = match fields.get("metadata") {
            None | Some(Value::Null) => Metadata::new(),
            Some(Value::Object(map)) => Metadata::from(map.clone()),
            Some(_) => return Err(RequestError::MetadataNotObject),
        };

        Self::new(namespace, entity_type, metadata)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// The record as returned to callers.
///
/// The shape is identical for new and existing records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierResponse {
    pub uuid: PublicId,
    pub namespace: String,
    pub entity_type: String,
    pub metadata: BTreeMap<String, String>,
    pub created: String,
}

impl From<&RegistryRecord> for IdentifierResponse {
    fn from(record: &RegistryRecord) -> Self {
        Self {
            uuid: record.identifier,
            namespace: record.namespace.clone(),
            entity_type: record.entity_type.clone(),
            metadata: record.metadata.as_map().clone(),
            created: record.created(),
        }
    }
}

impl From<RegistryRecord> for IdentifierResponse {
    fn from(record: RegistryRecord) -> Self {
        Self::from(&record)
    }
}
