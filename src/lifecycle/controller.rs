//! Lifecycle Controller
//!
//! Drives one HTTP resource through create, read, update and deactivate by
//! composing the Converter, the Wire Codec and a [`Transport`].
//!
//! Every operation issues its requests one after another and never retries.
//! Create in particular is not safe to re-invoke after an ambiguous failure
//! (timeout, dropped connection): the server may already have created the
//! resource, and a second call creates a duplicate. When the create was
//! accepted but the read-back fails, the error is
//! [`CdnError::CreatedButUnread`] and still carries the new identifier.
//! Callers must also
//! serialize updates for the same identifier; there is no concurrency token.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{HttpTransport, Method, Transport};
use crate::codec::{self, Acknowledgment};
use crate::config::ProviderConfig;
use crate::convert::{Converter, DesiredTree, ObservedTree};
use crate::drift::{self, Drift};
use crate::error::{CdnError, Result};
use crate::model::HttpResource;
use crate::schema::{ConversionWarning, Phase};

/// Result of a successful create
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    pub id: String,
    pub observed: ObservedTree,
    pub warnings: Vec<ConversionWarning>,
}

/// Result of a successful update
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub observed: ObservedTree,
    pub warnings: Vec<ConversionWarning>,
}

/// Lifecycle operations for CDN HTTP resources of one account
pub struct HttpResourceController {
    transport: Arc<dyn Transport>,
    converter: Converter,
}

impl HttpResourceController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            converter: Converter::new(),
        }
    }

    /// Authenticate and build a controller over the HTTP transport
    pub async fn connect(config: ProviderConfig) -> Result<Self> {
        let transport = HttpTransport::connect(config).await?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Create a resource, then read it back for the canonical document
    pub async fn create(&self, desired: &DesiredTree) -> Result<CreateOutcome> {
        let conversion = self.converter.to_typed_model(desired, Phase::Create)?;
        let body = codec::encode(&conversion.model)?;

        info!("Creating http resource {:?}", desired.str_attr("name").unwrap_or_default());
        let reply = self.transport.send(Method::Post, "", Some(body)).await?;
        let ack = codec::decode_acknowledgment(&reply)?;
        if !ack.is_accepted() {
            return Err(rejected_create(ack));
        }
        if ack.resource_id.is_empty() {
            return Err(CdnError::MalformedPayload {
                path: "resource_id".to_string(),
                expected: "resource identifier".to_string(),
                actual: "empty string".to_string(),
            });
        }
        debug!(task_id = %ack.task_id, "Create accepted");

        let observed = match self.read(&ack.resource_id).await {
            Ok(observed) => observed,
            Err(source) => {
                return Err(CdnError::CreatedButUnread {
                    id: ack.resource_id,
                    source: Box::new(source),
                })
            }
        };
        info!("Created http resource {}", ack.resource_id);

        Ok(CreateOutcome {
            id: ack.resource_id,
            observed,
            warnings: conversion.warnings,
        })
    }

    /// Fetch the current document as an observed tree
    pub async fn read(&self, id: &str) -> Result<ObservedTree> {
        let model = self.read_model(id).await?;
        self.converter.to_observed_tree(&model)
    }

    /// Fetch the current document as a typed model
    pub async fn read_model(&self, id: &str) -> Result<HttpResource> {
        require_id(id)?;
        debug!("Reading http resource {}", id);
        let body = match self.transport.send(Method::Get, id, None).await {
            Ok(body) => body,
            Err(CdnError::Transport { status: 404, .. }) => {
                return Err(CdnError::NotFound { id: id.to_string() })
            }
            Err(e) => return Err(e),
        };
        codec::decode(&body)
    }

    /// Replace the whole document, then read it back
    pub async fn update(&self, id: &str, desired: &DesiredTree) -> Result<UpdateOutcome> {
        require_id(id)?;
        let conversion = self.converter.to_typed_model(desired, Phase::Update)?;
        let body = codec::encode(&conversion.model)?;

        info!("Updating http resource {}", id);
        let reply = self.transport.send(Method::Put, id, Some(body)).await?;
        let ack = codec::decode_acknowledgment(&reply)?;
        if !ack.is_accepted() {
            return Err(rejected_update(ack));
        }

        let observed = self.read(id).await?;
        info!("Updated http resource {}", id);

        Ok(UpdateOutcome {
            observed,
            warnings: conversion.warnings,
        })
    }

    /// Switch the resource off. The server keeps it; nothing is re-read.
    pub async fn deactivate(&self, id: &str) -> Result<()> {
        require_id(id)?;
        info!("Deactivating http resource {}", id);
        let body = codec::encode_deactivation()?;
        let reply = self.transport.send(Method::Patch, id, Some(body)).await?;
        let ack = codec::decode_acknowledgment(&reply)?;
        if !ack.is_accepted() {
            return Err(rejected_update(ack));
        }
        info!("Deactivated http resource {}", id);
        Ok(())
    }

    /// Every resource of the account
    pub async fn list(&self) -> Result<Vec<ObservedTree>> {
        let body = self.transport.send(Method::Get, "", None).await?;
        let resources = codec::decode_list(&body)?;
        debug!(count = resources.len(), "Listed http resources");

        resources
            .iter()
            .map(|model| self.converter.to_observed_tree(model))
            .collect()
    }

    /// Read the resource and report where it differs from `desired`
    pub async fn plan(&self, id: &str, desired: &DesiredTree) -> Result<Vec<Drift>> {
        let conversion = self.converter.to_typed_model(desired, Phase::Update)?;
        let observed = self.read_model(id).await?;
        drift::detect(&conversion.model, &observed)
    }
}

/// An empty identifier would address the collection instead of a resource
fn require_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(CdnError::NotFound { id: String::new() });
    }
    Ok(())
}

fn rejected_create(ack: Acknowledgment) -> CdnError {
    CdnError::CreateRejected {
        message: ack.message,
        description: ack.description,
    }
}

fn rejected_update(ack: Acknowledgment) -> CdnError {
    CdnError::UpdateRejected {
        message: ack.message,
        description: ack.description,
    }
}
