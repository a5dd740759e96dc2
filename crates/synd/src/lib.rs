//! Synd service library
//!
//! Wires configuration, the graph flattener, the batch resolver and the
//! deobfuscation scanner into one [`SyndicationService`] that the `synd`
//! binary drives from batch files.
//!
//! # Batch files
//!
//! ```json
//! {
//!   "outputShape": "http://pn.schema.webshield.io/type#SubjectQueryRestriction",
//!   "dataModelId": "dm-person",
//!   "subjects":  [ { "@id": "...", "@type": ["..."], "givenName": "Alice" } ],
//!   "entities":  [ { "id": "...", "dataModelId": "...", "job": "...", "properties": {}, "subjects": [] } ],
//!   "records":   [ { "jti": "...", "pn_typ": "subject", "pn_pipe": "...", "pn_subject": {} } ]
//! }
//! ```
//!
//! `outputShape` falls back to the configured shape. `records` is only read
//! by the scanner, `subjects` only by the resolver.

pub mod config;
pub mod error;

pub use config::{IdentityConfig, LoggingConfig, ResolverConfig, RootConfig};
pub use error::{RootError, RootResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use synd_core::{DataModelId, GraphFlattener, IdGenerator, JobId, SignedRecord};
use synd_entity::{EntityProps, MaterializedRecord, OutputShape, SyndicatedEntity};
use synd_resolve::{BatchResolver, DeobfuscationRequirement, EntityInput, NodeFlattener, Scanner};
use tracing::info;

/// One resolution or scanning request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_shape: Option<OutputShape>,
    pub data_model_id: DataModelId,
    #[serde(default)]
    pub subjects: Vec<Value>,
    /// Entities in wire form.
    #[serde(default)]
    pub entities: Vec<Value>,
    /// Decoded signed record payloads.
    #[serde(default)]
    pub records: Vec<Value>,
}

impl BatchRequest {
    pub async fn from_file(path: &Path) -> RootResult<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }
}

pub struct SyndicationService {
    config: RootConfig,
    resolver: BatchResolver,
    scanner: Scanner,
}

impl SyndicationService {
    /// Build a service around the in-process [`NodeFlattener`].
    pub fn new(config: RootConfig) -> RootResult<Self> {
        Self::with_flattener(config, Arc::new(NodeFlattener))
    }

    pub fn with_flattener(
        config: RootConfig,
        flattener: Arc<dyn GraphFlattener>,
    ) -> RootResult<Self> {
        config.validate()?;
        let nested = config.resolver.nested_descriptors;
        info!(
            hostname = %config.identity.hostname,
            nested = ?nested,
            shape = %config.resolver.output_shape,
            "syndication service ready"
        );
        Ok(Self {
            resolver: BatchResolver::new(flattener).with_nested_policy(nested),
            scanner: Scanner::new(nested),
            config,
        })
    }

    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    /// Create an empty entity whose id is minted under the configured host.
    pub fn create_entity(
        &self,
        local_id: &str,
        data_model_id: &str,
        job_id: &str,
    ) -> RootResult<SyndicatedEntity> {
        Ok(SyndicatedEntity::create(
            local_id,
            &self.entity_props(data_model_id, job_id),
        )?)
    }

    pub fn create_entity_with(
        &self,
        ids: &dyn IdGenerator,
        data_model_id: &str,
        job_id: &str,
    ) -> RootResult<SyndicatedEntity> {
        Ok(SyndicatedEntity::create_with(
            ids,
            &self.entity_props(data_model_id, job_id),
        )?)
    }

    fn entity_props(&self, data_model_id: &str, job_id: &str) -> EntityProps {
        EntityProps::new(
            self.config.identity.hostname.clone(),
            DataModelId::new(data_model_id),
            JobId::new(job_id),
        )
    }

    /// Materialize every entity of `request`, in order.
    pub async fn resolve(&self, request: &BatchRequest) -> RootResult<Vec<MaterializedRecord>> {
        let shape = request
            .output_shape
            .as_ref()
            .unwrap_or(&self.config.resolver.output_shape);
        let entities: Vec<EntityInput> = request.entities.iter().cloned().map(Into::into).collect();

        let records = self
            .resolver
            .resolve_batch(shape, &request.data_model_id, &request.subjects, entities)
            .await?;
        info!(
            data_model = %request.data_model_id,
            records = records.len(),
            "batch resolved"
        );
        Ok(records)
    }

    /// Report the privacy actions needed before `request` can be read in clear.
    pub fn scan(&self, request: &BatchRequest) -> RootResult<Vec<DeobfuscationRequirement>> {
        let entities = request
            .entities
            .iter()
            .map(SyndicatedEntity::from_json)
            .collect::<Result<Vec<_>, _>>()?;
        let records = request
            .records
            .iter()
            .map(SignedRecord::from_json)
            .collect::<Result<Vec<_>, _>>()?;

        let required = self.scanner.scan(&entities, &records)?;
        info!(
            entities = entities.len(),
            records = records.len(),
            requirements = required.len(),
            "deobfuscation scan complete"
        );
        Ok(required)
    }
}
