//! The syndicated entity: a virtual record assembled from several subjects.
//!
//! Every output property carries a provenance pointer (node, node property,
//! signed record). The entity never holds values itself; values are pulled
//! from the backing subjects at materialization time.

use crate::descriptor::{PropertyDescriptor, PropertyMap, PropertyOptions, ScalarDescriptor};
use crate::error::{EntityError, EntityResult};
use synd_core::{
    is_keyword, is_valid_hostname, syndicated_entity_id, DataModelId, EntityId, IdGenerator,
    JobId, NodeId, RecordId,
};

/// Construction parameters for a new entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProps {
    /// Host minting the entity id.
    pub hostname: String,
    pub data_model_id: DataModelId,
    pub job_id: JobId,
}

impl EntityProps {
    pub fn new(
        hostname: impl Into<String>,
        data_model_id: impl Into<DataModelId>,
        job_id: impl Into<JobId>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            data_model_id: data_model_id.into(),
            job_id: job_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyndicatedEntity {
    id: EntityId,
    data_model_id: DataModelId,
    job_id: JobId,
    properties: PropertyMap,
    backing_subject_ids: Vec<NodeId>,
}

fn require(value: &str, what: &str) -> EntityResult<()> {
    if value.is_empty() {
        return Err(EntityError::InvalidArgument(format!("{} is missing", what)));
    }
    Ok(())
}

fn require_property_name(name: &str, what: &str) -> EntityResult<()> {
    require(name, what)?;
    if is_keyword(name) {
        return Err(EntityError::InvalidArgument(format!(
            "{} '{}' is a reserved graph keyword",
            what, name
        )));
    }
    Ok(())
}

impl SyndicatedEntity {
    /// Create an empty entity with an id minted from `hostname` and `local_id`.
    pub fn create(local_id: &str, props: &EntityProps) -> EntityResult<Self> {
        require(local_id, "id")?;
        require(&props.hostname, "hostname")?;
        if !is_valid_hostname(&props.hostname) {
            return Err(EntityError::InvalidArgument(format!(
                "hostname '{}' has no usable labels",
                props.hostname
            )));
        }
        require(props.data_model_id.as_str(), "data model id")?;
        require(props.job_id.as_str(), "job id")?;

        let id = EntityId::new(syndicated_entity_id(&props.hostname, local_id));
        tracing::debug!(entity = %id, job = %props.job_id, "created syndicated entity");

        Ok(Self::from_parts(
            id,
            props.data_model_id.clone(),
            props.job_id.clone(),
            PropertyMap::new(),
            Vec::new(),
        ))
    }

    /// Create an empty entity whose local id is drawn from `ids`.
    pub fn create_with(ids: &dyn IdGenerator, props: &EntityProps) -> EntityResult<Self> {
        Self::create(&ids.next(), props)
    }

    pub(crate) fn from_parts(
        id: EntityId,
        data_model_id: DataModelId,
        job_id: JobId,
        properties: PropertyMap,
        backing_subject_ids: Vec<NodeId>,
    ) -> Self {
        Self {
            id,
            data_model_id,
            job_id,
            properties,
            backing_subject_ids,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn data_model_id(&self) -> &DataModelId {
        &self.data_model_id
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn backing_subject_ids(&self) -> &[NodeId] {
        &self.backing_subject_ids
    }

    /// Map output property `name` to `source_property_name` on node
    /// `source_node_id`, as asserted by record `source_record_id`.
    ///
    /// Overwrites an existing descriptor at `name`. The node joins the
    /// backing-subject set if it is not already there; the set never shrinks.
    pub fn add_property(
        &mut self,
        name: &str,
        source_node_id: &str,
        source_property_name: &str,
        source_record_id: &str,
        opts: Option<&PropertyOptions>,
    ) -> EntityResult<()> {
        require_property_name(name, "property name")?;
        require(source_node_id, "source node id")?;
        require(source_property_name, "source property name")?;
        require(source_record_id, "source record id")?;

        let node = NodeId::new(source_node_id);
        let descriptor = ScalarDescriptor {
            source_node_id: node.clone(),
            source_property_name: source_property_name.to_string(),
            source_record_id: RecordId::new(source_record_id),
            value_type: opts.cloned().unwrap_or_default().resolved_value_type(),
        };
        self.properties
            .insert(name, PropertyDescriptor::Scalar(descriptor));

        // One to three backing subjects in practice; a linear scan is enough.
        if !self.backing_subject_ids.contains(&node) {
            self.backing_subject_ids.push(node);
        }
        Ok(())
    }

    /// Map `name.embedded_name` to a property of an embedded node.
    ///
    /// The object descriptor at `name` is created on first use. Embedded nodes
    /// are not registered as backing subjects.
    pub fn add_embedded_object_property(
        &mut self,
        name: &str,
        embedded_name: &str,
        embedded_node_id: &str,
        embedded_property_name: &str,
        source_record_id: &str,
        opts: Option<&PropertyOptions>,
    ) -> EntityResult<()> {
        require_property_name(name, "property name")?;
        require_property_name(embedded_name, "embedded property name")?;
        require(embedded_node_id, "embedded node id")?;
        require(embedded_property_name, "embedded source property name")?;
        require(source_record_id, "source record id")?;

        if !self.properties.contains_key(name) {
            self.properties.insert(
                name,
                PropertyDescriptor::Object {
                    properties: PropertyMap::new(),
                },
            );
        }

        let nested = ScalarDescriptor {
            source_node_id: NodeId::new(embedded_node_id),
            source_property_name: embedded_property_name.to_string(),
            source_record_id: RecordId::new(source_record_id),
            value_type: opts.cloned().unwrap_or_default().resolved_value_type(),
        };

        match self.properties.get_mut(name) {
            Some(PropertyDescriptor::Object { properties }) => {
                properties.insert(embedded_name, PropertyDescriptor::Scalar(nested));
                Ok(())
            }
            Some(PropertyDescriptor::Scalar(_)) => Err(EntityError::InvalidArgument(format!(
                "property '{}' is already a scalar and cannot hold embedded properties",
                name
            ))),
            None => Err(EntityError::InvalidArgument(format!(
                "property '{}' vanished while adding '{}'",
                name, embedded_name
            ))),
        }
    }
}
