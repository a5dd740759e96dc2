//! Materialization: turn an entity's provenance pointers into a concrete record.
//!
//! Pure function of its inputs. Values are copied verbatim from the indexed
//! nodes; obfuscated envelopes stay obfuscated.

use crate::descriptor::{PropertyDescriptor, PropertyMap, ScalarDescriptor};
use crate::entity::SyndicatedEntity;
use crate::error::{EntityError, EntityResult};
use crate::index::NodeIndex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use synd_core::{is_keyword, DataModelId, EntityId};

/// Type URI of the subject query restriction shape.
pub const SUBJECT_QUERY_RESTRICTION: &str =
    "http://pn.schema.webshield.io/type#SubjectQueryRestriction";

// ---------------------------------------------------------------------------
// OutputShape
// ---------------------------------------------------------------------------

/// Requested output record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputShape {
    #[default]
    SubjectQueryRestriction,
    /// Any other type URI. Recognized on input, not materializable.
    Other(String),
}

impl OutputShape {
    pub fn parse(uri: &str) -> Self {
        if uri == SUBJECT_QUERY_RESTRICTION {
            OutputShape::SubjectQueryRestriction
        } else {
            OutputShape::Other(uri.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OutputShape::SubjectQueryRestriction => SUBJECT_QUERY_RESTRICTION,
            OutputShape::Other(uri) => uri,
        }
    }
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for OutputShape {
    fn from(s: String) -> Self {
        OutputShape::parse(&s)
    }
}

impl From<OutputShape> for String {
    fn from(shape: OutputShape) -> Self {
        shape.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// NestedDescriptorPolicy
// ---------------------------------------------------------------------------

/// Treatment of object (embedded) descriptors.
///
/// Must be the same for materialization and requirement scanning, otherwise
/// obfuscated nested values would be materialized without being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestedDescriptorPolicy {
    /// Fail with `UnsupportedDescriptorKind`.
    #[default]
    Reject,
    /// Resolve nested descriptors recursively.
    Resolve,
}

// ---------------------------------------------------------------------------
// MaterializedRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedRecord {
    #[serde(rename = "@id")]
    pub id: EntityId,
    #[serde(rename = "@type")]
    pub types: Vec<String>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl MaterializedRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

// ---------------------------------------------------------------------------
// Materializer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct Materializer {
    nested: NestedDescriptorPolicy,
}

impl Materializer {
    pub fn new(nested: NestedDescriptorPolicy) -> Self {
        Self { nested }
    }

    pub fn nested_policy(&self) -> NestedDescriptorPolicy {
        self.nested
    }

    /// Produce the `shape` record for `entity` from the nodes in `index`.
    ///
    /// Properties whose source node lacks the named property are omitted.
    pub fn materialize(
        &self,
        entity: &SyndicatedEntity,
        shape: &OutputShape,
        data_model_id: &DataModelId,
        index: &NodeIndex,
    ) -> EntityResult<MaterializedRecord> {
        if data_model_id.is_empty() {
            return Err(EntityError::InvalidArgument("data model id is missing".into()));
        }
        if *shape != OutputShape::SubjectQueryRestriction {
            return Err(EntityError::UnsupportedShape(shape.to_string()));
        }

        tracing::debug!(
            entity = %entity.id(),
            shape = %shape,
            data_model = %data_model_id,
            properties = entity.properties().len(),
            "materializing syndicated entity"
        );

        let mut properties = Map::new();
        self.resolve_into(entity.properties(), index, &mut properties)?;

        Ok(MaterializedRecord {
            id: entity.id().clone(),
            types: vec![shape.as_str().to_string()],
            properties,
        })
    }

    fn resolve_into(
        &self,
        descriptors: &PropertyMap,
        index: &NodeIndex,
        out: &mut Map<String, Value>,
    ) -> EntityResult<()> {
        for (key, descriptor) in descriptors.iter() {
            if is_keyword(key) {
                continue;
            }
            match descriptor {
                PropertyDescriptor::Scalar(scalar) => {
                    if let Some(v) = resolve_scalar(scalar, index)? {
                        out.insert(key.to_string(), v);
                    }
                }
                PropertyDescriptor::Object { properties } => match self.nested {
                    NestedDescriptorPolicy::Reject => {
                        return Err(EntityError::UnsupportedDescriptorKind(format!(
                            "object descriptor at '{}'",
                            key
                        )));
                    }
                    NestedDescriptorPolicy::Resolve => {
                        let mut nested = Map::new();
                        self.resolve_into(properties, index, &mut nested)?;
                        out.insert(key.to_string(), Value::Object(nested));
                    }
                },
            }
        }
        Ok(())
    }
}

fn resolve_scalar(scalar: &ScalarDescriptor, index: &NodeIndex) -> EntityResult<Option<Value>> {
    let node = index
        .get(scalar.source_node_id.as_str())
        .ok_or_else(|| EntityError::UnresolvedReference {
            node_id: scalar.source_node_id.to_string(),
            nodes: index.nodes().to_vec(),
        })?;
    let value = node.get(&scalar.source_property_name).cloned();
    if value.is_none() {
        tracing::debug!(
            node = %scalar.source_node_id,
            property = %scalar.source_property_name,
            "source node has no value for property"
        );
    }
    Ok(value)
}

/// Materialize with the default (rejecting) nested policy.
pub fn materialize(
    entity: &SyndicatedEntity,
    shape: &OutputShape,
    data_model_id: &DataModelId,
    index: &NodeIndex,
) -> EntityResult<MaterializedRecord> {
    Materializer::default().materialize(entity, shape, data_model_id, index)
}
