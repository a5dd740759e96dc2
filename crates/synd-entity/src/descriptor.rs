//! Property descriptors: per-property provenance pointers.
//!
//! A scalar descriptor names the node, the node property and the signed
//! record a value came from. An object descriptor groups nested descriptors
//! under one output key (e.g. an address assembled from an embedded node).

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use synd_core::{is_keyword, NodeId, RecordId};

/// Value type recorded when the caller does not supply one.
pub const DEFAULT_VALUE_TYPE: &str = "string";

fn default_value_type() -> String {
    DEFAULT_VALUE_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarDescriptor {
    pub source_node_id: NodeId,
    pub source_property_name: String,
    pub source_record_id: RecordId,
    #[serde(default = "default_value_type")]
    pub value_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PropertyDescriptor {
    Scalar(ScalarDescriptor),
    Object { properties: PropertyMap },
}

impl PropertyDescriptor {
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyDescriptor::Scalar(_) => "scalar",
            PropertyDescriptor::Object { .. } => "object",
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarDescriptor> {
        match self {
            PropertyDescriptor::Scalar(s) => Some(s),
            PropertyDescriptor::Object { .. } => None,
        }
    }
}

/// Optional per-property settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyOptions {
    pub value_type: Option<String>,
}

impl PropertyOptions {
    pub fn with_value_type(value_type: impl Into<String>) -> Self {
        Self {
            value_type: Some(value_type.into()),
        }
    }

    pub(crate) fn resolved_value_type(&self) -> String {
        self.value_type.clone().unwrap_or_else(default_value_type)
    }
}

// ---------------------------------------------------------------------------
// PropertyMap: insertion-ordered name → descriptor map
// ---------------------------------------------------------------------------

/// Insertion-ordered map of output property names to descriptors.
///
/// Overwriting a name keeps its original position. The expected size is a
/// handful of entries, so lookups are linear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    entries: Vec<(String, PropertyDescriptor)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, d)| d)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyDescriptor> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, d)| d)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or overwrite. Returns the previous descriptor, if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        descriptor: PropertyDescriptor,
    ) -> Option<PropertyDescriptor> {
        let name = name.into();
        match self.get_mut(&name) {
            Some(slot) => Some(std::mem::replace(slot, descriptor)),
            None => {
                self.entries.push((name, descriptor));
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, d) in &self.entries {
            map.serialize_entry(k, d)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertyMapVisitor;

        impl<'de> Visitor<'de> for PropertyMapVisitor {
            type Value = PropertyMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property names to descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PropertyMap, A::Error> {
                let mut map = PropertyMap::new();
                while let Some(key) = access.next_key::<String>()? {
                    // Graph tooling may inject @id (or other keywords) into a
                    // flattened property bag.
                    if is_keyword(&key) {
                        access.next_value::<IgnoredAny>()?;
                        continue;
                    }
                    let descriptor = access.next_value::<PropertyDescriptor>()?;
                    map.insert(key, descriptor);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(PropertyMapVisitor)
    }
}
