//! Deobfuscation requirement scanning.
//!
//! Walks each entity's provenance pointers against the decoded signed
//! subject records (not the flattened index) and reports which
//! (privacy pipe, privacy action) pairs must be invoked before the values
//! can be read in clear.

use crate::error::{ResolveError, ResolveResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use synd_core::{is_keyword, node_id, ActionId, PipeId, PropertyValue, SignedRecord};
use synd_entity::{NestedDescriptorPolicy, PropertyDescriptor, PropertyMap, ScalarDescriptor, SyndicatedEntity};

/// A privacy action that must run on a pipe before data can be read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeobfuscationRequirement {
    pub pipe_id: PipeId,
    pub action_id: ActionId,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner {
    nested: NestedDescriptorPolicy,
}

// Requirements in discovery order, deduplicated by action.
#[derive(Default)]
struct Found {
    requirements: Vec<DeobfuscationRequirement>,
    pipe_by_action: HashMap<ActionId, PipeId>,
}

impl Found {
    fn record(&mut self, pipe_id: &PipeId, action_id: ActionId) {
        match self.pipe_by_action.get(&action_id) {
            Some(first) if first != pipe_id => {
                tracing::warn!(
                    action = %action_id,
                    kept = %first,
                    ignored = %pipe_id,
                    "privacy action claimed by two pipes, keeping the first"
                );
            }
            Some(_) => {}
            None => {
                self.pipe_by_action.insert(action_id.clone(), pipe_id.clone());
                self.requirements.push(DeobfuscationRequirement {
                    pipe_id: pipe_id.clone(),
                    action_id,
                });
            }
        }
    }
}

impl Scanner {
    pub fn new(nested: NestedDescriptorPolicy) -> Self {
        Self { nested }
    }

    pub fn nested_policy(&self) -> NestedDescriptorPolicy {
        self.nested
    }

    /// Compute the unique requirements for `entities`.
    ///
    /// Only records of kind `subject` are consulted; other kinds are ignored.
    /// A descriptor naming a record that is not supplied is an error.
    pub fn scan(
        &self,
        entities: &[SyndicatedEntity],
        records: &[SignedRecord],
    ) -> ResolveResult<Vec<DeobfuscationRequirement>> {
        let lookup: HashMap<&str, &SignedRecord> = records
            .iter()
            .filter(|r| r.is_subject())
            .map(|r| (r.record_id.as_str(), r))
            .collect();

        let mut found = Found::default();
        for entity in entities {
            tracing::debug!(entity = %entity.id(), "scanning for obfuscated properties");
            self.scan_properties(entity.properties(), &lookup, true, &mut found)?;
        }

        tracing::debug!(
            entities = entities.len(),
            requirements = found.requirements.len(),
            "deobfuscation scan complete"
        );
        Ok(found.requirements)
    }

    fn scan_properties(
        &self,
        properties: &PropertyMap,
        lookup: &HashMap<&str, &SignedRecord>,
        top_level: bool,
        found: &mut Found,
    ) -> ResolveResult<()> {
        for (key, descriptor) in properties.iter() {
            if is_keyword(key) {
                continue;
            }
            match descriptor {
                PropertyDescriptor::Scalar(scalar) => {
                    scan_scalar(scalar, lookup, top_level, found)?;
                }
                PropertyDescriptor::Object { properties } => match self.nested {
                    NestedDescriptorPolicy::Reject => {
                        return Err(synd_entity::EntityError::UnsupportedDescriptorKind(format!(
                            "object descriptor at '{}' cannot be scanned",
                            key
                        ))
                        .into());
                    }
                    NestedDescriptorPolicy::Resolve => {
                        self.scan_properties(properties, lookup, false, found)?;
                    }
                },
            }
        }
        Ok(())
    }
}

fn scan_scalar(
    scalar: &ScalarDescriptor,
    lookup: &HashMap<&str, &SignedRecord>,
    top_level: bool,
    found: &mut Found,
) -> ResolveResult<()> {
    let record_id = scalar.source_record_id.as_str();
    let record = lookup
        .get(record_id)
        .ok_or_else(|| ResolveError::UnknownRecord(record_id.to_string()))?;
    let subject = record
        .subject
        .as_ref()
        .ok_or_else(|| ResolveError::MissingClaim {
            record: record_id.to_string(),
            claim: "pn_subject",
        })?;

    // Top-level properties live on the subject itself. Embedded properties
    // live on a nested node inside the subject payload, which may appear
    // several times (bare references included), so every occurrence is read.
    let holders: Vec<&Value> = if top_level {
        vec![subject]
    } else {
        let mut occurrences = Vec::new();
        collect_nodes(subject, scalar.source_node_id.as_str(), &mut occurrences);
        if occurrences.is_empty() {
            return Err(ResolveError::NodeNotInRecord {
                record: record_id.to_string(),
                node: scalar.source_node_id.to_string(),
            });
        }
        occurrences
    };

    for holder in holders {
        let Some(value) = holder.get(&scalar.source_property_name) else {
            continue;
        };
        if let PropertyValue::Obfuscated { action_id, .. } = PropertyValue::classify(value) {
            let pipe = record
                .privacy_pipe
                .as_ref()
                .ok_or_else(|| ResolveError::MissingClaim {
                    record: record_id.to_string(),
                    claim: "pn_pipe",
                })?;
            found.record(pipe, action_id);
        }
    }
    Ok(())
}

fn collect_nodes<'a>(value: &'a Value, id: &str, out: &mut Vec<&'a Value>) {
    if node_id(value) == Some(id) {
        out.push(value);
    }
    match value {
        Value::Object(obj) => obj.values().for_each(|v| collect_nodes(v, id, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_nodes(v, id, out)),
        _ => {}
    }
}

/// Scan with the default (rejecting) nested policy.
pub fn scan(
    entities: &[SyndicatedEntity],
    records: &[SignedRecord],
) -> ResolveResult<Vec<DeobfuscationRequirement>> {
    Scanner::default().scan(entities, records)
}
