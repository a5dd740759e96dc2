use serde_json::Value;
use std::collections::HashMap;
use synd_core::node_id;

/// Flattened graph nodes keyed by `@id`.
///
/// Merge policy: when two nodes share an identifier the one later in the
/// input wins. The full input list is retained for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    nodes: Vec<Value>,
    by_id: HashMap<String, usize>,
}

impl NodeIndex {
    pub fn from_nodes(nodes: Vec<Value>) -> Self {
        let mut by_id = HashMap::with_capacity(nodes.len());
        for (pos, node) in nodes.iter().enumerate() {
            match node_id(node) {
                Some(id) => {
                    if let Some(prev) = by_id.insert(id.to_string(), pos) {
                        tracing::debug!(node = id, replaced = prev, by = pos, "duplicate node id, later node wins");
                    }
                }
                None => {
                    tracing::warn!(position = pos, "flattened node without @id ignored");
                }
            }
        }
        Self { nodes, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.by_id.get(id).map(|&pos| &self.nodes[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Every node as supplied, duplicates included.
    pub fn nodes(&self) -> &[Value] {
        &self.nodes
    }
}
