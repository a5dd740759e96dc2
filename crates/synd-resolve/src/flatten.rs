//! In-process graph flattener.
//!
//! Pulls every identified object out of the input documents into its own
//! node and leaves a `{ "@id" }` reference in its place. Nodes sharing an
//! identifier are merged property by property; for the same property the
//! later document wins, and `@type` values are unioned.
//!
//! This covers the subject shapes exchanged between syndication services.
//! It does no context processing, IRI expansion or blank-node labelling.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use synd_core::{node_id, GraphFlattener, SyndError, SyndResult, ID_KEY, TYPE_KEY};

const GRAPH_KEY: &str = "@graph";

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeFlattener;

#[async_trait]
impl GraphFlattener for NodeFlattener {
    async fn flatten(&self, documents: &[Value]) -> SyndResult<Vec<Value>> {
        flatten_documents(documents)
    }
}

#[derive(Default)]
struct Accumulator {
    order: Vec<String>,
    nodes: HashMap<String, Map<String, Value>>,
}

impl Accumulator {
    // Claims the output position of `id` before its children are visited.
    fn touch(&mut self, id: &str) {
        if !self.nodes.contains_key(id) {
            self.order.push(id.to_string());
            self.nodes.insert(id.to_string(), Map::new());
        }
    }

    fn merge(&mut self, id: &str, props: Map<String, Value>) {
        match self.nodes.get_mut(id) {
            Some(existing) => {
                for (k, v) in props {
                    if k == TYPE_KEY {
                        let merged = union_types(existing.get(TYPE_KEY), &v);
                        existing.insert(k, merged);
                    } else {
                        existing.insert(k, v);
                    }
                }
            }
            None => {
                self.order.push(id.to_string());
                self.nodes.insert(id.to_string(), props);
            }
        }
    }

    fn into_nodes(mut self) -> Vec<Value> {
        self.order
            .iter()
            .filter_map(|id| {
                self.nodes.remove(id).map(|props| {
                    let mut node = Map::with_capacity(props.len() + 1);
                    node.insert(ID_KEY.to_string(), Value::String(id.clone()));
                    node.extend(props);
                    Value::Object(node)
                })
            })
            .collect()
    }
}

/// Flatten `documents` into one node per distinct `@id`, in first-seen order.
pub fn flatten_documents(documents: &[Value]) -> SyndResult<Vec<Value>> {
    let mut acc = Accumulator::default();
    for doc in documents {
        collect_top(doc, &mut acc)?;
    }
    Ok(acc.into_nodes())
}

fn collect_top(doc: &Value, acc: &mut Accumulator) -> SyndResult<()> {
    match doc {
        Value::Array(items) => items.iter().try_for_each(|item| collect_top(item, acc)),
        Value::Object(obj) => {
            if let Some(Value::Array(graph)) = obj.get(GRAPH_KEY) {
                return graph.iter().try_for_each(|item| collect_top(item, acc));
            }
            if node_id(doc).is_none() {
                return Err(SyndError::Flatten(
                    "top-level document has no @id".to_string(),
                ));
            }
            extract_node(obj, acc).map(|_| ())
        }
        other => Err(SyndError::Flatten(format!(
            "expected a graph node, found {}",
            kind_of(other)
        ))),
    }
}

fn extract_node(obj: &Map<String, Value>, acc: &mut Accumulator) -> SyndResult<String> {
    let id = obj
        .get(ID_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| SyndError::Flatten("node @id must be a string".to_string()))?
        .to_string();

    acc.touch(&id);
    let mut props = Map::new();
    for (k, v) in obj {
        if k == ID_KEY {
            continue;
        }
        props.insert(k.clone(), embed(v, acc)?);
    }
    acc.merge(&id, props);
    Ok(id)
}

fn embed(value: &Value, acc: &mut Accumulator) -> SyndResult<Value> {
    match value {
        Value::Object(obj) if obj.contains_key(ID_KEY) && obj.len() > 1 => {
            let id = extract_node(obj, acc)?;
            Ok(reference(id))
        }
        Value::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            for (k, v) in obj {
                out.insert(k.clone(), embed(v, acc)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| embed(item, acc))
            .collect::<SyndResult<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn reference(id: String) -> Value {
    let mut m = Map::with_capacity(1);
    m.insert(ID_KEY.to_string(), Value::String(id));
    Value::Object(m)
}

fn union_types(existing: Option<&Value>, incoming: &Value) -> Value {
    let mut types: Vec<Value> = Vec::new();
    for v in existing.into_iter().chain(std::iter::once(incoming)) {
        let items = match v {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        for t in items {
            if !types.contains(&t) {
                types.push(t);
            }
        }
    }
    Value::Array(types)
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn by_id<'a>(nodes: &'a [Value], id: &str) -> &'a Value {
        nodes
            .iter()
            .find(|n| node_id(n) == Some(id))
            .unwrap_or_else(|| panic!("node {} not in output", id))
    }

    #[test]
    fn test_embedded_object_extracted() {
        let alice = json!({
            "@id": "s1",
            "@type": ["Subject"],
            "givenName": "Alice",
            "address": { "@id": "a1", "@type": "PostalAddress", "postalCode": "94105" }
        });
        let nodes = flatten_documents(&[alice]).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(by_id(&nodes, "s1")["address"], json!({ "@id": "a1" }));
        assert_eq!(by_id(&nodes, "a1")["postalCode"], "94105");
    }

    #[test]
    fn test_envelope_left_in_place() {
        let doc = json!({
            "@id": "s1",
            "taxID": { "@type": "action-7", "@value": "ciphertext" }
        });
        let nodes = flatten_documents(&[doc]).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0]["taxID"]["@value"], "ciphertext");
    }

    #[test]
    fn test_duplicate_ids_merged() {
        let a = json!({ "@id": "s1", "@type": "Subject", "givenName": "Alice", "email": "a@x.com" });
        let b = json!({ "@id": "s1", "@type": ["PrivacyGraph"], "givenName": "Alicia" });
        let nodes = flatten_documents(&[a, b]).unwrap();
        assert_eq!(nodes.len(), 1);
        let n = &nodes[0];
        assert_eq!(n["givenName"], "Alicia");
        assert_eq!(n["email"], "a@x.com");
        assert_eq!(n["@type"], json!(["Subject", "PrivacyGraph"]));
    }

    #[test]
    fn test_graph_container_and_arrays() {
        let doc = json!({
            "@graph": [
                { "@id": "s1", "knows": [{ "@id": "s2", "givenName": "Bob" }, { "@id": "s3" }] },
                { "@id": "s3", "givenName": "Carol" }
            ]
        });
        let nodes = flatten_documents(&[doc]).unwrap();
        let ids: Vec<&str> = nodes.iter().filter_map(node_id).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
        assert_eq!(
            by_id(&nodes, "s1")["knows"],
            json!([{ "@id": "s2" }, { "@id": "s3" }])
        );
    }

    #[test]
    fn test_top_level_without_id_rejected() {
        let err = flatten_documents(&[json!({ "givenName": "x" })]).unwrap_err();
        assert!(matches!(err, SyndError::Flatten(_)));
        let err = flatten_documents(&[json!("s1")]).unwrap_err();
        assert!(err.to_string().contains("string"));
    }

    #[tokio::test]
    async fn test_flattener_trait() {
        let f = NodeFlattener;
        let nodes = f.flatten(&[json!({ "@id": "s1", "a": 1 })]).await.unwrap();
        assert_eq!(nodes, vec![json!({ "@id": "s1", "a": 1 })]);
    }
}
