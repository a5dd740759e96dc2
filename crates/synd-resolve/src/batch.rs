//! Batch resolution.
//!
//! One flatten call per batch, one shared node index, one materialized
//! record per entity in input order. A batch either resolves completely or
//! fails as a whole.

use crate::error::{ResolveError, ResolveResult};
use serde_json::Value;
use std::sync::Arc;
use synd_core::{DataModelId, GraphFlattener};
use synd_entity::{
    MaterializedRecord, Materializer, NestedDescriptorPolicy, NodeIndex, OutputShape,
    SyndicatedEntity,
};

/// An entity handed to the resolver, either live or in wire form.
#[derive(Debug, Clone)]
pub enum EntityInput {
    Live(SyndicatedEntity),
    Wire(Value),
}

impl EntityInput {
    pub fn into_entity(self) -> ResolveResult<SyndicatedEntity> {
        match self {
            EntityInput::Live(e) => Ok(e),
            EntityInput::Wire(v) => Ok(SyndicatedEntity::from_json(&v)?),
        }
    }
}

impl From<SyndicatedEntity> for EntityInput {
    fn from(e: SyndicatedEntity) -> Self {
        EntityInput::Live(e)
    }
}

impl From<Value> for EntityInput {
    fn from(v: Value) -> Self {
        EntityInput::Wire(v)
    }
}

pub struct BatchResolver {
    flattener: Arc<dyn GraphFlattener>,
    materializer: Materializer,
}

impl BatchResolver {
    pub fn new(flattener: Arc<dyn GraphFlattener>) -> Self {
        Self {
            flattener,
            materializer: Materializer::default(),
        }
    }

    pub fn with_nested_policy(mut self, nested: NestedDescriptorPolicy) -> Self {
        self.materializer = Materializer::new(nested);
        self
    }

    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    /// Resolve `entities` against `backing_subjects`.
    ///
    /// `output[i]` is the record for `entities[i]`. Wire-form entities are
    /// decoded before the flatten call; any decode, flatten or
    /// materialization failure fails the whole batch.
    pub async fn resolve_batch(
        &self,
        shape: &OutputShape,
        data_model_id: &DataModelId,
        backing_subjects: &[Value],
        entities: Vec<EntityInput>,
    ) -> ResolveResult<Vec<MaterializedRecord>> {
        if data_model_id.is_empty() {
            return Err(ResolveError::InvalidArgument("data model id is missing".into()));
        }

        let entities = entities
            .into_iter()
            .map(EntityInput::into_entity)
            .collect::<ResolveResult<Vec<_>>>()?;

        tracing::debug!(
            subjects = backing_subjects.len(),
            entities = entities.len(),
            shape = %shape,
            "resolving syndicated entity batch"
        );

        let flattened = self
            .flattener
            .flatten(backing_subjects)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "flatten failed, batch abandoned");
                ResolveError::Flatten(e)
            })?;
        let index = NodeIndex::from_nodes(flattened);

        let records = entities
            .iter()
            .map(|entity| {
                self.materializer
                    .materialize(entity, shape, data_model_id, &index)
                    .map_err(ResolveError::from)
            })
            .collect::<ResolveResult<Vec<_>>>()?;

        tracing::debug!(records = records.len(), nodes = index.len(), "batch resolved");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::NodeFlattener;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use synd_core::{SyndError, SyndResult};
    use synd_entity::{EntityError, EntityProps};

    struct CountingFlattener {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GraphFlattener for CountingFlattener {
        async fn flatten(&self, documents: &[Value]) -> SyndResult<Vec<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(documents.to_vec())
        }
    }

    struct BrokenFlattener;

    #[async_trait]
    impl GraphFlattener for BrokenFlattener {
        async fn flatten(&self, _documents: &[Value]) -> SyndResult<Vec<Value>> {
            Err(SyndError::Flatten("loader refused remote context".into()))
        }
    }

    fn entity(local: &str, node: &str) -> SyndicatedEntity {
        let mut se =
            SyndicatedEntity::create(local, &EntityProps::new("fake.com", "dm_id", "jobId"))
                .unwrap();
        se.add_property("givenName", node, "givenName", "jwt1", None)
            .unwrap();
        se
    }

    fn dm() -> DataModelId {
        DataModelId::new("dm_id")
    }

    #[tokio::test]
    async fn test_single_flatten_call_per_batch() {
        let flattener = Arc::new(CountingFlattener {
            calls: AtomicUsize::new(0),
        });
        let resolver = BatchResolver::new(flattener.clone());
        let subjects = vec![
            json!({ "@id": "s1", "givenName": "Alice" }),
            json!({ "@id": "s2", "givenName": "Bob" }),
        ];
        let out = resolver
            .resolve_batch(
                &OutputShape::default(),
                &dm(),
                &subjects,
                vec![entity("e1", "s1").into(), entity("e2", "s2").into()],
            )
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(flattener.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flatten_failure_propagates() {
        let resolver = BatchResolver::new(Arc::new(BrokenFlattener));
        let err = resolver
            .resolve_batch(&OutputShape::default(), &dm(), &[], vec![entity("e1", "s1").into()])
            .await
            .unwrap_err();
        match err {
            ResolveError::Flatten(SyndError::Flatten(msg)) => {
                assert_eq!(msg, "loader refused remote context")
            }
            other => panic!("expected flatten error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_wire_entity_fails_before_flatten() {
        let flattener = Arc::new(CountingFlattener {
            calls: AtomicUsize::new(0),
        });
        let resolver = BatchResolver::new(flattener.clone());
        let err = resolver
            .resolve_batch(
                &OutputShape::default(),
                &dm(),
                &[],
                vec![json!({ "id": "x", "dataModelId": "dm" }).into()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Entity(EntityError::MissingField("job"))));
        assert_eq!(flattener.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_unresolved_entity_fails_batch() {
        let resolver = BatchResolver::new(Arc::new(NodeFlattener));
        let subjects = vec![json!({ "@id": "s1", "givenName": "Alice" })];
        let err = resolver
            .resolve_batch(
                &OutputShape::default(),
                &dm(),
                &subjects,
                vec![entity("e1", "s1").into(), entity("e2", "s-missing").into()],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Entity(EntityError::UnresolvedReference { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_data_model_id() {
        let resolver = BatchResolver::new(Arc::new(NodeFlattener));
        let err = resolver
            .resolve_batch(&OutputShape::default(), &DataModelId::new(""), &[], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_nested_policy_applies() {
        let resolver =
            BatchResolver::new(Arc::new(NodeFlattener)).with_nested_policy(NestedDescriptorPolicy::Resolve);
        assert_eq!(
            resolver.materializer().nested_policy(),
            NestedDescriptorPolicy::Resolve
        );

        let mut se = entity("e1", "s1");
        se.add_embedded_object_property("address", "postalCode", "a1", "zip", "jwt1", None)
            .unwrap();
        let subjects = vec![json!({
            "@id": "s1",
            "givenName": "Alice",
            "address": { "@id": "a1", "zip": "94105" }
        })];
        let out = resolver
            .resolve_batch(&OutputShape::default(), &dm(), &subjects, vec![se.into()])
            .await
            .unwrap();
        assert_eq!(out[0].get("address"), Some(&json!({ "postalCode": "94105" })));
    }
}
