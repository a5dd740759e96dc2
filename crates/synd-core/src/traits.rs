use crate::error::SyndResult;
use async_trait::async_trait;
use serde_json::Value;

// ---------------------------------------------------------------------------
// IdGenerator: injected identifier minting
//
// Source of local entity ids for `SyndicatedEntity::create_with`.
// ---------------------------------------------------------------------------

pub trait IdGenerator: Send + Sync {
    fn next(&self) -> String;
}

// ---------------------------------------------------------------------------
// GraphFlattener: the external graph normalization step
//
// Collapses a set of linked documents into a flat array of nodes keyed by
// `@id`. Nodes sharing an identifier are merged by the implementation.
// ---------------------------------------------------------------------------

#[async_trait]
pub trait GraphFlattener: Send + Sync {
    async fn flatten(&self, documents: &[Value]) -> SyndResult<Vec<Value>>;
}
