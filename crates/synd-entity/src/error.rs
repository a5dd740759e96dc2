use serde_json::Value;
use thiserror::Error;

/// Errors raised while building, decoding or materializing a syndicated entity.
///
/// All of these indicate an inconsistent batch or a caller defect. None are
/// retried and none degrade into partial output.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("wire form is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("malformed wire form: {0}")]
    MalformedWireForm(String),

    /// A descriptor points at a node absent from the node index. Carries the
    /// complete flattened node list for diagnosis.
    #[error("unresolved reference: node '{node_id}' not found in {} flattened nodes", nodes.len())]
    UnresolvedReference { node_id: String, nodes: Vec<Value> },

    #[error("unsupported output shape: {0}")]
    UnsupportedShape(String),

    #[error("unsupported descriptor kind: {0}")]
    UnsupportedDescriptorKind(String),
}

impl From<EntityError> for synd_core::SyndError {
    fn from(e: EntityError) -> Self {
        synd_core::SyndError::Entity(e.to_string())
    }
}

pub type EntityResult<T> = Result<T, EntityError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unresolved_reference_display() {
        let err = EntityError::UnresolvedReference {
            node_id: "s9".into(),
            nodes: vec![json!({ "@id": "s1" }), json!({ "@id": "s2" })],
        };
        assert_eq!(
            err.to_string(),
            "unresolved reference: node 's9' not found in 2 flattened nodes"
        );
    }

    #[test]
    fn test_missing_field_display() {
        let err = EntityError::MissingField("dataModelId");
        assert_eq!(
            err.to_string(),
            "wire form is missing required field 'dataModelId'"
        );
    }

    #[test]
    fn test_into_synd_error() {
        let err: synd_core::SyndError = EntityError::UnsupportedShape("x".into()).into();
        assert!(matches!(err, synd_core::SyndError::Entity(_)));
    }
}
