use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Graph node identifier key.
pub const ID_KEY: &str = "@id";
/// Graph node type key. On an obfuscated envelope it carries the action identifier.
pub const TYPE_KEY: &str = "@type";
/// Envelope payload key.
pub const VALUE_KEY: &str = "@value";

/// True for graph keywords (`@id`, `@type`, `@value`, ...). They are never
/// output property names.
pub fn is_keyword(name: &str) -> bool {
    name.starts_with('@')
}

// ---------------------------------------------------------------------------
// Typed identifiers
// ---------------------------------------------------------------------------

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

define_id!(EntityId, "Identifier of a syndicated entity, minted by the resolving party.");
define_id!(NodeId, "Globally unique identifier of a graph node (subject or embedded object).");
define_id!(RecordId, "Identifier of the signed record that asserted a value.");
define_id!(DataModelId, "Identifier of the schema an entity's output properties conform to.");
define_id!(JobId, "Identifier of the resolution job that produced an entity.");
define_id!(PipeId, "Identifier of a privacy pipe.");
define_id!(ActionId, "Identifier of the privacy action instance that reverses an obfuscation.");

// ---------------------------------------------------------------------------
// PropertyValue: a property is either plain or an obfuscated envelope
// ---------------------------------------------------------------------------

/// A subject property value, classified by shape.
///
/// On the wire an obfuscated value is `{ "@type": <action>, "@value": <ciphertext> }`.
/// Anything else is plain.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Plain(Value),
    Obfuscated {
        action_id: ActionId,
        ciphertext: String,
    },
}

impl PropertyValue {
    /// Classify a raw JSON value.
    pub fn classify(value: &Value) -> Self {
        match obfuscated_parts(value) {
            Some((action, ciphertext)) => PropertyValue::Obfuscated {
                action_id: ActionId::new(action),
                ciphertext: ciphertext.to_string(),
            },
            None => PropertyValue::Plain(value.clone()),
        }
    }

    pub fn is_obfuscated(&self) -> bool {
        matches!(self, PropertyValue::Obfuscated { .. })
    }

    pub fn action_id(&self) -> Option<&ActionId> {
        match self {
            PropertyValue::Obfuscated { action_id, .. } => Some(action_id),
            PropertyValue::Plain(_) => None,
        }
    }

    /// Back to the raw JSON form.
    pub fn to_value(&self) -> Value {
        match self {
            PropertyValue::Plain(v) => v.clone(),
            PropertyValue::Obfuscated {
                action_id,
                ciphertext,
            } => serde_json::json!({
                TYPE_KEY: action_id.as_str(),
                VALUE_KEY: ciphertext,
            }),
        }
    }
}

/// True if the raw value has the obfuscated envelope shape.
pub fn is_obfuscated_value(value: &Value) -> bool {
    obfuscated_parts(value).is_some()
}

// An envelope has exactly a string @type and a string @value. Typed literals
// carrying extra keys (e.g. @language) are not envelopes.
fn obfuscated_parts(value: &Value) -> Option<(&str, &str)> {
    let obj = value.as_object()?;
    if obj.len() != 2 || obj.contains_key(ID_KEY) {
        return None;
    }
    let action = obj.get(TYPE_KEY)?.as_str()?;
    let ciphertext = obj.get(VALUE_KEY)?.as_str()?;
    Some((action, ciphertext))
}

/// The `@id` of a graph node, if it has one.
pub fn node_id(node: &Value) -> Option<&str> {
    node.get(ID_KEY).and_then(Value::as_str)
}
