//! Plain-data wire form of a syndicated entity.
//!
//! Entities cross process boundaries as plain JSON objects with the keys
//! `id`, `dataModelId`, `job`, `properties` and `subjects`. Reconstruction
//! requires every key to be present.

use crate::descriptor::PropertyMap;
use crate::entity::SyndicatedEntity;
use crate::error::{EntityError, EntityResult};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use synd_core::{DataModelId, EntityId, JobId, NodeId};

const REQUIRED_FIELDS: [&str; 5] = ["id", "dataModelId", "job", "properties", "subjects"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyndicatedEntityWire {
    pub id: EntityId,
    #[serde(rename = "dataModelId")]
    pub data_model_id: DataModelId,
    pub job: JobId,
    pub properties: PropertyMap,
    pub subjects: Vec<NodeId>,
}

impl SyndicatedEntity {
    pub fn to_wire(&self) -> SyndicatedEntityWire {
        SyndicatedEntityWire {
            id: self.id().clone(),
            data_model_id: self.data_model_id().clone(),
            job: self.job_id().clone(),
            properties: self.properties().clone(),
            subjects: self.backing_subject_ids().to_vec(),
        }
    }

    /// Serialize to the plain JSON wire form.
    pub fn to_json(&self) -> EntityResult<Value> {
        serde_json::to_value(self.to_wire())
            .map_err(|e| EntityError::MalformedWireForm(e.to_string()))
    }

    /// Rebuild from a typed wire form.
    pub fn from_wire(wire: SyndicatedEntityWire) -> EntityResult<Self> {
        if wire.id.is_empty() {
            return Err(EntityError::MissingField("id"));
        }
        if wire.data_model_id.is_empty() {
            return Err(EntityError::MissingField("dataModelId"));
        }
        if wire.job.is_empty() {
            return Err(EntityError::MissingField("job"));
        }

        let mut subjects: Vec<NodeId> = Vec::with_capacity(wire.subjects.len());
        for s in wire.subjects {
            if !subjects.contains(&s) {
                subjects.push(s);
            }
        }

        Ok(SyndicatedEntity::from_parts(
            wire.id,
            wire.data_model_id,
            wire.job,
            wire.properties,
            subjects,
        ))
    }

    /// Rebuild from the plain JSON wire form.
    ///
    /// Fails with `MissingField` naming the first absent (or null/empty) key,
    /// and with `MalformedWireForm` if the keys are present but ill-typed.
    pub fn from_json(value: &Value) -> EntityResult<Self> {
        let obj = value.as_object().ok_or_else(|| {
            EntityError::MalformedWireForm("syndicated entity must be a JSON object".into())
        })?;

        for field in REQUIRED_FIELDS {
            match obj.get(field) {
                None | Some(Value::Null) => return Err(EntityError::MissingField(field)),
                Some(Value::String(s)) if s.is_empty() => {
                    return Err(EntityError::MissingField(field))
                }
                Some(_) => {}
            }
        }

        let wire: SyndicatedEntityWire = serde_json::from_value(value.clone())
            .map_err(|e| EntityError::MalformedWireForm(e.to_string()))?;
        Self::from_wire(wire)
    }
}

impl Serialize for SyndicatedEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityProps;
    use serde_json::json;

    fn sample() -> SyndicatedEntity {
        let mut se =
            SyndicatedEntity::create("id1", &EntityProps::new("fake.com", "dm_id", "jobId"))
                .unwrap();
        se.add_property("https://schema.org/givenName", "alice_abc", "givenName", "jwt1", None)
            .unwrap();
        se.add_property("https://schema.org/familyName", "alice_abc", "familyName", "jwt2", None)
            .unwrap();
        se.add_embedded_object_property("https://schema.org/address", "postalCode", "addr-1", "zip", "jwt2", None)
            .unwrap();
        se
    }

    #[test]
    fn test_wire_keys() {
        let v = sample().to_json().unwrap();
        for k in REQUIRED_FIELDS {
            assert!(v.get(k).is_some(), "missing {}", k);
        }
        assert_eq!(v["subjects"], json!(["alice_abc"]));
        assert_eq!(v["job"], "jobId");
    }

    #[test]
    fn test_roundtrip() {
        let se = sample();
        let back = SyndicatedEntity::from_json(&se.to_json().unwrap()).unwrap();
        assert_eq!(back, se);
        assert_eq!(
            back.properties().keys().collect::<Vec<_>>(),
            se.properties().keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_missing_each_field() {
        for field in REQUIRED_FIELDS {
            let mut v = sample().to_json().unwrap();
            v.as_object_mut().unwrap().remove(field);
            match SyndicatedEntity::from_json(&v) {
                Err(EntityError::MissingField(f)) => assert_eq!(f, field),
                other => panic!("expected MissingField({}), got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_null_field_is_missing() {
        let mut v = sample().to_json().unwrap();
        v["job"] = Value::Null;
        assert!(matches!(
            SyndicatedEntity::from_json(&v),
            Err(EntityError::MissingField("job"))
        ));
    }

    #[test]
    fn test_malformed_descriptor() {
        let mut v = sample().to_json().unwrap();
        v["properties"] = json!({ "x": { "kind": "edge" } });
        assert!(matches!(
            SyndicatedEntity::from_json(&v),
            Err(EntityError::MalformedWireForm(_))
        ));
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            SyndicatedEntity::from_json(&json!(["id"])),
            Err(EntityError::MalformedWireForm(_))
        ));
    }

    #[test]
    fn test_duplicate_subjects_collapsed() {
        let v = json!({
            "id": "se-1",
            "dataModelId": "dm",
            "job": "j",
            "properties": {},
            "subjects": ["s1", "s2", "s1"]
        });
        let se = SyndicatedEntity::from_json(&v).unwrap();
        assert_eq!(se.backing_subject_ids(), &[NodeId::new("s1"), NodeId::new("s2")]);
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let se = sample();
        assert_eq!(serde_json::to_value(&se).unwrap(), se.to_json().unwrap());
    }
}
