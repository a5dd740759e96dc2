//! Syndicated entities
//!
//! A syndicated entity is a virtual identity record assembled from properties
//! of several independently signed subjects. This crate holds the
//! provenance model (which node, which property, which signed record each
//! output property comes from), its plain-data wire form, and the
//! materializer that resolves the provenance pointers against a flattened
//! node index.

pub mod descriptor;
pub mod entity;
pub mod error;
pub mod index;
pub mod materialize;
pub mod wire;

pub use descriptor::{
    PropertyDescriptor, PropertyMap, PropertyOptions, ScalarDescriptor, DEFAULT_VALUE_TYPE,
};
pub use entity::{EntityProps, SyndicatedEntity};
pub use error::{EntityError, EntityResult};
pub use index::NodeIndex;
pub use materialize::{
    materialize, MaterializedRecord, Materializer, NestedDescriptorPolicy, OutputShape,
    SUBJECT_QUERY_RESTRICTION,
};
pub use wire::SyndicatedEntityWire;
