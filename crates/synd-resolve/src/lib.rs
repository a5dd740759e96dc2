//! Syndicated entity resolution
//!
//! [`BatchResolver`] flattens a batch of backing subjects once and
//! materializes every entity against the shared node index.
//! [`Scanner`] inspects the signed subject records an entity was built from
//! and reports the privacy actions needed to read its values in clear.

pub mod batch;
pub mod error;
pub mod flatten;
pub mod scan;

pub use batch::{BatchResolver, EntityInput};
pub use error::{ResolveError, ResolveResult};
pub use flatten::{flatten_documents, NodeFlattener};
pub use scan::{scan, DeobfuscationRequirement, Scanner};
