use crate::traits::IdGenerator;
use std::sync::atomic::{AtomicU64, Ordering};

/// Namespace under which syndicated entity ids are minted.
pub const SYNDICATED_ENTITY_ID_BASE: &str = "https://pn.id.webshield.io/syndicated_entity";

/// True if `hostname` has at least one non-empty label and no whitespace.
pub fn is_valid_hostname(hostname: &str) -> bool {
    !hostname.chars().any(char::is_whitespace)
        && hostname.split('.').any(|label| !label.is_empty())
}

/// Mint a syndicated entity id for `local_id` issued by `hostname`.
///
/// Hostname labels are reversed into path segments:
/// `("fake.com", "id1")` becomes `.../syndicated_entity/com/fake#id1`.
pub fn syndicated_entity_id(hostname: &str, local_id: &str) -> String {
    let path: Vec<&str> = hostname
        .split('.')
        .filter(|label| !label.is_empty())
        .rev()
        .collect();
    format!("{}/{}#{}", SYNDICATED_ENTITY_ID_BASE, path.join("/"), local_id)
}

/// Process-local counter combined with the UTC second it was drawn in.
///
/// Ids look like `<unix-seconds>-<counter>` and are unique for the lifetime
/// of the generator.
pub struct CounterIdGenerator {
    counter: AtomicU64,
}

impl CounterIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }
}

impl Default for CounterIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for CounterIdGenerator {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", chrono::Utc::now().timestamp(), n)
    }
}
