//! Line item identifiers.
//!
//! A medicine id is assigned once, when the row is created, and doubles as the
//! primary key of the persisted record.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

pub trait IdentifierGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random 128-bit identifiers in canonical hyphenated form.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdentifierGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Predictable identifiers (`<prefix>-1`, `<prefix>-2`, ...) for fixtures and replays.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdentifierGenerator for SequentialIds {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}
