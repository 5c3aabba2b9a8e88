//! Regions are seeded out-of-band and immutable once created.

use serde::{Deserialize, Serialize};

/// A competitive region. Unlike every other entity, its identifier is the
/// human-readable key (e.g. `norcal`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub display_name: String,
}

impl Region {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Region {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}
